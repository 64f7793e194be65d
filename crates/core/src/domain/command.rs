// Command line construction and quoting

use std::fmt;

/// A shell command line handed to the platform shell (`sh -c` / `cmd /C`)
///
/// Built either verbatim with [`CommandLine::raw`] or from a program name plus
/// arguments, in which case every argument is single-quoted for POSIX shells.
///
/// # Example
/// ```text
/// let cmd = CommandLine::program("zenity")
///     .arg("--title")
///     .arg("it's done")
///     .redirect("2>/dev/null");
/// assert_eq!(cmd.as_str(), "zenity '--title' 'it'\\''s done' 2>/dev/null");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandLine(String);

impl CommandLine {
    /// Use `line` as-is
    pub fn raw(line: impl Into<String>) -> Self {
        Self(line.into())
    }

    /// Start a command line with an unquoted program name
    pub fn program(program: &str) -> Self {
        Self(program.to_string())
    }

    /// Append one shell-quoted argument
    pub fn arg(mut self, arg: &str) -> Self {
        self.0.push(' ');
        self.0.push_str(&shell_quote(arg));
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().fold(self, |cmd, a| cmd.arg(a.as_ref()))
    }

    /// Append an unquoted shell fragment (redirections, pipes)
    pub fn redirect(mut self, fragment: &str) -> Self {
        self.0.push(' ');
        self.0.push_str(fragment);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommandLine {
    fn from(line: &str) -> Self {
        Self::raw(line)
    }
}

impl From<String> for CommandLine {
    fn from(line: String) -> Self {
        Self::raw(line)
    }
}

/// Quote for POSIX shells: wrap in `'` and turn every `'` into `'\''`
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Quote for PowerShell: wrap in `'` and double every `'` or `"`
pub fn powershell_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '"' {
            out.push(c);
        }
        out.push(c);
    }
    out.push('\'');
    out
}
