// Subprocess unit: shell command whose stdout is drained with bounded waits
// reason: nix for O_NONBLOCK + poll(2) on the stdout pipe (unix);
//         other platforms drain the pipe on a reader thread instead
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use spawnwatch_core::domain::{CommandLine, SENTINEL_STATUS};
use spawnwatch_core::port::{PollOutcome, Pollable, SpawnError};

use stream::OutputStream;

/// Pause between exit checks once the output stream has closed
const EXIT_CHECK_INTERVAL: Duration = Duration::from_millis(2);

/// Result of one bounded read from the output stream
enum StreamRead {
    Data(Vec<u8>),
    Pending,
    Closed,
}

/// A shell command with a captured stdout pipe
///
/// stdin is closed and stderr is inherited. Dropping a unit whose process is still running
/// does not kill it; the process is reaped in the background once it exits.
pub struct SubprocessUnit {
    command: String,
    child: Option<Child>,
    stream: Option<OutputStream>,
}

impl SubprocessUnit {
    /// Spawn `line` through the platform shell
    ///
    /// # Errors
    /// - SpawnError::EmptyCommand for a blank line
    /// - SpawnError::Spawn if the shell cannot be started
    /// - SpawnError::Pipe if the stdout pipe cannot be prepared
    pub fn spawn(line: &CommandLine) -> Result<Self, SpawnError> {
        if line.is_blank() {
            return Err(SpawnError::EmptyCommand);
        }

        let mut child = shell(line.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SpawnError::Spawn {
                command: line.to_string(),
                source,
            })?;

        let stream = child
            .stdout
            .take()
            .ok_or_else(|| SpawnError::Pipe("stdout was not captured".to_string()))
            .and_then(OutputStream::new);
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                abandon(child);
                return Err(e);
            }
        };

        debug!(command = %line, pid = child.id(), "Subprocess spawned");

        Ok(Self {
            command: line.to_string(),
            child: Some(child),
            stream: Some(stream),
        })
    }

    /// Wait up to `timeout` for the process to exit after its output closed
    fn collect_exit(&mut self, timeout: Duration) -> PollOutcome {
        // None: the bound lies beyond what Instant can represent, so wait unbounded
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let checked = match self.child.as_mut() {
                Some(child) => child.try_wait(),
                None => return finished(SENTINEL_STATUS),
            };

            match checked {
                Ok(Some(status)) => {
                    self.child = None;
                    let code = exit_code(status);
                    debug!(command = %self.command, status = code, "Subprocess exited");
                    return finished(code);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(command = %self.command, error = %e, "Failed to collect exit status");
                    self.child = None;
                    return finished(SENTINEL_STATUS);
                }
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return PollOutcome::Pending;
                    }
                    EXIT_CHECK_INTERVAL.min(deadline - now)
                }
                None => EXIT_CHECK_INTERVAL,
            };
            thread::sleep(pause);
        }
    }
}

impl Pollable for SubprocessUnit {
    fn poll(&mut self, timeout: Duration) -> PollOutcome {
        let started = Instant::now();
        let read = match self.stream.as_mut() {
            Some(stream) => stream.read_chunk(timeout),
            None => StreamRead::Closed,
        };

        match read {
            StreamRead::Data(chunk) => PollOutcome::Output(chunk),
            StreamRead::Pending => PollOutcome::Pending,
            StreamRead::Closed => {
                self.stream = None;
                self.collect_exit(timeout.saturating_sub(started.elapsed()))
            }
        }
    }

    fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }
}

impl Drop for SubprocessUnit {
    fn drop(&mut self) {
        self.stream = None;
        if let Some(child) = self.child.take() {
            abandon(child);
        }
    }
}

fn finished(status: i32) -> PollOutcome {
    PollOutcome::Finished {
        status,
        output: Vec::new(),
    }
}

/// Leave a process to its own lifecycle, reaping it in the background
fn abandon(mut child: Child) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }

    let pid = child.id();
    let reaper = thread::Builder::new()
        .name("spawnwatch-reaper".to_string())
        .spawn(move || {
            let _ = child.wait();
        });
    if let Err(e) = reaper {
        warn!(pid, error = %e, "Failed to start reaper thread");
    }
}

#[cfg(unix)]
fn shell(line: &str) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(not(unix))]
fn shell(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

/// Exit code, or 128 + signal number for signal-terminated processes (shell convention)
#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(SENTINEL_STATUS)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SENTINEL_STATUS)
}

#[cfg(unix)]
mod stream {
    use std::io::{ErrorKind, Read};
    use std::os::fd::{AsFd, AsRawFd};
    use std::process::ChildStdout;
    use std::time::Duration;

    use nix::errno::Errno;
    use nix::fcntl::{fcntl, FcntlArg, OFlag};
    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
    use tracing::warn;

    use spawnwatch_core::application::constants::READ_CHUNK_SIZE;
    use spawnwatch_core::port::SpawnError;

    use super::StreamRead;

    /// Non-blocking stdout pipe, waited on with poll(2)
    pub(super) struct OutputStream {
        pipe: ChildStdout,
    }

    impl OutputStream {
        pub(super) fn new(pipe: ChildStdout) -> Result<Self, SpawnError> {
            let fd = pipe.as_raw_fd();
            let flags = fcntl(fd, FcntlArg::F_GETFL)
                .map_err(|e| SpawnError::Pipe(format!("F_GETFL failed: {e}")))?;
            let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
            fcntl(fd, FcntlArg::F_SETFL(flags))
                .map_err(|e| SpawnError::Pipe(format!("F_SETFL failed: {e}")))?;

            Ok(Self { pipe })
        }

        pub(super) fn read_chunk(&mut self, timeout: Duration) -> StreamRead {
            if !self.wait_readable(timeout) {
                return StreamRead::Pending;
            }

            let mut buf = vec![0u8; READ_CHUNK_SIZE];
            match self.pipe.read(&mut buf) {
                Ok(0) => StreamRead::Closed,
                Ok(n) => {
                    buf.truncate(n);
                    StreamRead::Data(buf)
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                    StreamRead::Pending
                }
                Err(e) => {
                    warn!(error = %e, "Output pipe read failed, treating as end of output");
                    StreamRead::Closed
                }
            }
        }

        fn wait_readable(&self, timeout: Duration) -> bool {
            // Rounds down, so the wait never exceeds the bound
            let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
            let mut fds = [PollFd::new(self.pipe.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, PollTimeout::from(millis)) {
                Ok(ready) => ready > 0,
                Err(Errno::EINTR) => false,
                // Let the read surface whatever is wrong with the descriptor
                Err(_) => true,
            }
        }
    }
}

#[cfg(not(unix))]
mod stream {
    use std::io::{ErrorKind, Read};
    use std::process::ChildStdout;
    use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
    use std::thread;
    use std::time::Duration;

    use spawnwatch_core::application::constants::READ_CHUNK_SIZE;
    use spawnwatch_core::port::SpawnError;

    use super::StreamRead;

    /// stdout pipe drained by a reader thread; chunks arrive over a channel
    pub(super) struct OutputStream {
        rx: Receiver<Vec<u8>>,
    }

    impl OutputStream {
        pub(super) fn new(mut pipe: ChildStdout) -> Result<Self, SpawnError> {
            let (tx, rx) = mpsc::channel();

            thread::Builder::new()
                .name("spawnwatch-pipe-reader".to_string())
                .spawn(move || {
                    let mut buf = vec![0u8; READ_CHUNK_SIZE];
                    loop {
                        match pipe.read(&mut buf) {
                            Ok(0) => break,
                            Ok(n) => {
                                if tx.send(buf[..n].to_vec()).is_err() {
                                    break;
                                }
                            }
                            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                            Err(_) => break,
                        }
                    }
                })
                .map_err(|e| SpawnError::Pipe(format!("reader thread: {e}")))?;

            Ok(Self { rx })
        }

        pub(super) fn read_chunk(&mut self, timeout: Duration) -> StreamRead {
            match self.rx.recv_timeout(timeout) {
                Ok(chunk) => StreamRead::Data(chunk),
                Err(RecvTimeoutError::Timeout) => StreamRead::Pending,
                Err(RecvTimeoutError::Disconnected) => StreamRead::Closed,
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use spawnwatch_core::application::constants::READ_CHUNK_SIZE;

    /// Poll until finished, collecting every chunk
    fn drain(unit: &mut SubprocessUnit) -> (Vec<u8>, i32, usize) {
        let mut output = Vec::new();
        let mut polls = 0;
        loop {
            polls += 1;
            match unit.poll(Duration::from_millis(50)) {
                PollOutcome::Pending => {}
                PollOutcome::Output(chunk) => output.extend(chunk),
                PollOutcome::Finished { status, output: tail } => {
                    output.extend(tail);
                    return (output, status, polls);
                }
            }
        }
    }

    #[test]
    fn test_captures_stdout_and_status() {
        let mut unit = SubprocessUnit::spawn(&CommandLine::raw("printf hello; exit 3")).unwrap();
        let (output, status, _) = drain(&mut unit);

        assert_eq!(output, b"hello");
        assert_eq!(status, 3);
        assert_eq!(unit.pid(), None);
    }

    #[test]
    fn test_output_larger_than_one_chunk() {
        let bytes = READ_CHUNK_SIZE * 4 + 123;
        let line = CommandLine::raw(format!("head -c {bytes} /dev/zero | tr '\\0' 'x'"));
        let mut unit = SubprocessUnit::spawn(&line).unwrap();
        let (output, status, polls) = drain(&mut unit);

        assert_eq!(status, 0);
        assert_eq!(output.len(), bytes);
        assert!(output.iter().all(|b| *b == b'x'));
        assert!(polls >= 2);
    }

    #[test]
    fn test_poll_is_bounded() {
        let mut unit = SubprocessUnit::spawn(&CommandLine::raw("sleep 2")).unwrap();

        let started = Instant::now();
        assert_eq!(unit.poll(Duration::from_millis(30)), PollOutcome::Pending);
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[test]
    fn test_signal_exit_maps_to_shell_convention() {
        let mut unit = SubprocessUnit::spawn(&CommandLine::raw("kill -9 $$")).unwrap();
        let (_, status, _) = drain(&mut unit);
        assert_eq!(status, 128 + 9);
    }

    #[test]
    fn test_missing_program_reports_shell_status() {
        let mut unit =
            SubprocessUnit::spawn(&CommandLine::raw("definitely-not-a-real-helper-xyz 2>/dev/null"))
                .unwrap();
        let (output, status, _) = drain(&mut unit);
        assert!(output.is_empty());
        assert_eq!(status, 127);
    }

    #[test]
    fn test_unrepresentable_timeout_does_not_overflow() {
        let mut unit = SubprocessUnit::spawn(&CommandLine::raw("printf hi")).unwrap();
        let mut output = Vec::new();
        let status = loop {
            match unit.poll(Duration::MAX) {
                PollOutcome::Pending => {}
                PollOutcome::Output(chunk) => output.extend(chunk),
                PollOutcome::Finished { status, .. } => break status,
            }
        };

        assert_eq!(output, b"hi");
        assert_eq!(status, 0);
    }

    #[test]
    fn test_drop_does_not_wait_for_process() {
        let unit = SubprocessUnit::spawn(&CommandLine::raw("sleep 3")).unwrap();
        let started = Instant::now();
        drop(unit);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_blank_line_rejected() {
        assert!(matches!(
            SubprocessUnit::spawn(&CommandLine::raw("")),
            Err(SpawnError::EmptyCommand)
        ));
    }
}
