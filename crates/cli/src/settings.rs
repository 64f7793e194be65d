//! Settings loading: optional TOML file layered under `SPAWNWATCH_*` environment variables.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};

use spawnwatch_core::application::constants::ENV_PREFIX;
use spawnwatch_core::application::Settings;

/// Load and validate settings
///
/// Precedence: environment (`SPAWNWATCH_POLL_INTERVAL_MS=50`, `SPAWNWATCH_HELPERS=zenity,kdialog`)
/// over the file at `path` over built-in defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let settings: Settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("helpers"),
        )
        .build()
        .context("Failed to load settings")?
        .try_deserialize()
        .context("Invalid settings")?;

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spawnwatch_core::application::ScanPolicy;
    use spawnwatch_core::domain::HelperId;

    fn write_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "spawnwatch-{}-{}.toml",
            name,
            std::process::id()
        ));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = write_config(
            "override",
            r#"
poll_interval_ms = 5
verbose = true
scan_policy = "first_match"
helpers = ["kdialog", "zenity"]
"#,
        );

        let settings = load_settings(Some(&path)).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(settings.poll_interval_ms, 5);
        assert_eq!(settings.ready_timeout_ms, 100);
        assert!(settings.verbose);
        assert_eq!(settings.scan_policy, ScanPolicy::FirstMatch);
        assert_eq!(
            settings.helpers,
            vec![HelperId::new("kdialog"), HelperId::new("zenity")]
        );
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let path = write_config("invalid", "poll_interval_ms = 0\n");
        let result = load_settings(Some(&path));
        let _ = std::fs::remove_file(&path);

        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("spawnwatch-does-not-exist.toml");
        assert!(load_settings(Some(&path)).is_err());
    }
}
