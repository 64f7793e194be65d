//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! - `RUST_LOG` selects levels (default `spawnwatch=info`)
//! - `SPAWNWATCH_LOG_FORMAT=json` switches to JSON lines, anything else is pretty output
//!
//! Logs go to stderr so stdout carries only task output.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "spawnwatch=info,spawnwatch_core=info,spawnwatch_infra_system=info";

/// Output format of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("SPAWNWATCH_LOG_FORMAT") {
            Ok(value) => Self::parse(&value),
            Err(_) => LogFormat::Pretty,
        }
    }

    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// `verbose` raises the default filter to debug when `RUST_LOG` is unset.
pub fn init_logging(verbose: bool) -> Result<()> {
    let fallback = if verbose {
        DEFAULT_FILTER.replace("=info", "=debug")
    } else {
        DEFAULT_FILTER.to_string()
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .context("Failed to create env filter")?;

    match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("whatever"), LogFormat::Pretty);
    }
}
