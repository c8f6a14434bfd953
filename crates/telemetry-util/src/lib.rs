//! Tracing subscriber setup shared by the CLI binary.
//!
//! Mirrors the rest of the workspace: a single `init()` call wires up
//! `tracing_subscriber::fmt` with an `EnvFilter` read from `RUST_LOG`,
//! defaulting to `info`, with an optional JSON-lines mode for piping into
//! log aggregation instead of a human terminal.

use tracing_subscriber::EnvFilter;

/// Output shape for the installed subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(eyre::eyre!("unknown log format `{other}`, expected `human` or `json`")),
        }
    }
}

/// Installs the process-wide tracing subscriber. Call once, as early as
/// possible in `main`.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Human => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_env_filter(filter).json().init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
