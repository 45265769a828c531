//! Logging setup.
//!
//! Diagnostics go to stderr (or a log file) through `tracing-subscriber`, so
//! stdout stays clean for command output and `--json`. `TDK_LOG` takes a full
//! `EnvFilter` directive and overrides the verbosity flags.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "TDK_LOG";

fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "ticketdeck=warn,tdk=warn",
        1 => "ticketdeck=info,tdk=info,warn",
        2 => "ticketdeck=debug,tdk=debug,info",
        _ => "trace",
    }
}

/// Initialise the global subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a subscriber is
/// already installed.
pub fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let registry = tracing_subscriber::registry().with(filter);

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
            .try_init()
            .context("installing tracing subscriber")?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(verbose > 1)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("installing tracing subscriber")?;
    }

    Ok(())
}

/// Install a test-friendly subscriber. Safe to call from every test.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(default_directive(0, true), "error");
        assert!(default_directive(0, false).contains("warn"));
        assert!(default_directive(2, false).contains("debug"));
        assert_eq!(default_directive(5, false), "trace");
    }

    #[test]
    fn test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::debug!("still alive");
    }
}
