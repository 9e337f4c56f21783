//! Logging setup
//!
//! Installs the global `tracing` subscriber from [`LoggingConfig`].
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when `RUST_LOG` is unset
fn default_directives(config: &LoggingConfig) -> String {
    format!("moodgarden={},tower_http=debug", config.level)
}

/// Build the env filter for a crate default level
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(config)))
}

/// Initialize logging
///
/// `format = "json"` emits one JSON object per event, anything else uses the
/// human-readable formatter. When `file` is set, output goes to that file
/// instead of stderr.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    let filter = build_filter(config);
    let json = config.format.eq_ignore_ascii_case("json");

    match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let writer = Mutex::new(file);

            if json {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_ansi(false)
                            .with_writer(writer),
                    )
                    .init();
            }
        }
        None => {
            if json {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                    .init();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(
            default_directives(&config),
            "moodgarden=debug,tower_http=debug"
        );
    }
}
