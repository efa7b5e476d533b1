//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr through `tracing-subscriber` so command output on
//! stdout stays clean for piping. `RUST_LOG` overrides `[logging].level`;
//! `--verbose` forces `debug`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Pick the filter directive: `RUST_LOG`, then `--verbose`, then config.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if let Ok(env) = std::env::var("RUST_LOG") {
        if !env.trim().is_empty() {
            return env;
        }
    }
    if verbose {
        "debug".to_string()
    } else {
        config.level.clone()
    }
}

/// Install the global subscriber. Safe to call once per process; later calls
/// are ignored.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let directive = filter_directive(config, verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    let _ = tracing_subscriber::registry().with(layer).try_init();
}
