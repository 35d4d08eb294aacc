//! Tracing subscriber setup

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Default filter for a configured level; `RUST_LOG` takes precedence
#[must_use]
pub fn default_filter(level: &str) -> String {
    format!("tempcast={level},tower_http={level},warn")
}

/// Install the global subscriber. `verbose` forces debug output.
pub fn init(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("debug"), "tempcast=debug,tower_http=debug,warn");
        assert!(EnvFilter::try_new(default_filter("info")).is_ok());
    }
}
