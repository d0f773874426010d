//! Tracing subscriber setup.

use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info,fleetdb=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Installs the global tracing subscriber.
///
/// Returns an error if a global subscriber was already set.
#[cfg(feature = "logging")]
pub fn init_logging(config: &LoggingConfig) -> crate::FleetResult<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| crate::FleetError::Configuration(format!("failed to init logging: {e}")))?;

    tracing::info!(level = %config.level, json = config.json, "Logging initialized");
    Ok(())
}

/// No-op when the `logging` feature is disabled.
#[cfg(not(feature = "logging"))]
pub fn init_logging(_config: &LoggingConfig) -> crate::FleetResult<()> {
    Ok(())
}
