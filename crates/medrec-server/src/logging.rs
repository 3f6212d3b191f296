//! Structured logging with tracing
//!
//! `MEDREC_LOG` (an `EnvFilter` directive) overrides the configured level.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;

pub const LOG_ENV_VAR: &str = "MEDREC_LOG";

/// Build the filter: `MEDREC_LOG` if set and valid, else the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let registry = Registry::default().with(env_filter(config));

    if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()?;
    }

    info!(level = %config.level, json = config.json, "logging initialized");
    Ok(())
}
