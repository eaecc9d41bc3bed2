//! Tracing setup and log-safe identifiers.

use crate::config::LoggingSettings;
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, writing to stderr. `RUST_LOG` overrides the configured filter.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("Failed to initialize logging: {err}"))
}

/// Stable pseudonym for a transport user id. Raw ids never reach the logs.
pub fn user_ref(user_id: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(user_id.as_bytes()));
    digest[..12].to_string()
}
