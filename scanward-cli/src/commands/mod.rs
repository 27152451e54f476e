//! Command handlers -- one module per subcommand

pub mod config;
pub mod scan;
pub mod tiers;
pub mod verify;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use scanward_core::config::ScanwardConfig;
use scanward_core::error::{ConfigError, ScanwardError};
use scanward_core::store::MemoryStore;
use scanward_verifier::{DomainVerifier, NetworkTransport, VerifierConfig};

use crate::error::CliError;

/// Verifier wired to live DNS/HTTPS probes over the in-process store.
pub type NetworkVerifier = DomainVerifier<MemoryStore, NetworkTransport>;

/// Loads the effective configuration.
///
/// A missing file falls back to defaults plus environment overrides;
/// parse and validation errors are returned as-is.
pub async fn load_config(path: &Path) -> Result<ScanwardConfig, CliError> {
    match ScanwardConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(ScanwardError::Config(ConfigError::FileNotFound { .. })) => {
            debug!(path = %path.display(), "config file not found, using defaults");
            let mut config = ScanwardConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

/// Builds a verifier backed by the network transport.
pub fn build_verifier(
    config: &ScanwardConfig,
    store: Arc<MemoryStore>,
) -> Result<NetworkVerifier, CliError> {
    let verifier_config = VerifierConfig::from_core(&config.verification);
    let transport = NetworkTransport::new(&verifier_config)
        .map_err(|e| CliError::Command(format!("failed to build challenge transport: {e}")))?;
    Ok(DomainVerifier::new(store, transport, verifier_config)?)
}
