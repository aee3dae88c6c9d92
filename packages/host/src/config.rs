//! Chain level parameters consumed by the client and channel handlers.

use std::str::FromStr;

use interchain_utils::ensure;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::{
    context::HostEnv,
    error::ConfigError,
    height::{Height, Timeout},
};

/// Wildcard entry of [`IbcParams::allowed_clients`].
pub const ALLOW_ALL_CLIENTS: &str = "*";

/// Parameters of the interchain core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(clippy::module_name_repetitions)]
pub struct IbcParams {
    /// Client types that may be created. `"*"` allows every type.
    #[serde(default = "default_allowed_clients")]
    pub allowed_clients: Vec<String>,
    /// Expected block time, used to turn a time delay into a block delay.
    #[serde(
        with = "interchain_utils::serde::number_as_string",
        default = "default_block_time"
    )]
    pub max_expected_time_per_block_ns: u64,
    /// Timeout applied to upgrades that do not carry their own.
    #[serde(default)]
    pub upgrade_timeout: UpgradeTimeoutParams,
    /// Log level for [`crate::logging::init_subscriber`].
    #[serde(default)]
    pub log_level: String,
}

/// Relative deadline used for default upgrade timeouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeTimeoutParams {
    /// Blocks after the current height. Zero disables the height component.
    #[serde(default)]
    pub height_offset: u64,
    /// Nanoseconds after the current block time. Zero disables it.
    #[serde(with = "interchain_utils::serde::number_as_string")]
    pub timestamp_offset_ns: u64,
}

fn default_allowed_clients() -> Vec<String> {
    vec!["06-solomachine".to_string()]
}

const fn default_block_time() -> u64 {
    30_000_000_000
}

impl Default for UpgradeTimeoutParams {
    fn default() -> Self {
        Self {
            height_offset: 0,
            timestamp_offset_ns: 600_000_000_000,
        }
    }
}

impl Default for IbcParams {
    fn default() -> Self {
        Self {
            allowed_clients: default_allowed_clients(),
            max_expected_time_per_block_ns: default_block_time(),
            upgrade_timeout: UpgradeTimeoutParams::default(),
            log_level: String::new(),
        }
    }
}

impl IbcParams {
    /// Parses parameters from JSON. Errors name the offending JSON path.
    /// # Errors
    /// Returns an error on malformed JSON, unknown fields or failed validation.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let params: Self = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| anyhow::anyhow!("config error at {}: {}", e.path(), e.inner()))?;
        params.validate()?;
        Ok(params)
    }

    /// Checks the invariants serde cannot express.
    /// # Errors
    /// See [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(
            self.max_expected_time_per_block_ns > 0,
            ConfigError::ZeroBlockTime
        );
        ensure!(
            self.upgrade_timeout.height_offset > 0 || self.upgrade_timeout.timestamp_offset_ns > 0,
            ConfigError::EmptyUpgradeTimeout
        );
        ensure!(
            self.allowed_clients.iter().all(|c| !c.trim().is_empty()),
            ConfigError::EmptyAllowedClient
        );
        Ok(())
    }

    /// Whether clients of `client_type` may be created and used.
    #[must_use]
    pub fn is_client_allowed(&self, client_type: &str) -> bool {
        self.allowed_clients
            .iter()
            .any(|c| c == ALLOW_ALL_CLIENTS || c == client_type)
    }

    /// The log level, `INFO` when unset or unparsable.
    #[must_use]
    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

impl UpgradeTimeoutParams {
    /// Absolute timeout relative to the given host environment.
    #[must_use]
    pub fn resolve(&self, env: &HostEnv) -> Timeout {
        let height = if self.height_offset == 0 {
            Height::zero()
        } else {
            Height::new(
                env.height.revision_number,
                env.height.revision_height.saturating_add(self.height_offset),
            )
        };
        let timestamp = if self.timestamp_offset_ns == 0 {
            0
        } else {
            env.timestamp.saturating_add(self.timestamp_offset_ns)
        };
        Timeout::new(height, timestamp)
    }
}
