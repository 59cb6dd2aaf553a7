//! Gateway configuration with validation.
//!
//! Every section has defaults, so an empty file is a valid configuration:
//!
//! ```toml
//! [admission]
//! failure_policy = "fail_closed"
//! store_timeout = "50ms"
//!
//! [admission.origin]
//! short = { limit = 20, window = "1s" }
//! long = { limit = 600, window = "1m" }
//!
//! [cost]
//! max_complexity = 1000
//! expensive_fields = ["search", "feed"]
//!
//! [loader]
//! batch_wait = "10ms"
//! ```

use crate::telemetry::TelemetryConfig;
use ql_02_admission::AdmissionConfig;
use ql_03_query_cost::CostConfig;
use ql_04_entity_loader::LoaderConfig;
use ql_05_event_fanout::FanoutConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Quotas, bans and counter-store failure policy
    pub admission: AdmissionConfig,
    /// Complexity and depth ceilings
    pub cost: CostConfig,
    /// Batch capacity and wait interval
    pub loader: LoaderConfig,
    /// Subscriber queue limits
    pub fanout: FanoutConfig,
    /// Logging
    pub telemetry: TelemetryConfig,
}

impl GatewayConfig {
    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Quotas
        for (name, rule) in self.admission.all_rules() {
            if rule.limit == 0 {
                return Err(ConfigError::InvalidRateLimit(format!(
                    "{name} limit cannot be 0"
                )));
            }
            if rule.window.is_zero() {
                return Err(ConfigError::InvalidDuration(format!(
                    "{name} window cannot be 0"
                )));
            }
        }
        if self.admission.store_timeout.is_zero() {
            return Err(ConfigError::InvalidDuration(
                "admission.store_timeout cannot be 0".into(),
            ));
        }

        // Cost ceilings
        if self.cost.max_depth == 0 {
            return Err(ConfigError::InvalidLimit("cost.max_depth cannot be 0".into()));
        }
        if self.cost.max_complexity == 0 {
            return Err(ConfigError::InvalidLimit(
                "cost.max_complexity cannot be 0".into(),
            ));
        }
        if self.cost.page_size_divisor == 0 {
            return Err(ConfigError::InvalidLimit(
                "cost.page_size_divisor cannot be 0".into(),
            ));
        }

        // Loader and fan-out capacities
        if self.loader.max_batch_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "loader.max_batch_size cannot be 0".into(),
            ));
        }
        if self.fanout.queue_capacity == 0 {
            return Err(ConfigError::InvalidLimit(
                "fanout.queue_capacity cannot be 0".into(),
            ));
        }
        if self.fanout.max_subscribers == Some(0) {
            return Err(ConfigError::InvalidLimit(
                "fanout.max_subscribers cannot be 0".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read configuration: {0}")]
    Io(String),
    /// File is not valid TOML for this schema
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    /// A quota limit is unusable
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    /// A size, depth or count limit is unusable
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// A window or timeout is unusable
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}
