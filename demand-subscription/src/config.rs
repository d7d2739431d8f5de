//! JSON configuration for subscriptions.
//!
//! ```json
//! {
//!     "backpressure": { "strategy": "oldest", "capacity": 128 },
//!     "initial_request": 16
//! }
//! ```

use crate::backpressure::strategies::{DropLatest, DropOldest, Unbounded};
use crate::backpressure::BackpressurePolicy;
use crate::error::ConfigError;
use crate::observability::events;
use serde::Deserialize;
use std::fs::{self, canonicalize};
use std::io;
use std::path::Path;
use tracing::{debug, info};

const COMPONENT: &str = "config";

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BackpressureStrategy {
    /// Unbounded buffer.
    #[default]
    Buffer,
    /// Bounded; evicts the oldest buffered payloads.
    Oldest,
    /// Bounded; rejects newly published payloads.
    Latest,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BackpressureConfig {
    #[serde(default)]
    pub strategy: BackpressureStrategy,
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl BackpressureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.strategy, self.capacity) {
            (BackpressureStrategy::Buffer, Some(_)) => Err(ConfigError::Invalid(
                "the buffer strategy is unbounded and takes no capacity".to_string(),
            )),
            (BackpressureStrategy::Oldest | BackpressureStrategy::Latest, None) => {
                Err(ConfigError::Invalid(format!(
                    "the {:?} strategy requires a capacity",
                    self.strategy
                )))
            }
            (_, Some(0)) => Err(ConfigError::Invalid(
                "capacity must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Instantiates the configured policy.
    pub fn build<T: 'static>(&self) -> Result<Box<dyn BackpressurePolicy<T>>, ConfigError> {
        self.validate()?;
        let capacity = self.capacity.unwrap_or_default();
        Ok(match self.strategy {
            BackpressureStrategy::Buffer => Box::new(Unbounded),
            BackpressureStrategy::Oldest => Box::new(DropOldest::new(capacity)),
            BackpressureStrategy::Latest => Box::new(DropLatest::new(capacity)),
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SubscriptionConfig {
    pub backpressure: BackpressureConfig,
    /// Demand issued right after the subscription is built.
    pub initial_request: Option<u64>,
}

impl SubscriptionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backpressure.validate()?;
        if self.initial_request == Some(0) {
            return Err(ConfigError::Invalid(
                "initial_request must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SubscriptionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(component = COMPONENT, path = %path.display(), "loading subscription config");

        let canonical = canonicalize(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf(), err),
            _ => ConfigError::Unreadable(path.to_path_buf(), err),
        })?;
        let data = fs::read_to_string(&canonical)
            .map_err(|err| ConfigError::Unreadable(canonical.clone(), err))?;

        let config = Self::from_json_str(&data)?;
        info!(
            event = events::CONFIG_LOADED,
            component = COMPONENT,
            path = %canonical.display(),
            strategy = ?config.backpressure.strategy,
            capacity = ?config.backpressure.capacity,
            "subscription config loaded"
        );
        Ok(config)
    }
}
