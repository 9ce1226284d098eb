use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;
use crate::Result;

/// Database facade configuration
///
/// ```toml
/// [database]
/// delivery_queue_size = 1024
/// keep_synced = true
/// persistence_enabled = false
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Capacity of the observer delivery queue
    ///
    /// Deliveries are produced by the event dispatcher and by late
    /// registrations, and consumed by a single delivery worker. When the queue
    /// is full, producers wait; deliveries are never dropped.
    /// `0` means unbounded.
    ///
    /// **Default**: 1024
    #[serde(default = "default_delivery_queue_size")]
    pub delivery_queue_size: usize,

    /// Ask the remote client to keep every observed path synchronized
    ///
    /// **Default**: true
    #[serde(default = "default_keep_synced")]
    pub keep_synced: bool,

    /// Initial value of the remote client's persistence toggle
    ///
    /// **Default**: false
    #[serde(default)]
    pub persistence_enabled: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            delivery_queue_size: default_delivery_queue_size(),
            keep_synced: default_keep_synced(),
            persistence_enabled: false,
        }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.delivery_queue_size == 0 {
            warn!("database.delivery_queue_size is 0, the delivery queue is unbounded");
        }

        if self.delivery_queue_size > 1_000_000 {
            return Err(Error::Config(ConfigError::Message(format!(
                "database.delivery_queue_size ({}) must not exceed 1000000",
                self.delivery_queue_size
            ))));
        }

        Ok(())
    }
}

const fn default_delivery_queue_size() -> usize {
    1024
}

const fn default_keep_synced() -> bool {
    true
}
