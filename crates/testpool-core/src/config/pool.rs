//! Identifier pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Location and locking policy of the identifier pool file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Path to the CSV pool file.
    #[serde(default = "default_path")]
    pub path: String,
    /// Maximum time to wait for the pool lock, in milliseconds.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
    /// Delay between lock attempts, in milliseconds.
    #[serde(default = "default_lock_poll_interval")]
    pub lock_poll_interval_ms: u64,
    /// Names of the columns the allocator reads and writes.
    #[serde(default)]
    pub columns: ColumnConfig,
    /// Descriptive columns expected in the seed file. Missing ones only
    /// produce a warning.
    #[serde(default = "default_descriptive_columns")]
    pub descriptive_columns: Vec<String>,
}

impl PoolConfig {
    /// Lock wait timeout as a `Duration`.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Lock poll interval as a `Duration`.
    pub fn lock_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lock_poll_interval_ms.max(1))
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            lock_timeout_ms: default_lock_timeout(),
            lock_poll_interval_ms: default_lock_poll_interval(),
            columns: ColumnConfig::default(),
            descriptive_columns: default_descriptive_columns(),
        }
    }
}

/// Header names of the identifier, flag and tag columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Premise identifier column.
    #[serde(default = "default_premise_id")]
    pub premise_id: String,
    /// Device identifier column.
    #[serde(default = "default_device_id")]
    pub device_id: String,
    /// Reservation flag for the premise identifier.
    #[serde(default = "default_premise_flag")]
    pub premise_flag: String,
    /// Reservation flag for the device identifier.
    #[serde(default = "default_device_flag")]
    pub device_flag: String,
    /// Requester-supplied tag.
    #[serde(default = "default_tag")]
    pub tag: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            premise_id: default_premise_id(),
            device_id: default_device_id(),
            premise_flag: default_premise_flag(),
            device_flag: default_device_flag(),
            tag: default_tag(),
        }
    }
}

fn default_path() -> String {
    "data/premise_data.csv".to_string()
}

fn default_lock_timeout() -> u64 {
    5000
}

fn default_lock_poll_interval() -> u64 {
    25
}

fn default_premise_id() -> String {
    "Premise_ID".to_string()
}

fn default_device_id() -> String {
    "Dummy_Device_ID".to_string()
}

fn default_premise_flag() -> String {
    "Utilized_PID".to_string()
}

fn default_device_flag() -> String {
    "Utilized_Dev".to_string()
}

fn default_tag() -> String {
    "Test_Case_ID".to_string()
}

fn default_descriptive_columns() -> Vec<String> {
    [
        "Premise_ID",
        "Post_Code",
        "Street_Name",
        "Street_Number",
        "UPRN",
        "Network_Type",
        "Network_Owner",
        "Cabinet",
        "Dummy_Device_ID",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
