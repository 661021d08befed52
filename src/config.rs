use serde::Deserialize;

use crate::error::QueueError;

/// Construction-time settings for a [`QueueEngine`](crate::engine::QueueEngine).
///
/// Every field has a default, so a YAML file only needs to name the values it
/// changes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct QueueConfig {
    /// maximum number of waiting jobs
    pub capacity: usize,
    /// time units a job may wait before it is evicted
    pub expiry_threshold: u64,
    /// time units of waiting per one-level urgency promotion
    pub aging_interval: u64,
    /// priority given to jobs submitted without one
    pub default_priority: u32,
    /// most urgent priority number; aging never goes below it
    pub priority_floor: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            expiry_threshold: 60,
            aging_interval: 10,
            default_priority: 5,
            priority_floor: 1,
        }
    }
}

impl QueueConfig {
    pub fn from_yaml(input: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(input)
    }

    pub fn validate(&self) -> Result<(), QueueError> {
        let invalid = |reason: &str| {
            Err(QueueError::InvalidConfiguration(reason.to_owned()))
        };

        if self.capacity == 0 {
            return invalid("capacity must be positive");
        }
        if self.expiry_threshold == 0 {
            return invalid("expiry threshold must be positive");
        }
        if self.aging_interval == 0 {
            return invalid("aging interval must be positive");
        }
        if self.priority_floor == 0 {
            return invalid("priority floor must be positive");
        }

        Ok(())
    }
}
