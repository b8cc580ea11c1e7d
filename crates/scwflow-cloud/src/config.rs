//! Provider configuration
//!
//! The host hands the provider block over as JSON; every field has a default
//! so an empty block is valid.

use crate::error::{CloudError, Result};
use crate::locality;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider-wide settings shared by every controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Region used when a resource does not set `region`
    #[serde(default = "default_region")]
    pub region: String,

    /// Default zone, only informative for the regional services handled here
    #[serde(default)]
    pub zone: Option<String>,

    /// Project used when a resource does not set `project_id`
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub wait: WaitConfig,
}

/// Poll settings for waiters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Delay between two polls, `None` means the process default (5s)
    #[serde(default)]
    pub retry_interval_ms: Option<u64>,

    /// Upper bound for a single wait
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_region() -> String {
    "fr-par".to_string()
}

fn default_timeout_secs() -> u64 {
    15 * 60
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WaitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_interval(&self) -> Option<Duration> {
        self.retry_interval_ms.map(Duration::from_millis)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            zone: None,
            project_id: None,
            wait: WaitConfig::default(),
        }
    }
}

impl ProviderConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Parses and validates the host-supplied provider block
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: ProviderConfig = if value.is_null() {
            ProviderConfig::default()
        } else {
            serde_json::from_value(value)?
        };
        config.validate()?;
        tracing::debug!("Provider configured for region {}", config.region);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !locality::is_region(&self.region) {
            return Err(CloudError::invalid_attribute(
                "region",
                format!("{:?} is not a valid region", self.region),
            ));
        }
        if let Some(zone) = &self.zone {
            if !locality::is_zone(zone) {
                return Err(CloudError::invalid_attribute(
                    "zone",
                    format!("{:?} is not a valid zone", zone),
                ));
            }
        }
        if self.wait.timeout_secs == 0 {
            return Err(CloudError::invalid_attribute(
                "wait.timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}
