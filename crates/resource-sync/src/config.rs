//! # Engine Configuration
//!
//! Runtime knobs of the sync engine, loaded from TOML with per-field defaults so an empty
//! file (or no file at all) yields a working configuration.
//!
//! ## File Format
//! ```toml
//! [eventing]
//! poll_interval_secs = 20      # 0 disables periodic polling
//! notification_buffer = 64
//! subscriber_buffer = 256
//! added_events = "emit_all"    # emit_all | top_level_only
//!
//! [service]
//! root_collection = "Managers"
//! url_prefix = "/redfish/v1"
//! ```

use crate::error::{SyncError, SyncResult};
use crate::model::CollectionType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Whether descendants of a freshly added resource report their own `ResourceAdded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddedEventPolicy {
    #[default]
    EmitAll,
    TopLevelOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventingSettings {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    #[serde(default)]
    pub added_events: AddedEventPolicy,
}

fn default_poll_interval() -> u64 {
    20
}

fn default_notification_buffer() -> usize {
    64
}

fn default_subscriber_buffer() -> usize {
    256
}

impl Default for EventingSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            notification_buffer: default_notification_buffer(),
            subscriber_buffer: default_subscriber_buffer(),
            added_events: AddedEventPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Collection listed at the agent root when polling.
    #[serde(default = "default_root_collection")]
    pub root_collection: CollectionType,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

fn default_root_collection() -> CollectionType {
    CollectionType::Managers
}

fn default_url_prefix() -> String {
    "/redfish/v1".to_string()
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            root_collection: default_root_collection(),
            url_prefix: default_url_prefix(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub eventing: EventingSettings,
    #[serde(default)]
    pub service: ServiceSettings,
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> SyncResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at `path`, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }
        info!(?path, "Loading engine config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.eventing.notification_buffer == 0 {
            return Err(SyncError::Config(
                "notification_buffer must be greater than 0".into(),
            ));
        }
        if self.eventing.subscriber_buffer == 0 {
            return Err(SyncError::Config(
                "subscriber_buffer must be greater than 0".into(),
            ));
        }
        if self.service.url_prefix.is_empty() {
            return Err(SyncError::Config("url_prefix must not be empty".into()));
        }
        Ok(())
    }

    /// Poll period, `None` when periodic polling is disabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        match self.eventing.poll_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(20)));
        assert_eq!(config.eventing.added_events, AddedEventPolicy::EmitAll);
    }

    #[test]
    fn parses_partial_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
            [eventing]
            poll_interval_secs = 0
            added_events = "top_level_only"

            [service]
            url_prefix = "/rest"
            "#,
        )
        .unwrap();

        assert_eq!(config.poll_interval(), None);
        assert_eq!(config.eventing.added_events, AddedEventPolicy::TopLevelOnly);
        assert_eq!(config.eventing.notification_buffer, 64);
        assert_eq!(config.service.url_prefix, "/rest");
        assert_eq!(config.service.root_collection, CollectionType::Managers);
    }

    #[test]
    fn rejects_zero_buffers() {
        let err = EngineConfig::from_toml_str("[eventing]\nnotification_buffer = 0").unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = EngineConfig::load("/nonexistent/engine.toml").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
