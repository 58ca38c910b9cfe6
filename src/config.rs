//! Configuration for the MIDI viewer
//!
//! Handles loading, parsing and validating the optional YAML configuration
//! file. Command-line flags are applied on top in `main`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::midi::MessageKind;
use crate::monitor::{Column, Filter, DEFAULT_CAPACITY, MAX_CAPACITY};
use crate::viewer::theme::ThemeName;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Number of events kept in the log
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Input port index or name pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default)]
    pub theme: ThemeName,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Initial filter state
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Channels to hide, numbered 1-16
    #[serde(default)]
    pub hidden_channels: Vec<u8>,
    #[serde(default)]
    pub hidden_kinds: Vec<MessageKind>,
    #[serde(default)]
    pub hidden_columns: Vec<Column>,
    #[serde(default = "default_true")]
    pub show_note_names: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_CAPACITY,
            device: None,
            theme: ThemeName::default(),
            filter: FilterConfig::default(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            hidden_channels: Vec::new(),
            hidden_kinds: Vec::new(),
            hidden_columns: Vec::new(),
            show_note_names: true,
        }
    }
}

fn default_log_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load and validate configuration from a YAML file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse and validate YAML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_capacity == 0 {
            bail!("log_capacity must be at least 1");
        }
        if self.log_capacity > MAX_CAPACITY {
            bail!(
                "log_capacity {} is too large (maximum {})",
                self.log_capacity,
                MAX_CAPACITY
            );
        }
        self.filter.validate()
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(ch) = self.hidden_channels.iter().find(|ch| !(1..=16).contains(*ch)) {
            bail!("hidden channel {} is out of range (1-16)", ch);
        }
        Ok(())
    }

    /// Build the initial engine filter
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();

        let mut channels = self.hidden_channels.clone();
        channels.sort_unstable();
        channels.dedup();
        for ch in channels.into_iter().filter(|ch| (1..=16).contains(ch)) {
            filter.toggle_channel(ch - 1);
        }

        let mut kinds = self.hidden_kinds.clone();
        kinds.sort_unstable();
        kinds.dedup();
        for kind in kinds {
            filter.toggle_kind(kind);
        }

        let mut columns = self.hidden_columns.clone();
        columns.sort_unstable();
        columns.dedup();
        for column in columns {
            filter.toggle_column(column);
        }

        filter.set_show_note_names(self.show_note_names);
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() -> Result<()> {
        let config = AppConfig::parse("{}")?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_capacity, 1000);
        assert_eq!(config.filter.to_filter(), Filter::new());
        Ok(())
    }

    #[test]
    fn test_full_config() -> Result<()> {
        let yaml = r#"
log_capacity: 250
device: "minilab"
theme: light
filter:
  hidden_channels: [10, 1, 10]
  hidden_kinds: ["Clock", "Active Sense"]
  hidden_columns: ["Time"]
  show_note_names: false
"#;
        let config = AppConfig::parse(yaml)?;
        assert_eq!(config.log_capacity, 250);
        assert_eq!(config.device.as_deref(), Some("minilab"));
        assert_eq!(config.theme, ThemeName::Light);

        let filter = config.filter.to_filter();
        assert_eq!(filter.hidden_channels(), vec![0, 9]);
        assert_eq!(
            filter.hidden_kinds(),
            vec![MessageKind::Clock, MessageKind::ActiveSense]
        );
        assert_eq!(filter.hidden_columns(), vec![Column::Time]);
        assert!(!filter.show_note_names());
        Ok(())
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::parse("log_capacity: 0").is_err());
        assert!(AppConfig::parse("log_capacity: 18446744073709551615").is_err());
        assert!(AppConfig::parse("log_capacity: 1000001").is_err());
        assert!(AppConfig::parse("log_capacity: 1000000").is_ok());
        assert!(AppConfig::parse("filter:\n  hidden_channels: [17]").is_err());
        assert!(AppConfig::parse("filter:\n  hidden_channels: [0]").is_err());
        assert!(AppConfig::parse("filter:\n  hidden_kinds: [\"Warble\"]").is_err());
        assert!(AppConfig::parse("filter:\n  hidden_columns: [\"Velocity\"]").is_err());
        assert!(AppConfig::parse("colour: red").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "log_capacity: 42\n")?;

        let config = AppConfig::load(&config_path).await?;
        assert_eq!(config.log_capacity, 42);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let missing = temp_dir.path().join("absent.yaml");

        assert!(AppConfig::load(&missing).await.is_err());
        assert_eq!(AppConfig::load_or_default(&missing).await?, AppConfig::default());
        Ok(())
    }
}
