//! Application paths for config and logs.
//!
//! - **Local mode**: if `config.yaml` exists in the working directory, it is
//!   used and logs go to `./logs`.
//! - **User mode** (default): files live under the platform config
//!   directory, e.g. `~/.config/midi-viewer` on Linux.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name used under the platform config directory
const APP_DIR: &str = "midi-viewer";

const CONFIG_FILE: &str = "config.yaml";

/// Resolved locations for config and log files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Directory for log files
    pub logs_dir: PathBuf,
    /// Whether the config was found in the working directory
    pub is_local: bool,
}

impl AppPaths {
    /// Detect paths from the working directory and platform dirs
    pub fn detect() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let base = dirs::config_dir().map(|dir| dir.join(APP_DIR));
        Self::resolve(&cwd, base)
    }

    fn resolve(cwd: &Path, user_dir: Option<PathBuf>) -> Self {
        let local_config = cwd.join(CONFIG_FILE);
        if local_config.exists() {
            debug!("Using local config: {}", local_config.display());
            return Self {
                config: local_config,
                logs_dir: cwd.join("logs"),
                is_local: true,
            };
        }

        // Without a platform config dir, fall back to the working directory
        let base = user_dir.unwrap_or_else(|| cwd.to_path_buf());
        Self {
            config: base.join(CONFIG_FILE),
            logs_dir: base.join("logs"),
            is_local: false,
        }
    }

    /// Create the logs directory if needed
    pub fn ensure_logs_dir(&self) -> anyhow::Result<&Path> {
        if !self.logs_dir.exists() {
            std::fs::create_dir_all(&self.logs_dir)?;
        }
        Ok(&self.logs_dir)
    }
}
