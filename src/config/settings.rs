//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and data, and the
//! defaults that command-line flags fall back to.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::DEFAULT_MAX_MODELS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Global paths singleton.
static PATHS: OnceLock<Paths> = OnceLock::new();

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/sunscan)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/sunscan)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance.
    pub fn get() -> ConfigResult<&'static Paths> {
        if let Some(paths) = PATHS.get() {
            return Ok(paths);
        }
        let paths = Self::new()?;
        Ok(PATHS.get_or_init(|| paths))
    }

    /// Initialize paths using XDG directories.
    fn new() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "sunscan", "sunscan").ok_or(ConfigError::DirectoryNotFound)?;

        let paths = Self {
            config_dir: project.config_dir().to_path_buf(),
            data_dir: project.data_dir().to_path_buf(),
        };

        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the path to the scans storage directory.
    pub fn scans_dir(&self) -> PathBuf {
        self.data_dir.join("scans")
    }
}

/// Application-wide settings.
///
/// Flags given on the command line always win; these fill the gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default device TCP port.
    pub default_port: u16,
    /// Default unit (slave) id.
    pub default_unit: u8,
    /// Default per-request response timeout in milliseconds.
    pub default_timeout_ms: u64,
    /// Default ceiling on models per scan (0 disables the bound).
    pub default_max_models: usize,
    /// Default output format.
    pub default_output_format: String,
    /// Auto-save scan results.
    pub auto_save_scans: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_port: 502,
            default_unit: 1,
            default_timeout_ms: 3000,
            default_max_models: DEFAULT_MAX_MODELS,
            default_output_format: "plain".to_string(),
            auto_save_scans: true,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::get()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &PathBuf) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        let file = Paths::get()?.settings_file();

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&file, content).map_err(|e| ConfigError::WriteFailed {
            path: file,
            reason: e.to_string(),
        })
    }
}
