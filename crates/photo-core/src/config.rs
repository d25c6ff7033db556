//! Configuration types for the photo catalogue.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PhotoError, Result};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoConfig {
    /// Directory scan configuration.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Catalogue file configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Viewer configuration.
    #[serde(default)]
    pub viewer: ViewerConfig,
}

/// Directory scan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Photo file extensions, compared case-insensitively, without the dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Follow symbolic links while walking.
    #[serde(default)]
    pub follow_links: bool,

    /// Skip files whose name starts with a dot.
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            follow_links: false,
            skip_hidden: true,
        }
    }
}

impl ScanConfig {
    /// Check a file extension against the allow-list.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Catalogue file configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Copy the previous catalogue to `<file>.bak` before each rewrite.
    #[serde(default)]
    pub backup: bool,
}

/// Viewer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Number of completion suggestions shown below the input line.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
        }
    }
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()]
}

fn default_max_suggestions() -> usize {
    5
}

impl PhotoConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PhotoError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from the explicit path, else the default paths.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(user_config) = user_config_path() {
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("photo-manager.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }
}

/// `<config_dir>/photo-manager/config.toml`, if the platform has one.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("photo-manager").join("config.toml"))
}
