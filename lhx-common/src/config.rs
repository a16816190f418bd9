//! Configuration loading and data folder resolution
//!
//! Data folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `LHX_DATA_FOLDER` environment variable
//! 3. `data_folder` key of the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal: the caller gets a
//! warning and the compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the data folder
pub const DATA_FOLDER_ENV: &str = "LHX_DATA_FOLDER";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "LHX_CONFIG";

/// Config file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "lhx.toml";

/// Sub-directory holding raw Last.fm `<page>.xml` dumps
pub const LASTFM_DIR: &str = "lastfm";

/// Sub-directory holding song search results `<md5>.json`
pub const ECHONEST_DIR: &str = "echonest";

/// Sub-directory holding MusicBrainz releases `<mbid>.json`
pub const MUSICBRAINZ_DIR: &str = "musicbrainz";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding caches and consolidated files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_folder: Option<PathBuf>,

    /// Last.fm user whose history is downloaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastfm_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastfm_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echonest_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastfm_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echonest_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub musicbrainz_base_url: Option<String>,

    /// Minimum delay between outbound requests (milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,

    /// Attempts per request, including the first one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fetch_attempts: Option<u32>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_folder: PathBuf,
    pub log_level: String,
    pub request_delay_ms: u64,
    pub max_fetch_attempts: u32,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            data_folder: get_default_data_folder(),
            log_level: default_log_level(),
            request_delay_ms: 500,
            max_fetch_attempts: 4,
        }
    }
}

/// Get OS-dependent default data folder path
pub fn get_default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lhx"))
        .unwrap_or_else(|| PathBuf::from("./lhx_data"))
}

/// Default config file location (`<config_dir>/lhx/lhx.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lhx").join(CONFIG_FILE_NAME))
}

/// Locate the config file: explicit path, then `LHX_CONFIG`, then default
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    default_config_path()
}

/// Load the TOML config, falling back to defaults if the file is missing
///
/// A file that exists but fails to parse is an error: silently ignoring a
/// typo in an API key would only move the failure somewhere less obvious.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        warn!("No config file location available, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write the TOML config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    crate::fs::write_atomic(path, content.as_bytes())
}

/// Resolves the data folder following the documented priority order
#[derive(Debug, Clone, Default)]
pub struct DataFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl DataFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_value = config.data_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().data_folder
    }
}

/// Creates the data folder layout on first use
#[derive(Debug, Clone)]
pub struct DataFolderInitializer {
    root: PathBuf,
}

impl DataFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lastfm_dir(&self) -> PathBuf {
        self.root.join(LASTFM_DIR)
    }

    pub fn echonest_dir(&self) -> PathBuf {
        self.root.join(ECHONEST_DIR)
    }

    pub fn musicbrainz_dir(&self) -> PathBuf {
        self.root.join(MUSICBRAINZ_DIR)
    }

    /// Path of a consolidated file such as `lastfm_tracks.json`
    pub fn consolidated_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Create the root and per-source directories (idempotent)
    pub fn ensure_directories_exist(&self) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.lastfm_dir(),
            self.echonest_dir(),
            self.musicbrainz_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Resolve an API key: environment variable first, then the TOML value
pub fn resolve_api_key(env_var: &str, toml_value: Option<&String>) -> Option<String> {
    if let Ok(key) = std::env::var(env_var) {
        if is_valid_key(&key) {
            info!("{} loaded from environment", env_var);
            return Some(key);
        }
    }

    toml_value.filter(|k| is_valid_key(k)).cloned()
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
