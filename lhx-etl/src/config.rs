//! Settings resolution for lhx-etl
//!
//! Combines the TOML config, environment and command-line overrides into the
//! values each stage needs.
//!
//! **Priority:** CLI → ENV → TOML → compiled default
//!
//! Credentials are optional at load time; a stage that needs one asks for it
//! through a `require_*` method and gets a configuration error if it is
//! missing.

use crate::error::{EtlError, EtlResult};
use crate::services::RetryPolicy;
use lhx_common::config::{
    is_valid_key, resolve_api_key, CompiledDefaults, DataFolderInitializer, DataFolderResolver,
    TomlConfig,
};
use lhx_common::time::millis_to_duration;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const LASTFM_API_KEY_ENV: &str = "LHX_LASTFM_API_KEY";
pub const ECHONEST_API_KEY_ENV: &str = "LHX_ECHONEST_API_KEY";
pub const LASTFM_USER_ENV: &str = "LHX_LASTFM_USER";

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_folder: Option<PathBuf>,
    pub lastfm_user: Option<String>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct EtlSettings {
    pub data: DataFolderInitializer,
    pub lastfm_user: Option<String>,
    pub lastfm_api_key: Option<String>,
    pub echonest_api_key: Option<String>,
    pub lastfm_base_url: Option<String>,
    pub echonest_base_url: Option<String>,
    pub musicbrainz_base_url: Option<String>,
    /// Minimum delay between outbound requests
    pub request_delay: Duration,
    pub retry: RetryPolicy,
}

impl EtlSettings {
    pub fn resolve(toml: &TomlConfig, cli: CliOverrides) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        let root = DataFolderResolver::new()
            .with_cli_arg(cli.data_folder)
            .with_toml(toml)
            .resolve();

        let lastfm_user = cli
            .lastfm_user
            .filter(|u| is_valid_key(u))
            .or_else(|| resolve_api_key(LASTFM_USER_ENV, toml.lastfm_user.as_ref()));

        Self {
            data: DataFolderInitializer::new(root),
            lastfm_user,
            lastfm_api_key: resolve_credential(LASTFM_API_KEY_ENV, toml.lastfm_api_key.as_ref()),
            echonest_api_key: resolve_credential(
                ECHONEST_API_KEY_ENV,
                toml.echonest_api_key.as_ref(),
            ),
            lastfm_base_url: toml.lastfm_base_url.clone(),
            echonest_base_url: toml.echonest_base_url.clone(),
            musicbrainz_base_url: toml.musicbrainz_base_url.clone(),
            request_delay: millis_to_duration(
                toml.request_delay_ms.unwrap_or(defaults.request_delay_ms),
            ),
            retry: RetryPolicy::default().with_max_attempts(
                toml.max_fetch_attempts.unwrap_or(defaults.max_fetch_attempts),
            ),
        }
    }

    /// Last.fm API key and user name, both required for downloading
    pub fn require_lastfm(&self) -> EtlResult<(&str, &str)> {
        let key = self.lastfm_api_key.as_deref().ok_or_else(|| {
            EtlError::Config(format!(
                "Last.fm API key not configured (set {} or lastfm_api_key)",
                LASTFM_API_KEY_ENV
            ))
        })?;
        let user = self.lastfm_user.as_deref().ok_or_else(|| {
            EtlError::Config(format!(
                "Last.fm user not configured (use --user, {} or lastfm_user)",
                LASTFM_USER_ENV
            ))
        })?;
        Ok((key, user))
    }

    /// `base` with the resolved data folder and user filled in
    ///
    /// API keys are copied from `base` only; keys taken from the environment
    /// stay out of the written file.
    pub fn to_toml(&self, base: &TomlConfig) -> TomlConfig {
        TomlConfig {
            data_folder: Some(self.data.root().to_path_buf()),
            lastfm_user: self.lastfm_user.clone(),
            ..base.clone()
        }
    }

    pub fn require_echonest_key(&self) -> EtlResult<&str> {
        self.echonest_api_key.as_deref().ok_or_else(|| {
            EtlError::Config(format!(
                "Song search API key not configured (set {} or echonest_api_key)",
                ECHONEST_API_KEY_ENV
            ))
        })
    }
}

/// ENV → TOML, warning when both are set
fn resolve_credential(env_var: &str, toml_value: Option<&String>) -> Option<String> {
    let env_set = std::env::var(env_var).map_or(false, |v| is_valid_key(&v));
    let toml_set = toml_value.map_or(false, |v| is_valid_key(v));
    if env_set && toml_set {
        warn!(
            "{} set in both environment and TOML config. Using environment (higher priority).",
            env_var
        );
    }
    resolve_api_key(env_var, toml_value)
}
