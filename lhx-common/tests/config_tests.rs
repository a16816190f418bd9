//! Tests for data folder resolution and config loading
//!
//! Tests that manipulate LHX_DATA_FOLDER or LHX_CONFIG are marked with
//! #[serial] so they do not race on the process environment.

use lhx_common::config::{
    load_toml_config, resolve_api_key, resolve_config_path, CompiledDefaults,
    DataFolderInitializer, DataFolderResolver, TomlConfig, CONFIG_PATH_ENV, DATA_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.data_folder.as_os_str().is_empty());
    assert_eq!(defaults.log_level, "info");
    assert_eq!(defaults.request_delay_ms, 500);
    assert!(defaults.max_fetch_attempts >= 1);
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(DATA_FOLDER_ENV);

    let folder = DataFolderResolver::new().resolve();

    assert_eq!(folder, CompiledDefaults::for_current_platform().data_folder);
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    env::remove_var(DATA_FOLDER_ENV);

    let toml = TomlConfig {
        data_folder: Some(PathBuf::from("/tmp/lhx-from-toml")),
        ..Default::default()
    };

    // TOML beats compiled default
    let folder = DataFolderResolver::new().with_toml(&toml).resolve();
    assert_eq!(folder, PathBuf::from("/tmp/lhx-from-toml"));

    // Environment beats TOML
    env::set_var(DATA_FOLDER_ENV, "/tmp/lhx-from-env");
    let folder = DataFolderResolver::new().with_toml(&toml).resolve();
    assert_eq!(folder, PathBuf::from("/tmp/lhx-from-env"));

    // CLI beats everything
    let folder = DataFolderResolver::new()
        .with_toml(&toml)
        .with_cli_arg(Some(PathBuf::from("/tmp/lhx-from-cli")))
        .resolve();
    assert_eq!(folder, PathBuf::from("/tmp/lhx-from-cli"));

    env::remove_var(DATA_FOLDER_ENV);
}

#[test]
#[serial]
fn test_config_path_env_override() {
    env::set_var(CONFIG_PATH_ENV, "/tmp/lhx-test.toml");
    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/tmp/lhx-test.toml"))
    );

    let explicit = PathBuf::from("/tmp/explicit.toml");
    assert_eq!(resolve_config_path(Some(explicit.as_path())), Some(explicit.clone()));

    env::remove_var(CONFIG_PATH_ENV);
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let config = load_toml_config(Some(&path)).unwrap();

    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_config_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lhx.toml");
    std::fs::write(&path, "lastfm_user = [unterminated").unwrap();

    assert!(load_toml_config(Some(&path)).is_err());
}

#[test]
fn test_full_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lhx.toml");
    std::fs::write(
        &path,
        r#"
data_folder = "/srv/lhx"
lastfm_user = "AlexKuk"
lastfm_api_key = "lastfm-key"
echonest_api_key = "echonest-key"
request_delay_ms = 1000
max_fetch_attempts = 2

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_toml_config(Some(&path)).unwrap();

    assert_eq!(config.data_folder, Some(PathBuf::from("/srv/lhx")));
    assert_eq!(config.lastfm_api_key.as_deref(), Some("lastfm-key"));
    assert_eq!(config.echonest_api_key.as_deref(), Some("echonest-key"));
    assert_eq!(config.request_delay_ms, Some(1000));
    assert_eq!(config.max_fetch_attempts, Some(2));
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_api_key_env_beats_toml() {
    let var = "LHX_TEST_API_KEY";
    let toml_key = "from-toml".to_string();

    env::remove_var(var);
    assert_eq!(resolve_api_key(var, Some(&toml_key)).as_deref(), Some("from-toml"));

    env::set_var(var, "from-env");
    assert_eq!(resolve_api_key(var, Some(&toml_key)).as_deref(), Some("from-env"));

    // Whitespace-only values do not count as configured
    env::set_var(var, "   ");
    assert_eq!(resolve_api_key(var, Some(&toml_key)).as_deref(), Some("from-toml"));
    assert_eq!(resolve_api_key(var, None), None);

    env::remove_var(var);
}

#[test]
fn test_initializer_creates_layout_idempotently() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("data");
    let initializer = DataFolderInitializer::new(root.clone());

    initializer.ensure_directories_exist().unwrap();
    initializer.ensure_directories_exist().unwrap();

    assert!(root.join("lastfm").is_dir());
    assert!(root.join("echonest").is_dir());
    assert!(root.join("musicbrainz").is_dir());
}
