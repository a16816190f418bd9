//! Tests for atomic file writes (temp file + rename)

use lhx_common::config::{load_toml_config, write_toml_config, LoggingConfig, TomlConfig};
use lhx_common::fs::{temp_path_for, write_atomic};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_atomic_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("blob.json");

    write_atomic(&target, b"{\"a\":1}").unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "{\"a\":1}");
    assert!(!temp_path_for(&target).exists());
}

#[test]
fn test_atomic_write_overwrites_existing() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("blob.json");

    write_atomic(&target, b"first").unwrap();
    write_atomic(&target, b"second").unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
}

#[test]
fn test_atomic_write_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested/dir/blob.json");

    write_atomic(&target, b"[]").unwrap();

    assert!(target.exists());
}

#[test]
fn test_write_toml_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("lhx.toml");

    let config = TomlConfig {
        data_folder: Some(PathBuf::from("/music-data")),
        lastfm_user: Some("AlexKuk".to_string()),
        lastfm_api_key: Some("key123".to_string()),
        request_delay_ms: Some(750),
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        ..Default::default()
    };

    write_toml_config(&config, &target).unwrap();

    let content = std::fs::read_to_string(&target).unwrap();
    assert!(content.contains("lastfm_api_key"));
    assert!(content.contains("key123"));
    // Unset optional fields are not written
    assert!(!content.contains("echonest_api_key"));

    let loaded = load_toml_config(Some(&target)).unwrap();
    assert_eq!(loaded, config);
}
