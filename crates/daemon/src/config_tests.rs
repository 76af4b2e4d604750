// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn load_from_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(dir.path().join("drift")).unwrap();

    assert!(config.config_dir.is_dir());
    assert!(config.log_dir.is_dir());
    assert!(config.log_path().starts_with(&config.log_dir));
    assert!(config.settings.log_filter.is_none());
}

#[test]
fn settings_toml_is_read_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("drift");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("settings.toml"),
        "log_filter = \"drift=debug\"\nbus_capacity = 128\n",
    )
    .unwrap();

    let config = Config::load_from(config_dir).unwrap();
    assert_eq!(config.settings.log_filter.as_deref(), Some("drift=debug"));
    assert_eq!(config.settings.bus_capacity, Some(128));
}

#[test]
fn malformed_settings_error_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("drift");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("settings.toml"), "log_filter = [").unwrap();

    assert!(matches!(
        Config::load_from(config_dir),
        Err(ConfigError::Toml(_))
    ));
}

#[test]
#[serial_test::serial]
fn env_override_wins() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var(CONFIG_DIR_ENV, dir.path());
    let config = Config::load().unwrap();
    std::env::remove_var(CONFIG_DIR_ENV);

    assert_eq!(config.config_dir, dir.path());
}
