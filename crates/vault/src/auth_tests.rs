// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn missing_file_is_disabled_default() {
    let dir = tempfile::tempdir().unwrap();
    let auth = AuthFile::load(&dir.path().join("auth.json")).unwrap();
    assert!(!auth.enabled);
    assert!(auth.password_hash.is_none());
    assert_eq!(auth.failed_attempts, 0);
}

#[test]
fn save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth.json");

    let auth = AuthFile {
        enabled: true,
        password_hash: Some("argon2id$v=19$m=65536,t=3,p=4$abc$def".to_string()),
        failed_attempts: 2,
        lockout_until_ms: Some(9999),
        pre_unlock: PreUnlockSettings {
            minimize_to_tray: true,
            start_at_login: false,
            language: Some("en".to_string()),
        },
    };
    auth.save(&path).unwrap();

    let loaded = AuthFile::load(&path).unwrap();
    assert_eq!(loaded, auth);
}

#[test]
fn file_is_plaintext_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth.json");
    AuthFile {
        enabled: true,
        ..Default::default()
    }
    .save(&path)
    .unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"enabled\": true"));
}

#[test]
fn partial_json_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth.json");
    std::fs::write(&path, r#"{"enabled": false}"#).unwrap();

    let loaded = AuthFile::load(&path).unwrap();
    assert_eq!(loaded, AuthFile::default());
}
