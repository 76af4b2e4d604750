// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use drift_core::FakeClock;

fn fixture(dir: &tempfile::TempDir) -> Vault<FakeClock> {
    let paths = VaultPaths::new(dir.path());
    let db = Database::closed(paths.db());
    Vault::load(paths, db, FakeClock::new()).unwrap()
}

fn seed_creds(vault: &Vault<FakeClock>) {
    std::fs::write(vault.paths().creds(), b"[gdrive]\ntoken = xyz\n").unwrap();
}

#[yare::parameterized(
    first   = { 1, None },
    third   = { 3, None },
    fourth  = { 4, Some(1) },
    fifth   = { 5, Some(2) },
    sixth   = { 6, Some(4) },
    seventh = { 7, Some(8) },
    eighth  = { 8, Some(16) },
    ninth   = { 9, Some(32) },
    tenth   = { 10, None },
)]
fn delay_schedule(attempt: u32, expected_secs: Option<u64>) {
    assert_eq!(
        delay_for_attempt(attempt),
        expected_secs.map(Duration::from_secs)
    );
}

#[tokio::test]
async fn setup_enables_without_encrypting_in_session() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    seed_creds(&vault);

    vault.setup("hunter22").await.unwrap();

    let status = vault.status().await;
    assert!(status.enabled);
    assert!(status.unlocked);
    // auth.json written, sensitive files still plaintext
    assert!(vault.paths().auth().exists());
    assert!(vault.paths().db().exists());
    assert!(vault.paths().creds().exists());
    assert!(!vault.paths().db_enc().exists());
    assert!(!vault.paths().creds_enc().exists());
}

#[tokio::test]
async fn lock_unlock_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    seed_creds(&vault);
    vault.setup("hunter22").await.unwrap();

    let creds_before = std::fs::read(vault.paths().creds()).unwrap();

    vault.lock().await.unwrap();
    assert!(!vault.paths().db().exists());
    assert!(!vault.paths().creds().exists());
    assert!(vault.paths().db_enc().exists());
    assert!(vault.paths().creds_enc().exists());
    assert!(!vault.is_unlocked().await);

    vault.unlock("hunter22").await.unwrap();
    assert!(vault.paths().db().exists());
    assert!(vault.paths().creds().exists());
    assert!(!vault.paths().db_enc().exists());
    assert!(!vault.paths().creds_enc().exists());
    assert_eq!(std::fs::read(vault.paths().creds()).unwrap(), creds_before);
    assert!(vault.is_unlocked().await);
}

#[tokio::test]
async fn unlock_is_idempotent_while_unlocked() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    vault.setup("hunter22").await.unwrap();
    vault.unlock("hunter22").await.unwrap();
}

#[tokio::test]
async fn unlock_requires_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    assert!(matches!(
        vault.unlock("whatever").await,
        Err(VaultError::NotEnabled)
    ));
}

#[tokio::test]
async fn wrong_password_counts_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    vault.setup("hunter22").await.unwrap();
    vault.lock().await.unwrap();

    for _ in 0..2 {
        assert!(matches!(
            vault.unlock("wrong").await,
            Err(VaultError::WrongPassword)
        ));
    }
    assert_eq!(vault.lockout_status().await.failed_attempts, 2);

    vault.unlock("hunter22").await.unwrap();
    assert_eq!(vault.lockout_status().await.failed_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn lockout_after_ten_failures() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    vault.setup("hunter22").await.unwrap();
    vault.lock().await.unwrap();

    // Attempts 1-3 immediate, 4-9 delayed 1,2,4,8,16,32 s
    for attempt in 1..=9u32 {
        let before = tokio::time::Instant::now();
        assert!(matches!(
            vault.unlock("wrong").await,
            Err(VaultError::WrongPassword)
        ));
        let slept = tokio::time::Instant::now() - before;
        let expected = delay_for_attempt(attempt).unwrap_or(Duration::ZERO);
        assert!(
            slept >= expected,
            "attempt {attempt}: slept {slept:?}, expected at least {expected:?}"
        );
    }

    // Attempt 10 trips the lockout and resets the counter
    match vault.unlock("wrong").await {
        Err(VaultError::LockedOut { remaining_secs }) => assert_eq!(remaining_secs, 300),
        other => panic!("expected lockout, got {other:?}"),
    }
    let status = vault.lockout_status().await;
    assert!(status.locked_out);
    assert_eq!(status.failed_attempts, 0);

    // Even the correct password is refused inside the window
    assert!(matches!(
        vault.unlock("hunter22").await,
        Err(VaultError::LockedOut { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn lockout_expires_with_time() {
    let dir = tempfile::tempdir().unwrap();
    let paths = VaultPaths::new(dir.path());
    let db = Database::closed(paths.db());
    let clock = FakeClock::new();
    let vault = Vault::load(paths, db, clock.clone()).unwrap();

    vault.setup("hunter22").await.unwrap();
    vault.lock().await.unwrap();

    // Force a lockout directly through repeated failures
    for _ in 0..10 {
        let _ = vault.unlock("wrong").await;
    }
    assert!(vault.lockout_status().await.locked_out);

    clock.advance(Duration::from_secs(LOCKOUT_SECS + 1));
    assert!(!vault.lockout_status().await.locked_out);
    vault.unlock("hunter22").await.unwrap();
    assert_eq!(vault.lockout_status().await.failed_attempts, 0);
}

#[tokio::test]
async fn recovery_enabled_prefers_encrypted() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    seed_creds(&vault);
    vault.setup("hunter22").await.unwrap();
    vault.lock().await.unwrap();

    // Crash left plaintext alongside the encrypted copy
    std::fs::write(vault.paths().creds(), b"stale plaintext").unwrap();
    std::fs::write(vault.paths().db_sidecars()[0].clone(), b"wal").unwrap();
    std::fs::write(vault.paths().db(), b"stale db").unwrap();

    vault.recover_files().await.unwrap();

    assert!(!vault.paths().creds().exists());
    assert!(!vault.paths().db().exists());
    assert!(!vault.paths().db_sidecars()[0].exists());
    assert!(vault.paths().creds_enc().exists());
    assert!(vault.paths().db_enc().exists());

    // And the encrypted copy still unlocks
    vault.unlock("hunter22").await.unwrap();
    assert_eq!(
        std::fs::read(vault.paths().creds()).unwrap(),
        b"[gdrive]\ntoken = xyz\n"
    );
}

#[tokio::test]
async fn recovery_disabled_removes_stale_encrypted() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    std::fs::write(vault.paths().creds(), b"current").unwrap();
    std::fs::write(vault.paths().creds_enc(), b"stale sealed").unwrap();

    vault.recover_files().await.unwrap();

    assert!(vault.paths().creds().exists());
    assert!(!vault.paths().creds_enc().exists());
}

#[tokio::test]
async fn change_password_rekeys_files() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    seed_creds(&vault);
    vault.setup("old password").await.unwrap();

    vault
        .change_password("old password", "new password")
        .await
        .unwrap();
    assert!(vault.is_unlocked().await);

    vault.lock().await.unwrap();
    assert!(matches!(
        vault.unlock("old password").await,
        Err(VaultError::WrongPassword)
    ));
    vault.unlock("new password").await.unwrap();
}

#[tokio::test]
async fn change_password_rejects_wrong_old() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    vault.setup("old password").await.unwrap();

    assert!(matches!(
        vault.change_password("not it", "new password").await,
        Err(VaultError::WrongPassword)
    ));
    // Still unlocked and usable with the old password
    assert!(vault.is_unlocked().await);
}

#[tokio::test]
async fn change_password_rejects_short_new() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    vault.setup("old password").await.unwrap();

    assert!(matches!(
        vault.change_password("old password", "abc").await,
        Err(VaultError::PasswordTooShort { .. })
    ));
}

#[tokio::test]
async fn remove_restores_plaintext_and_disables() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    seed_creds(&vault);
    vault.setup("hunter22").await.unwrap();
    vault.lock().await.unwrap();

    vault.remove("hunter22").await.unwrap();

    let status = vault.status().await;
    assert!(!status.enabled);
    assert!(status.unlocked);
    assert!(!vault.paths().auth().exists());
    assert!(!vault.paths().creds_enc().exists());
    assert!(vault.paths().creds().exists());
    assert!(!vault.paths().db_enc().exists());
    assert!(vault.paths().db().exists());
}

#[tokio::test]
async fn pre_unlock_settings_available_while_locked() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fixture(&dir);
    vault.setup("hunter22").await.unwrap();
    vault
        .set_pre_unlock_settings(PreUnlockSettings {
            minimize_to_tray: true,
            start_at_login: true,
            language: None,
        })
        .await
        .unwrap();
    vault.lock().await.unwrap();

    // A fresh vault instance (new process) reads them before unlock
    let paths = VaultPaths::new(dir.path());
    let reloaded = Vault::load(
        paths.clone(),
        Database::closed(paths.db()),
        FakeClock::new(),
    )
    .unwrap();
    let settings = reloaded.pre_unlock_settings().await;
    assert!(settings.minimize_to_tray);
    assert!(settings.start_at_login);
}
