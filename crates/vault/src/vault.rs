// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vault lifecycle: setup, unlock, lock, password change, crash recovery
//!
//! While locked, the configuration database and the backend credentials
//! exist only as `<name>.enc`; while unlocked they are plaintext and the
//! database connection is open. The in-memory key lives in a `Zeroizing`
//! buffer and is wiped on lock, remove, and drop.

use crate::auth::{AuthFile, PreUnlockSettings};
use crate::crypt;
use crate::error::VaultError;
use crate::kdf;
use drift_core::Clock;
use drift_storage::Database;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

/// Lockout window after the final failed attempt.
pub const LOCKOUT_SECS: u64 = 300;
/// The attempt number that triggers the lockout.
pub const LOCKOUT_AT_ATTEMPT: u32 = 10;
/// Attempts that proceed without a server-side delay.
const FREE_ATTEMPTS: u32 = 3;

/// Server-side delay before the given attempt number (1-based).
///
/// Attempts 1–3 are free; attempts 4–9 wait `2^(n−3)` seconds; attempt
/// 10 is handled by the lockout instead.
pub fn delay_for_attempt(attempt: u32) -> Option<Duration> {
    if attempt <= FREE_ATTEMPTS || attempt >= LOCKOUT_AT_ATTEMPT {
        None
    } else {
        Some(Duration::from_secs(1 << (attempt - FREE_ATTEMPTS - 1)))
    }
}

/// Locations of everything the vault touches.
#[derive(Debug, Clone)]
pub struct VaultPaths {
    pub config_dir: PathBuf,
    pub db_file: String,
    pub creds_file: String,
}

impl VaultPaths {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            db_file: "drift.db".to_string(),
            creds_file: "rclone.conf".to_string(),
        }
    }

    pub fn db(&self) -> PathBuf {
        self.config_dir.join(&self.db_file)
    }

    pub fn db_enc(&self) -> PathBuf {
        self.config_dir.join(format!("{}.enc", self.db_file))
    }

    pub fn creds(&self) -> PathBuf {
        self.config_dir.join(&self.creds_file)
    }

    pub fn creds_enc(&self) -> PathBuf {
        self.config_dir.join(format!("{}.enc", self.creds_file))
    }

    pub fn auth(&self) -> PathBuf {
        self.config_dir.join("auth.json")
    }

    /// SQLite sidecars that must never survive into the encrypted state.
    pub fn db_sidecars(&self) -> [PathBuf; 2] {
        [
            self.config_dir.join(format!("{}-wal", self.db_file)),
            self.config_dir.join(format!("{}-shm", self.db_file)),
        ]
    }

    fn sensitive_pairs(&self) -> [(PathBuf, PathBuf); 2] {
        [
            (self.db(), self.db_enc()),
            (self.creds(), self.creds_enc()),
        ]
    }
}

/// Enabled/unlocked snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultStatus {
    pub enabled: bool,
    pub unlocked: bool,
}

/// Rate-limit snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutStatus {
    pub locked_out: bool,
    pub remaining_secs: u64,
    pub failed_attempts: u32,
}

struct State {
    auth: AuthFile,
    key: Option<Zeroizing<[u8; kdf::KEY_LEN]>>,
}

/// The secure state vault.
pub struct Vault<C: Clock> {
    paths: VaultPaths,
    db: Database,
    clock: C,
    state: Mutex<State>,
}

impl<C: Clock> Vault<C> {
    /// Load vault state from disk. Does not open the database.
    pub fn load(paths: VaultPaths, db: Database, clock: C) -> Result<Self, VaultError> {
        let auth = AuthFile::load(&paths.auth())?;
        Ok(Self {
            paths,
            db,
            clock,
            state: Mutex::new(State { auth, key: None }),
        })
    }

    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    pub async fn status(&self) -> VaultStatus {
        let state = self.state.lock().await;
        VaultStatus {
            enabled: state.auth.enabled,
            unlocked: state.key.is_some() || !state.auth.enabled,
        }
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.lock().await.auth.enabled
    }

    /// Whether protected state is currently accessible. Always true while
    /// the vault is disabled.
    pub async fn is_unlocked(&self) -> bool {
        self.status().await.unlocked
    }

    pub async fn pre_unlock_settings(&self) -> PreUnlockSettings {
        self.state.lock().await.auth.pre_unlock.clone()
    }

    pub async fn set_pre_unlock_settings(
        &self,
        settings: PreUnlockSettings,
    ) -> Result<(), VaultError> {
        let mut state = self.state.lock().await;
        state.auth.pre_unlock = settings;
        state.auth.save(&self.paths.auth())
    }

    pub async fn lockout_status(&self) -> LockoutStatus {
        let state = self.state.lock().await;
        let now = self.clock.epoch_ms();
        let remaining_ms = state
            .auth
            .lockout_until_ms
            .filter(|until| *until > now)
            .map(|until| until - now)
            .unwrap_or(0);
        LockoutStatus {
            locked_out: remaining_ms > 0,
            remaining_secs: remaining_ms.div_ceil(1000),
            failed_attempts: state.auth.failed_attempts,
        }
    }

    /// Resolve crash leftovers per the recovery matrix.
    ///
    /// With auth enabled an existing `.enc` is authoritative and stray
    /// plaintext (plus SQLite sidecars) is removed; with auth disabled
    /// the plaintext is authoritative and stale `.enc` files are removed.
    pub async fn recover_files(&self) -> Result<(), VaultError> {
        let state = self.state.lock().await;
        for (plain, enc) in self.paths.sensitive_pairs() {
            let has_plain = plain.exists();
            let has_enc = enc.exists();

            if state.auth.enabled {
                if has_enc && has_plain {
                    tracing::warn!(
                        file = %plain.display(),
                        "found plaintext next to encrypted copy, removing plaintext"
                    );
                    std::fs::remove_file(&plain)?;
                    self.remove_db_sidecars_for(&plain)?;
                }
            } else if has_enc {
                if has_plain {
                    tracing::warn!(
                        file = %enc.display(),
                        "auth disabled, removing stale encrypted copy"
                    );
                } else {
                    tracing::warn!(
                        file = %enc.display(),
                        "auth disabled but only an encrypted copy exists, discarding it"
                    );
                }
                std::fs::remove_file(&enc)?;
            }
        }
        Ok(())
    }

    /// Enable protection. The database stays open; files are encrypted on
    /// the next lock or shutdown.
    pub async fn setup(&self, password: &str) -> Result<(), VaultError> {
        let mut state = self.state.lock().await;
        if state.auth.enabled {
            return Err(VaultError::AlreadyEnabled);
        }

        let (encoded, key) = kdf::hash_password(password)?;
        state.auth.enabled = true;
        state.auth.password_hash = Some(encoded);
        state.auth.failed_attempts = 0;
        state.auth.lockout_until_ms = None;
        state.auth.save(&self.paths.auth())?;

        self.db.reopen()?;
        state.key = Some(key);
        tracing::info!("vault enabled");
        Ok(())
    }

    /// Verify the password, decrypt state, and open the database.
    pub async fn unlock(&self, password: &str) -> Result<(), VaultError> {
        // Decide the rate-limit delay under the mutex, sleep outside it
        let delay = {
            let state = self.state.lock().await;
            if !state.auth.enabled {
                return Err(VaultError::NotEnabled);
            }
            if state.key.is_some() {
                return Ok(());
            }
            self.check_lockout(&state.auth)?;
            delay_for_attempt(state.auth.failed_attempts + 1)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        // State may have moved while we slept
        if !state.auth.enabled {
            return Err(VaultError::NotEnabled);
        }
        if state.key.is_some() {
            return Ok(());
        }
        self.check_lockout(&state.auth)?;

        let encoded = state
            .auth
            .password_hash
            .clone()
            .ok_or(VaultError::NotEnabled)?;
        match kdf::verify_password(password, &encoded) {
            Ok(key) => {
                state.auth.failed_attempts = 0;
                state.auth.lockout_until_ms = None;
                state.auth.save(&self.paths.auth())?;

                self.decrypt_sensitive(&key)?;
                self.db.reopen()?;
                state.key = Some(key);
                tracing::info!("vault unlocked");
                Ok(())
            }
            Err(VaultError::WrongPassword) => {
                state.auth.failed_attempts += 1;
                if state.auth.failed_attempts >= LOCKOUT_AT_ATTEMPT {
                    let until = self.clock.epoch_ms() + LOCKOUT_SECS * 1000;
                    state.auth.lockout_until_ms = Some(until);
                    state.auth.failed_attempts = 0;
                    state.auth.save(&self.paths.auth())?;
                    tracing::warn!("vault locked out after repeated failures");
                    Err(VaultError::LockedOut {
                        remaining_secs: LOCKOUT_SECS,
                    })
                } else {
                    state.auth.save(&self.paths.auth())?;
                    Err(VaultError::WrongPassword)
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Close the database, encrypt state at rest, and wipe the key.
    pub async fn lock(&self) -> Result<(), VaultError> {
        let mut state = self.state.lock().await;
        if !state.auth.enabled {
            return Err(VaultError::NotEnabled);
        }
        let key = state.key.take().ok_or(VaultError::NotUnlocked)?;

        self.db.close()?;
        self.encrypt_sensitive(&key)?;
        // `key` drops here; Zeroizing wipes it
        tracing::info!("vault locked");
        Ok(())
    }

    /// Re-encrypt everything under a new password.
    ///
    /// On any failure past validation the vault degrades to the locked
    /// state so the user recovers by unlocking with the new password.
    pub async fn change_password(&self, old: &str, new: &str) -> Result<(), VaultError> {
        let mut state = self.state.lock().await;
        if !state.auth.enabled {
            return Err(VaultError::NotEnabled);
        }
        if state.key.is_none() {
            return Err(VaultError::NotUnlocked);
        }

        let encoded = state
            .auth
            .password_hash
            .clone()
            .ok_or(VaultError::NotEnabled)?;
        kdf::verify_password(old, &encoded)?;
        kdf::check_password_length(new)?;

        let result = self.rekey(&mut state, new);
        if result.is_err() {
            // Leave locked; plaintext may already be gone
            state.key = None;
        }
        result
    }

    fn rekey(&self, state: &mut State, new: &str) -> Result<(), VaultError> {
        let (encoded, new_key) = kdf::hash_password(new)?;

        self.db.close()?;
        self.encrypt_sensitive(&new_key)?;

        state.auth.password_hash = Some(encoded);
        state.auth.failed_attempts = 0;
        state.auth.lockout_until_ms = None;
        state.auth.save(&self.paths.auth())?;

        self.decrypt_sensitive(&new_key)?;
        self.db.reopen()?;
        state.key = Some(new_key);
        tracing::info!("vault password changed");
        Ok(())
    }

    /// Disable protection entirely.
    pub async fn remove(&self, password: &str) -> Result<(), VaultError> {
        let mut state = self.state.lock().await;
        if !state.auth.enabled {
            return Err(VaultError::NotEnabled);
        }

        let encoded = state
            .auth
            .password_hash
            .clone()
            .ok_or(VaultError::NotEnabled)?;
        let key = kdf::verify_password(password, &encoded)?;

        // If locked, restore plaintext before dropping the key forever
        if state.key.is_none() {
            self.decrypt_sensitive(&key)?;
        }
        self.db.reopen()?;

        let auth_path = self.paths.auth();
        if auth_path.exists() {
            std::fs::remove_file(&auth_path)?;
        }
        state.auth = AuthFile::default();
        state.key = None;
        tracing::info!("vault disabled");
        Ok(())
    }

    fn check_lockout(&self, auth: &AuthFile) -> Result<(), VaultError> {
        if let Some(until) = auth.lockout_until_ms {
            let now = self.clock.epoch_ms();
            if now < until {
                return Err(VaultError::LockedOut {
                    remaining_secs: (until - now).div_ceil(1000),
                });
            }
        }
        Ok(())
    }

    fn encrypt_sensitive(&self, key: &[u8; kdf::KEY_LEN]) -> Result<(), VaultError> {
        for sidecar in self.paths.db_sidecars() {
            if sidecar.exists() {
                std::fs::remove_file(&sidecar)?;
            }
        }
        for (plain, enc) in self.paths.sensitive_pairs() {
            if plain.exists() {
                crypt::encrypt_file(key, &plain, &enc)?;
                std::fs::remove_file(&plain)?;
            }
        }
        Ok(())
    }

    fn decrypt_sensitive(&self, key: &[u8; kdf::KEY_LEN]) -> Result<(), VaultError> {
        for (plain, enc) in self.paths.sensitive_pairs() {
            if enc.exists() {
                crypt::decrypt_file(key, &enc, &plain)?;
                std::fs::remove_file(&enc)?;
            }
        }
        Ok(())
    }

    fn remove_db_sidecars_for(&self, plain: &std::path::Path) -> Result<(), VaultError> {
        if *plain == self.paths.db() {
            for sidecar in self.paths.db_sidecars() {
                if sidecar.exists() {
                    std::fs::remove_file(&sidecar)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "vault_tests.rs"]
mod tests;
