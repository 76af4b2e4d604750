// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The plaintext `auth.json` record

use crate::error::VaultError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Preferences needed before the database is available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreUnlockSettings {
    #[serde(default)]
    pub minimize_to_tray: bool,
    #[serde(default)]
    pub start_at_login: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// On-disk vault state. Always plaintext, even while locked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFile {
    pub enabled: bool,
    /// Encoded Argon2id hash (see `kdf`), present iff enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub failed_attempts: u32,
    /// Epoch ms until which unlock attempts are refused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockout_until_ms: Option<u64>,
    #[serde(default)]
    pub pre_unlock: PreUnlockSettings,
}

impl AuthFile {
    /// Load from disk; a missing file is the disabled default.
    pub fn load(path: &Path) -> Result<Self, VaultError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), VaultError> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
