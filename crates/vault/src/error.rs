// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the vault

use thiserror::Error;

/// Errors that can occur in vault operations
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault is not enabled")]
    NotEnabled,
    #[error("vault is already enabled")]
    AlreadyEnabled,
    #[error("vault is locked")]
    NotUnlocked,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("wrong password")]
    WrongPassword,
    #[error("locked for {remaining_secs} s")]
    LockedOut { remaining_secs: u64 },
    /// Deliberately uniform for tamper and key mismatch (no oracle)
    #[error("wrong password or corrupted data")]
    Decrypt,
    #[error("malformed password hash: {0}")]
    BadHash(String),
    #[error("key derivation failed: {0}")]
    Kdf(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] drift_storage::StorageError),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed export envelope: {0}")]
    BadEnvelope(String),
}
