// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! drift-vault: master-password-gated protection for state at rest
//!
//! Keeps the configuration database and the backend credentials file
//! encrypted while locked, with rate-limited unlock and a strict
//! key-zeroing discipline.

pub mod auth;
pub mod crypt;
pub mod envelope;
mod error;
pub mod kdf;
mod vault;

pub use auth::{AuthFile, PreUnlockSettings};
pub use error::VaultError;
pub use vault::{LockoutStatus, Vault, VaultPaths, VaultStatus};
