// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AES-256-GCM sealing of files and buffers
//!
//! File layout: `[12-byte nonce][ciphertext ∥ GCM tag]`. The nonce is
//! freshly random per encryption; reuse under the same key is forbidden.

use crate::error::VaultError;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use std::path::Path;

pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

fn cipher(key: &[u8; 32]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
}

/// Seal a buffer under the key with a fresh random nonce.
pub fn encrypt_data(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher(key)
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| VaultError::Decrypt)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a sealed buffer.
///
/// Tamper and key mismatch both surface as the uniform
/// [`VaultError::Decrypt`] so callers cannot build an oracle.
pub fn decrypt_data(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>, VaultError> {
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::Decrypt);
    }
    let (nonce, ciphertext) = data.split_at(NONCE_LEN);
    cipher(key)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::Decrypt)
}

/// Encrypt `src` into `dst`, leaving `src` in place.
pub fn encrypt_file(key: &[u8; 32], src: &Path, dst: &Path) -> Result<(), VaultError> {
    let plaintext = std::fs::read(src)?;
    let sealed = encrypt_data(key, &plaintext)?;
    std::fs::write(dst, sealed)?;
    Ok(())
}

/// Decrypt `src` into `dst`, leaving `src` in place.
pub fn decrypt_file(key: &[u8; 32], src: &Path, dst: &Path) -> Result<(), VaultError> {
    let sealed = std::fs::read(src)?;
    let plaintext = decrypt_data(key, &sealed)?;
    std::fs::write(dst, plaintext)?;
    Ok(())
}

#[cfg(test)]
#[path = "crypt_tests.rs"]
mod tests;
