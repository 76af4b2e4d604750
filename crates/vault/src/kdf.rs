// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argon2id key derivation and the encoded password hash format
//!
//! One derivation produces 64 bytes: the first half is the stored
//! verification tag, the second half is the in-memory encryption key.
//! The key half never touches disk, so `auth.json` cannot be used to
//! decrypt anything.

use crate::error::VaultError;
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

pub const MEMORY_KIB: u32 = 64 * 1024;
pub const ITERATIONS: u32 = 3;
pub const PARALLELISM: u32 = 4;
pub const KEY_LEN: usize = 32;
/// Salt length for on-file credentials
pub const FILE_SALT_LEN: usize = 32;
/// Salt length for export envelopes (fits the header's reserved bytes)
pub const EXPORT_SALT_LEN: usize = 16;
pub const MIN_PASSWORD_LEN: usize = 4;

/// Derived material: stored verification tag + in-memory encryption key.
pub struct DerivedKey {
    pub tag: [u8; KEY_LEN],
    pub key: Zeroizing<[u8; KEY_LEN]>,
}

fn argon2(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Argon2<'static>, VaultError> {
    let params = Params::new(memory_kib, iterations, parallelism, Some(KEY_LEN * 2))
        .map_err(|e| VaultError::Kdf(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn derive_with(
    password: &str,
    salt: &[u8],
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
) -> Result<DerivedKey, VaultError> {
    let mut out = Zeroizing::new([0u8; KEY_LEN * 2]);
    argon2(memory_kib, iterations, parallelism)?
        .hash_password_into(password.as_bytes(), salt, &mut *out)
        .map_err(|e| VaultError::Kdf(e.to_string()))?;

    let mut tag = [0u8; KEY_LEN];
    tag.copy_from_slice(&out[..KEY_LEN]);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&out[KEY_LEN..]);
    Ok(DerivedKey { tag, key })
}

/// Derive with the default parameters and a caller-provided salt.
pub fn derive(password: &str, salt: &[u8]) -> Result<DerivedKey, VaultError> {
    derive_with(password, salt, MEMORY_KIB, ITERATIONS, PARALLELISM)
}

/// Derive just an encryption key for the export envelope (16-byte salt).
pub fn derive_export_key(
    password: &str,
    salt: &[u8; EXPORT_SALT_LEN],
) -> Result<Zeroizing<[u8; KEY_LEN]>, VaultError> {
    Ok(derive(password, salt)?.key)
}

/// Validate the minimum password length.
pub fn check_password_length(password: &str) -> Result<(), VaultError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(VaultError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Hash a password for storage, returning the encoded hash and the
/// encryption key.
///
/// Encoded format:
/// `argon2id$v=19$m=<mem>,t=<iter>,p=<par>$<salt-b64>$<hash-b64>`
pub fn hash_password(password: &str) -> Result<(String, Zeroizing<[u8; KEY_LEN]>), VaultError> {
    check_password_length(password)?;

    let mut salt = [0u8; FILE_SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let derived = derive(password, &salt)?;

    let encoded = format!(
        "argon2id$v=19$m={MEMORY_KIB},t={ITERATIONS},p={PARALLELISM}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(derived.tag),
    );
    Ok((encoded, derived.key))
}

/// Verify a password against an encoded hash.
///
/// On success returns the encryption key derived from the same password.
pub fn verify_password(
    password: &str,
    encoded: &str,
) -> Result<Zeroizing<[u8; KEY_LEN]>, VaultError> {
    let parsed = parse_encoded(encoded)?;
    let derived = derive_with(
        password,
        &parsed.salt,
        parsed.memory_kib,
        parsed.iterations,
        parsed.parallelism,
    )?;

    if !constant_time_eq(&derived.tag, &parsed.tag) {
        return Err(VaultError::WrongPassword);
    }
    Ok(derived.key)
}

struct ParsedHash {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    salt: Vec<u8>,
    tag: Vec<u8>,
}

fn parse_encoded(encoded: &str) -> Result<ParsedHash, VaultError> {
    let bad = |reason: &str| VaultError::BadHash(reason.to_string());

    let parts: Vec<&str> = encoded.split('$').collect();
    let [alg, version, params, salt, tag] = parts.as_slice() else {
        return Err(bad("expected 5 '$'-separated fields"));
    };
    if *alg != "argon2id" {
        return Err(bad("unsupported algorithm"));
    }
    if *version != "v=19" {
        return Err(bad("unsupported version"));
    }

    let mut memory_kib = None;
    let mut iterations = None;
    let mut parallelism = None;
    for kv in params.split(',') {
        let (k, v) = kv.split_once('=').ok_or_else(|| bad("malformed params"))?;
        let v: u32 = v.parse().map_err(|_| bad("non-numeric param"))?;
        match k {
            "m" => memory_kib = Some(v),
            "t" => iterations = Some(v),
            "p" => parallelism = Some(v),
            _ => return Err(bad("unknown param")),
        }
    }

    Ok(ParsedHash {
        memory_kib: memory_kib.ok_or_else(|| bad("missing m"))?,
        iterations: iterations.ok_or_else(|| bad("missing t"))?,
        parallelism: parallelism.ok_or_else(|| bad("missing p"))?,
        salt: STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| bad("invalid salt encoding"))?,
        tag: STANDARD_NO_PAD
            .decode(tag)
            .map_err(|_| bad("invalid hash encoding"))?,
    })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
#[path = "kdf_tests.rs"]
mod tests;
