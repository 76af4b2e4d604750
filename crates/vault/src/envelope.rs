// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Export envelope encryption
//!
//! Layout: `[magic "DEXP"][version][flags][16-byte salt][sections]`,
//! each section length-prefixed and independently sealed with
//! AES-256-GCM under an Argon2id key derived from the 16-byte salt.
//! The salt bytes are reserved (zero) for unencrypted exports.

use crate::crypt;
use crate::error::VaultError;
use crate::kdf::{self, EXPORT_SALT_LEN};
use rand::rngs::OsRng;
use rand::RngCore;

const MAGIC: &[u8; 4] = b"DEXP";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 1 + EXPORT_SALT_LEN;

/// Flag bit marking an encrypted export.
pub const FLAG_ENCRYPTED: u8 = 0b0000_0001;

fn bad(reason: &str) -> VaultError {
    VaultError::BadEnvelope(reason.to_string())
}

fn write_header(out: &mut Vec<u8>, flags: u8, salt: &[u8; EXPORT_SALT_LEN]) {
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.push(flags);
    out.extend_from_slice(salt);
}

fn push_section(out: &mut Vec<u8>, section: &[u8]) {
    out.extend_from_slice(&(section.len() as u32).to_be_bytes());
    out.extend_from_slice(section);
}

/// Seal sections under a password.
pub fn seal(password: &str, sections: &[Vec<u8>]) -> Result<Vec<u8>, VaultError> {
    kdf::check_password_length(password)?;

    let mut salt = [0u8; EXPORT_SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = kdf::derive_export_key(password, &salt)?;

    let mut out = Vec::new();
    write_header(&mut out, FLAG_ENCRYPTED, &salt);
    for section in sections {
        let sealed = crypt::encrypt_data(&key, section)?;
        push_section(&mut out, &sealed);
    }
    Ok(out)
}

/// Assemble an unencrypted export (salt bytes stay reserved).
pub fn seal_plain(sections: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    write_header(&mut out, 0, &[0u8; EXPORT_SALT_LEN]);
    for section in sections {
        push_section(&mut out, section);
    }
    out
}

/// Whether an export is marked encrypted.
pub fn is_encrypted(data: &[u8]) -> Result<bool, VaultError> {
    let (flags, _salt, _body) = parse_header(data)?;
    Ok(flags & FLAG_ENCRYPTED != 0)
}

/// Open an export. `password` is required iff the encrypted flag is set.
pub fn open(password: Option<&str>, data: &[u8]) -> Result<Vec<Vec<u8>>, VaultError> {
    let (flags, salt, mut body) = parse_header(data)?;
    let encrypted = flags & FLAG_ENCRYPTED != 0;

    let key = if encrypted {
        let password = password.ok_or(VaultError::WrongPassword)?;
        Some(kdf::derive_export_key(password, &salt)?)
    } else {
        None
    };

    let mut sections = Vec::new();
    while !body.is_empty() {
        if body.len() < 4 {
            return Err(bad("truncated section length"));
        }
        let len = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as usize;
        body = &body[4..];
        if body.len() < len {
            return Err(bad("truncated section"));
        }
        let (section, rest) = body.split_at(len);
        body = rest;

        match &key {
            Some(key) => sections.push(crypt::decrypt_data(key, section)?),
            None => sections.push(section.to_vec()),
        }
    }
    Ok(sections)
}

fn parse_header(data: &[u8]) -> Result<(u8, [u8; EXPORT_SALT_LEN], &[u8]), VaultError> {
    if data.len() < HEADER_LEN {
        return Err(bad("too short for header"));
    }
    if &data[..4] != MAGIC {
        return Err(bad("bad magic"));
    }
    if data[4] != VERSION {
        return Err(bad("unsupported version"));
    }
    let flags = data[5];
    let mut salt = [0u8; EXPORT_SALT_LEN];
    salt.copy_from_slice(&data[6..HEADER_LEN]);
    Ok((flags, salt, &data[HEADER_LEN..]))
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
