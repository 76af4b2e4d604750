// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn hash_then_verify_round_trip() {
    let (encoded, key) = hash_password("correct horse").unwrap();
    let verified = verify_password("correct horse", &encoded).unwrap();
    assert_eq!(*key, *verified);
}

#[test]
fn wrong_password_rejected() {
    let (encoded, _key) = hash_password("correct horse").unwrap();
    assert!(matches!(
        verify_password("battery staple", &encoded),
        Err(VaultError::WrongPassword)
    ));
}

#[test]
fn encoded_format_shape() {
    let (encoded, _key) = hash_password("hunter22").unwrap();
    let parts: Vec<&str> = encoded.split('$').collect();
    assert_eq!(parts.len(), 5);
    assert_eq!(parts[0], "argon2id");
    assert_eq!(parts[1], "v=19");
    assert_eq!(parts[2], "m=65536,t=3,p=4");

    let salt = STANDARD_NO_PAD.decode(parts[3]).unwrap();
    let tag = STANDARD_NO_PAD.decode(parts[4]).unwrap();
    assert_eq!(salt.len(), FILE_SALT_LEN);
    assert_eq!(tag.len(), KEY_LEN);
}

#[test]
fn key_is_not_derivable_from_encoded_hash() {
    let (encoded, key) = hash_password("hunter22").unwrap();
    let tag = STANDARD_NO_PAD
        .decode(encoded.split('$').next_back().unwrap())
        .unwrap();
    assert_ne!(&tag[..], &key[..]);
}

#[yare::parameterized(
    three_chars = { "abc" },
    empty       = { "" },
)]
fn too_short_rejected(password: &str) {
    assert!(matches!(
        hash_password(password),
        Err(VaultError::PasswordTooShort { min: 4 })
    ));
}

#[test]
fn four_chars_accepted() {
    assert!(hash_password("abcd").is_ok());
}

#[yare::parameterized(
    missing_fields = { "argon2id$v=19$m=1,t=1,p=1$c2FsdA" },
    wrong_alg      = { "scrypt$v=19$m=1,t=1,p=1$c2FsdA$c2FsdA" },
    wrong_version  = { "argon2id$v=18$m=1,t=1,p=1$c2FsdA$c2FsdA" },
    bad_param      = { "argon2id$v=19$m=1,t=1,q=1$c2FsdA$c2FsdA" },
    bad_b64        = { "argon2id$v=19$m=1,t=1,p=1$!!!$c2FsdA" },
)]
fn malformed_hash_rejected(encoded: &str) {
    assert!(matches!(
        verify_password("whatever", encoded),
        Err(VaultError::BadHash(_))
    ));
}

#[test]
fn salts_differ_between_hashes() {
    let (a, _) = hash_password("same password").unwrap();
    let (b, _) = hash_password("same password").unwrap();
    assert_ne!(a, b);
}

#[test]
fn export_key_uses_short_salt() {
    let salt = [7u8; EXPORT_SALT_LEN];
    let a = derive_export_key("pw", &salt).unwrap();
    let b = derive_export_key("pw", &salt).unwrap();
    assert_eq!(*a, *b);
}

#[test]
fn constant_time_eq_basics() {
    assert!(constant_time_eq(b"abc", b"abc"));
    assert!(!constant_time_eq(b"abc", b"abd"));
    assert!(!constant_time_eq(b"abc", b"ab"));
}
