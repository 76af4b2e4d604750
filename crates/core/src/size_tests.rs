// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    bare_bytes   = { "512", 512 },
    explicit_b   = { "512B", 512 },
    kilo         = { "1K", 1024 },
    kib          = { "1KiB", 1024 },
    mega         = { "10M", 10 * 1024 * 1024 },
    mb           = { "10MB", 10 * 1024 * 1024 },
    giga         = { "2G", 2 * 1024 * 1024 * 1024 },
    tera         = { "1T", 1 << 40 },
    fractional   = { "1.5K", 1536 },
    lowercase    = { "4m", 4 * 1024 * 1024 },
    whitespace   = { " 8K ", 8192 },
    zero         = { "0", 0 },
)]
fn parses(input: &str, expected: u64) {
    assert_eq!(parse_size(input).unwrap(), expected);
}

#[yare::parameterized(
    empty        = { "" },
    only_unit    = { "M" },
    bad_unit     = { "10Q" },
    negative     = { "-1K" },
    word         = { "lots" },
    double_dot   = { "1.2.3M" },
)]
fn rejects(input: &str) {
    assert!(parse_size(input).is_err(), "{input:?} should not parse");
}

#[test]
fn empty_is_distinct_error() {
    assert_eq!(parse_size("   "), Err(SizeError::Empty));
}
