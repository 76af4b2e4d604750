// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    info_line    = { "2026/01/15 10:30:00 INFO  : notes.md: Copied (new)", Some("notes.md: Copied (new)") },
    error_line   = { "2026/01/15 10:30:00 ERROR : x.bin: failed to copy", Some("x.bin: failed to copy") },
    no_level     = { "2026/01/15 10:30:00 : plain message", Some("plain message") },
    bare_message = { "already stripped", Some("already stripped") },
    stats_block  = { "2026/01/15 10:30:00 INFO  : Transferred:   512 B / 1 KiB, 50%", None },
    checks_line  = { "Checks:                 3 / 3, 100%", None },
    elapsed      = { "Elapsed time:        1.5s", None },
    in_flight    = { " *  big.bin:  10% /1G, 2M/s, 8m", None },
    internal     = { "event-bus: delivered seq=9", None },
    empty        = { "", None },
)]
fn process(line: &str, expected: Option<&str>) {
    assert_eq!(process_line(line).as_deref(), expected);
}

#[test]
fn batch_keeps_last_fifty() {
    let lines: Vec<String> = (0..120).map(|i| format!("message {i}")).collect();
    let out = process_batch(lines);
    assert_eq!(out.len(), MAX_LOG_TAIL);
    assert_eq!(out[0], "message 70");
    assert_eq!(out[49], "message 119");
}

#[test]
fn batch_filters_before_bounding() {
    let lines = vec![
        "keep one".to_string(),
        "Transferred:   0 B".to_string(),
        "keep two".to_string(),
    ];
    assert_eq!(
        process_batch(lines),
        vec!["keep one".to_string(), "keep two".to_string()]
    );
}
