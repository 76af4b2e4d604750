// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    pull      = { ActionKind::Pull, true },
    push      = { ActionKind::Push, true },
    bi        = { ActionKind::Bi, true },
    bi_resync = { ActionKind::BiResync, true },
    copy      = { ActionKind::Copy, true },
    move_     = { ActionKind::Move, true },
    check     = { ActionKind::Check, false },
    dry_run   = { ActionKind::DryRun, false },
)]
fn mutating(action: ActionKind, expected: bool) {
    assert_eq!(action.is_mutating(), expected);
}

#[test]
fn bidirectional_kinds() {
    assert!(ActionKind::Bi.is_bidirectional());
    assert!(ActionKind::BiResync.is_bidirectional());
    assert!(!ActionKind::Push.is_bidirectional());
}

#[test]
fn serde_round_trip_uses_snake_case() {
    let json = serde_json::to_string(&ActionKind::BiResync).unwrap();
    assert_eq!(json, "\"bi_resync\"");
    let back: ActionKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ActionKind::BiResync);
}
