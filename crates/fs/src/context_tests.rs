// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use drift_core::Profile;

#[test]
fn checkers_scale_with_parallel() {
    let mut profile = Profile::between("/a", "/b");
    profile.parallel = 4;
    let ctx = TransferContext::for_profile(&profile, Filter::default(), CancellationToken::new());
    assert_eq!(ctx.transfers, 4);
    assert_eq!(ctx.checkers, 8);
}

#[test]
fn zero_parallel_leaves_backend_defaults() {
    let profile = Profile::between("/a", "/b");
    let ctx = TransferContext::for_profile(&profile, Filter::default(), CancellationToken::new());
    assert_eq!(ctx.transfers, 0);
    assert_eq!(ctx.checkers, 0);
}

#[test]
fn bandwidth_is_mebibytes_per_second() {
    let mut profile = Profile::between("/a", "/b");
    profile.bandwidth = 3;
    let ctx = TransferContext::for_profile(&profile, Filter::default(), CancellationToken::new());
    assert_eq!(ctx.bandwidth, 3 * 1024 * 1024);
}

#[test]
fn size_caps_parse() {
    let mut profile = Profile::between("/a", "/b");
    profile.max_transfer = Some("1M".to_string());
    profile.buffer_size = Some("16K".to_string());
    let ctx = TransferContext::for_profile(&profile, Filter::default(), CancellationToken::new());
    assert_eq!(ctx.max_transfer, 1024 * 1024);
    assert_eq!(ctx.buffer_size, 16 * 1024);
    assert_eq!(ctx.max_delete, 0);
}

#[test]
fn cancel_token_observes_scope() {
    let profile = Profile::between("/a", "/b");
    let cancel = CancellationToken::new();
    let ctx = TransferContext::for_profile(&profile, Filter::default(), cancel.clone());
    assert!(!ctx.is_cancelled());
    cancel.cancel();
    assert!(ctx.is_cancelled());
}
