// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::filter::{Filter, FilterRule};
use drift_core::Profile;

fn ctx() -> TransferContext {
    TransferContext::for_profile(
        &Profile::between("/a", "/b"),
        Filter::default(),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn resolve_reports_change_notify_feature() {
    let fs = FakeFs::new();
    fs.enable_change_notify("gdrive");

    let gdrive = fs.resolve("gdrive:/photos").await.unwrap();
    assert!(gdrive.features.change_notify);
    assert_eq!(gdrive.provider, "gdrive");

    let local = fs.resolve("/home/me").await.unwrap();
    assert!(!local.features.change_notify);
    assert_eq!(local.key.as_str(), "local:/home/me");
}

#[tokio::test]
async fn sync_copies_and_mirrors() {
    let fs = FakeFs::new();
    fs.set_files("local:/a", &[("x.txt", 10), ("y.txt", 20)]);
    fs.set_files("gdrive:/a", &[("stale.txt", 5)]);

    let src = fs.resolve("local:/a").await.unwrap();
    let dst = fs.resolve("gdrive:/a").await.unwrap();
    let ctx = ctx();
    fs.sync(&ctx, &src, &dst, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(
        fs.files_at("gdrive:/a"),
        vec!["x.txt".to_string(), "y.txt".to_string()]
    );
    let snap = ctx.stats.snapshot();
    assert_eq!(snap.transfers, 2);
    assert_eq!(snap.bytes, 30);
    assert_eq!(snap.deletes, 1);
}

#[tokio::test]
async fn dry_run_observes_but_does_not_mutate() {
    let fs = FakeFs::new();
    fs.set_files("local:/a", &[("x.txt", 10)]);

    let src = fs.resolve("local:/a").await.unwrap();
    let dst = fs.resolve("gdrive:/a").await.unwrap();
    let mut profile = Profile::between("local:/a", "gdrive:/a");
    profile.dry_run = true;
    let ctx = TransferContext::for_profile(&profile, Filter::default(), CancellationToken::new());

    fs.sync(&ctx, &src, &dst, &SyncOptions::default())
        .await
        .unwrap();

    assert!(fs.files_at("gdrive:/a").is_empty());
    assert_eq!(ctx.stats.snapshot().total_transfers, 1);
}

#[tokio::test]
async fn filter_scopes_transfer() {
    let fs = FakeFs::new();
    fs.set_files("local:/a", &[("notes.md", 1), ("other.md", 1)]);

    let src = fs.resolve("local:/a").await.unwrap();
    let dst = fs.resolve("gdrive:/a").await.unwrap();
    let filter = Filter::compile(
        &[FilterRule::include("/notes.md"), FilterRule::exclude("**")],
        false,
    )
    .unwrap();
    let ctx = TransferContext::for_profile(
        &Profile::between("local:/a", "gdrive:/a"),
        filter,
        CancellationToken::new(),
    );

    fs.sync(&ctx, &src, &dst, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(fs.files_at("gdrive:/a"), vec!["notes.md".to_string()]);
}

#[tokio::test]
async fn scripted_error_counts_against_stats() {
    let fs = FakeFs::new();
    fs.push_sync_error(FsError::Transient("flaky".to_string()));

    let src = fs.resolve("/a").await.unwrap();
    let dst = fs.resolve("/b").await.unwrap();
    let ctx = ctx();
    let err = fs
        .sync(&ctx, &src, &dst, &SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(ctx.stats.errors(), 1);
}

#[tokio::test]
async fn cancelled_context_aborts_delayed_op() {
    let fs = FakeFs::new();
    fs.set_op_delay(Duration::from_secs(30));

    let src = fs.resolve("/a").await.unwrap();
    let dst = fs.resolve("/b").await.unwrap();
    let ctx = ctx();
    ctx.cancel.cancel();

    let err = fs
        .sync(&ctx, &src, &dst, &SyncOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::Cancelled));
}

#[tokio::test]
async fn change_notify_registers_watcher_until_cancelled() {
    let fs = FakeFs::new();
    fs.enable_change_notify("gdrive");
    let remote = fs.resolve("gdrive:/a").await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ChangeCallback = Arc::new(move |path, _entry| sink.lock().push(path));

    let (poll_tx, poll_rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    fs.change_notify(&remote, callback, poll_rx, cancel.clone())
        .await
        .unwrap();
    poll_tx.send(Duration::from_secs(60)).await.unwrap();

    assert!(fs.watcher_active(&remote.key));
    assert!(fs.emit_change(&remote.key, "x.txt", EntryKind::Object));
    assert_eq!(seen.lock().clone(), vec!["x.txt".to_string()]);

    cancel.cancel();
    // Give the watcher loop a tick to unregister
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!fs.watcher_active(&remote.key));
    assert_eq!(fs.poll_intervals(), vec![Duration::from_secs(60)]);
}

#[tokio::test]
async fn change_notify_requires_feature() {
    let fs = FakeFs::new();
    let remote = fs.resolve("s3:/bucket").await.unwrap();
    let callback: ChangeCallback = Arc::new(|_, _| {});
    let (_poll_tx, poll_rx) = mpsc::channel(1);

    let err = fs
        .change_notify(&remote, callback, poll_rx, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::Unsupported(_)));
}

#[tokio::test]
async fn config_remote_lifecycle() {
    let fs = FakeFs::new();
    fs.create_remote("drift-crypt-abc", RemoteParams::new())
        .await
        .unwrap();
    assert_eq!(
        fs.list_remotes().await.unwrap(),
        vec!["drift-crypt-abc".to_string()]
    );

    fs.delete_remote("drift-crypt-abc").await.unwrap();
    // Idempotent
    fs.delete_remote("drift-crypt-abc").await.unwrap();
    assert!(fs.list_remotes().await.unwrap().is_empty());
}
