// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use drift_fs::FakeFs;

#[tokio::test]
async fn wraps_both_sides_and_clears_passwords() {
    let fs = FakeFs::new();
    let mut profile = Profile::between("gdrive:/a", "dropbox:/b");
    profile.source_crypt_password = Some("src secret".to_string());
    profile.dest_crypt_password = Some("dst secret".to_string());

    let guard = wrap_endpoints(&fs, &mut profile).await.unwrap();

    assert!(profile.source_crypt_password.is_none());
    assert!(profile.dest_crypt_password.is_none());
    assert!(profile.source.starts_with(CRYPT_PREFIX));
    assert!(profile.source.ends_with(':'));
    assert!(profile.dest.starts_with(CRYPT_PREFIX));

    let names = fs.remote_names();
    assert_eq!(names.len(), 2);

    guard.cleanup().await;
    assert!(fs.remote_names().is_empty());
}

#[tokio::test]
async fn no_crypt_requested_is_a_no_op() {
    let fs = FakeFs::new();
    let mut profile = Profile::between("/a", "/b");
    let guard = wrap_endpoints(&fs, &mut profile).await.unwrap();

    assert_eq!(profile.source, "/a");
    assert!(fs.remote_names().is_empty());
    guard.cleanup().await;
}

#[tokio::test]
async fn sweep_removes_only_prefixed_remotes() {
    let fs = FakeFs::new();
    fs.add_config_remote("gdrive");
    fs.add_config_remote("drift-crypt-stale1");
    fs.add_config_remote("drift-crypt-stale2");

    let removed = sweep_orphans(&fs).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(fs.remote_names(), vec!["gdrive".to_string()]);
}
