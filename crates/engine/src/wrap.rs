// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ephemeral crypt remotes wrapping encrypted endpoints
//!
//! When a profile asks for source- or destination-side encryption, the
//! engine creates short-lived crypt remotes around the real endpoints,
//! rewrites the locations, and clears the cleartext passwords from the
//! in-memory profile before the transfer begins.

use drift_core::Profile;
use drift_fs::{FsAdapter, FsError, RemoteParams};

/// Well-known name prefix for ephemeral crypt remotes. The startup
/// orphan sweep removes anything carrying it.
pub const CRYPT_PREFIX: &str = "drift-crypt-";

/// Removes the ephemeral remotes on every exit path.
pub(crate) struct CryptGuard<F: FsAdapter> {
    fs: F,
    names: Vec<String>,
}

impl<F: FsAdapter> CryptGuard<F> {
    /// Delete the wrapped remotes. Failures are logged, not propagated;
    /// the startup sweep catches anything left behind.
    pub(crate) async fn cleanup(self) {
        for name in self.names {
            if let Err(e) = self.fs.delete_remote(&name).await {
                tracing::warn!(remote = %name, error = %e, "failed to remove crypt remote");
            }
        }
    }
}

fn crypt_params<F: FsAdapter>(fs: &F, target: &str, password: &str) -> RemoteParams {
    let mut params = RemoteParams::new();
    params.insert("type".to_string(), "crypt".to_string());
    params.insert("remote".to_string(), target.to_string());
    params.insert("password".to_string(), fs.obscure(password));
    params
}

/// Wrap the profile's endpoints in crypt remotes where requested.
///
/// Takes the passwords out of the profile (clearing the cleartext) and
/// rewrites `source`/`dest` to point at the wrappers.
pub(crate) async fn wrap_endpoints<F: FsAdapter>(
    fs: &F,
    profile: &mut Profile,
) -> Result<CryptGuard<F>, FsError> {
    let mut names = Vec::new();

    if let Some(password) = profile.source_crypt_password.take() {
        let name = format!("{CRYPT_PREFIX}{}", uuid::Uuid::new_v4().simple());
        fs.create_remote(&name, crypt_params(fs, &profile.source, &password))
            .await?;
        tracing::debug!(remote = %name, "wrapped source in crypt remote");
        profile.source = format!("{name}:");
        names.push(name);
    }

    if let Some(password) = profile.dest_crypt_password.take() {
        let name = format!("{CRYPT_PREFIX}{}", uuid::Uuid::new_v4().simple());
        let result = fs
            .create_remote(&name, crypt_params(fs, &profile.dest, &password))
            .await;
        if let Err(e) = result {
            // Unwind the source wrapper before surfacing the error
            CryptGuard {
                fs: fs.clone(),
                names,
            }
            .cleanup()
            .await;
            return Err(e);
        }
        tracing::debug!(remote = %name, "wrapped destination in crypt remote");
        profile.dest = format!("{name}:");
        names.push(name);
    }

    Ok(CryptGuard {
        fs: fs.clone(),
        names,
    })
}

/// Remove crypt remotes left over from a crash.
pub(crate) async fn sweep_orphans<F: FsAdapter>(fs: &F) -> Result<u32, FsError> {
    let mut removed = 0;
    for name in fs.list_remotes().await? {
        if name.starts_with(CRYPT_PREFIX) {
            fs.delete_remote(&name).await?;
            tracing::info!(remote = %name, "removed orphaned crypt remote");
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
#[path = "wrap_tests.rs"]
mod tests;
