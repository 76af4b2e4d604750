// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer profiles: the stored specification of a sync operation

use crate::size::parse_size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which side wins a bi-directional conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolve {
    #[default]
    Newer,
    Older,
    Larger,
    Smaller,
    Path1,
    Path2,
}

/// What happens to the losing side of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictLoser {
    /// Rename with a numeric suffix
    #[default]
    Num,
    Delete,
    /// Rename with the configured suffix
    Pathname,
}

/// When destination-side deletions happen during a one-way sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteTiming {
    Before,
    #[default]
    During,
    After,
}

/// Errors from validating a profile
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("source and destination are both empty")]
    BothEmpty,
    #[error("source and destination are identical: {0}")]
    SameEndpoints(String),
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero_u32(n: &u32) -> bool {
    *n == 0
}

/// A transfer specification.
///
/// Size-typed caps (`max_size`, `max_transfer`, ...) are stored as
/// `<number><unit>` strings and validated by [`Profile::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Source location: a local path or `<remote>:<subpath>`
    pub source: String,
    /// Destination location: a local path or `<remote>:<subpath>`
    pub dest: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_paths: Vec<String>,
    /// Treat include/exclude patterns as regexes instead of globs
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_regex: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<String>,
    /// Minimum age in seconds (younger entries are skipped)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,

    /// Bandwidth cap in MiB/s, 0 = unlimited
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub bandwidth: u32,
    /// Concurrent file transfers, 0 = backend default
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub parallel: u32,

    #[serde(default = "defaults::retries")]
    pub retries: u32,
    #[serde(default = "defaults::low_level_retries")]
    pub low_level_retries: u32,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub retries_sleep_secs: u32,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub connect_timeout_secs: u32,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub io_timeout_secs: u32,
    /// Transactions per second, 0 = unlimited
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub tps_limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub multi_thread_streams: u32,
    /// Transfer ordering key (e.g. `size,ascending`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,

    #[serde(default)]
    pub conflict_resolve: ConflictResolve,
    #[serde(default)]
    pub conflict_loser: ConflictLoser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_suffix: Option<String>,
    /// Max minutes a peer may hold the bi-sync reconciliation lock
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub max_lock_mins: u32,

    #[serde(default)]
    pub delete_timing: DeleteTiming,
    #[serde(default, skip_serializing_if = "is_false")]
    pub immutable: bool,

    /// Max number of deletes, 0 = unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delete: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delete_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_transfer: Option<String>,

    /// Backup-rename suffix for overwritten destination files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub suffix_keep_extension: bool,

    /// Wrap the source in an ephemeral crypt remote with this password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_crypt_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_crypt_password: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub dry_run: bool,
}

mod defaults {
    pub fn retries() -> u32 {
        3
    }
    pub fn low_level_retries() -> u32 {
        10
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            source: String::new(),
            dest: String::new(),
            included_paths: Vec::new(),
            excluded_paths: Vec::new(),
            use_regex: false,
            min_size: None,
            max_size: None,
            min_age_secs: None,
            max_age_secs: None,
            max_depth: None,
            bandwidth: 0,
            parallel: 0,
            retries: defaults::retries(),
            low_level_retries: defaults::low_level_retries(),
            retries_sleep_secs: 0,
            connect_timeout_secs: 0,
            io_timeout_secs: 0,
            tps_limit: 0,
            buffer_size: None,
            multi_thread_streams: 0,
            order_by: None,
            conflict_resolve: ConflictResolve::default(),
            conflict_loser: ConflictLoser::default(),
            conflict_suffix: None,
            max_lock_mins: 0,
            delete_timing: DeleteTiming::default(),
            immutable: false,
            max_delete: None,
            max_delete_size: None,
            max_transfer: None,
            suffix: None,
            suffix_keep_extension: false,
            source_crypt_password: None,
            dest_crypt_password: None,
            dry_run: false,
        }
    }
}

impl Profile {
    /// Minimal profile between two endpoints.
    pub fn between(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            ..Self::default()
        }
    }

    /// Validate the structural invariants of this profile.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.source.is_empty() && self.dest.is_empty() {
            return Err(ProfileError::BothEmpty);
        }
        if !self.source.is_empty() && self.source == self.dest {
            return Err(ProfileError::SameEndpoints(self.source.clone()));
        }

        for (field, value) in [
            ("min_size", &self.min_size),
            ("max_size", &self.max_size),
            ("buffer_size", &self.buffer_size),
            ("max_delete_size", &self.max_delete_size),
            ("max_transfer", &self.max_transfer),
        ] {
            if let Some(expr) = value {
                parse_size(expr).map_err(|e| ProfileError::InvalidField {
                    field,
                    reason: e.to_string(),
                })?;
            }
        }

        if let (Some(min), Some(max)) = (&self.min_size, &self.max_size) {
            // Both parse after the loop above
            let (min, max) = (
                parse_size(min).unwrap_or_default(),
                parse_size(max).unwrap_or(u64::MAX),
            );
            if min > max {
                return Err(ProfileError::InvalidField {
                    field: "min_size",
                    reason: "min_size exceeds max_size".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Whether either side asks for encryption wrapping.
    pub fn wants_crypt(&self) -> bool {
        self.source_crypt_password.is_some() || self.dest_crypt_password.is_some()
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
