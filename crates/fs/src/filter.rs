// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filter compilation: include/exclude rules plus size/age/depth predicates
//!
//! Rules are ordered and first-match-wins, so an include installed ahead
//! of a trailing `**` exclude takes precedence. Patterns are globs by
//! default (`**` crosses directories, `*` does not) or raw regexes in
//! regex mode.

use drift_core::{parse_size, Profile};
use regex::Regex;
use thiserror::Error;

/// Errors from compiling filter rules
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid filter pattern {pattern:?}: {reason}")]
    BadPattern { pattern: String, reason: String },
    #[error("invalid filter bound: {0}")]
    BadBound(String),
}

/// Whether a rule admits or rejects matching paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Include,
    Exclude,
}

/// One uncompiled rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    pub kind: RuleKind,
    pub pattern: String,
}

impl FilterRule {
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Include,
            pattern: pattern.into(),
        }
    }

    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Exclude,
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Compiled {
    kind: RuleKind,
    regex: Regex,
}

/// A compiled filter context installed into a transfer context.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    rules: Vec<Compiled>,
    min_size: Option<u64>,
    max_size: Option<u64>,
    min_age_secs: Option<u64>,
    max_age_secs: Option<u64>,
    max_depth: Option<u32>,
}

impl Filter {
    /// Compile an ordered rule list.
    pub fn compile(rules: &[FilterRule], use_regex: bool) -> Result<Self, FilterError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let source = if use_regex {
                rule.pattern.clone()
            } else {
                glob_to_regex(&rule.pattern)
            };
            let regex = Regex::new(&source).map_err(|e| FilterError::BadPattern {
                pattern: rule.pattern.clone(),
                reason: e.to_string(),
            })?;
            compiled.push(Compiled {
                kind: rule.kind,
                regex,
            });
        }
        Ok(Self {
            rules: compiled,
            ..Self::default()
        })
    }

    /// Compile a profile's configured rules and predicates.
    ///
    /// When include rules are present a trailing `**` exclude is appended,
    /// so only included paths survive.
    pub fn from_profile(profile: &Profile) -> Result<Self, FilterError> {
        let mut rules: Vec<FilterRule> = profile
            .included_paths
            .iter()
            .map(FilterRule::include)
            .collect();
        rules.extend(profile.excluded_paths.iter().map(FilterRule::exclude));
        if !profile.included_paths.is_empty() {
            rules.push(FilterRule::exclude("**"));
        }

        let mut filter = Self::compile(&rules, profile.use_regex)?;
        filter.min_size = parse_bound(&profile.min_size)?;
        filter.max_size = parse_bound(&profile.max_size)?;
        filter.min_age_secs = profile.min_age_secs;
        filter.max_age_secs = profile.max_age_secs;
        filter.max_depth = profile.max_depth;
        Ok(filter)
    }

    /// Rule-only decision for a path. No rules, or no matching rule,
    /// admits the path.
    pub fn allows(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        for rule in &self.rules {
            if rule.regex.is_match(path) {
                return rule.kind == RuleKind::Include;
            }
        }
        true
    }

    /// Full decision including size, age, and depth predicates.
    ///
    /// `depth` is the number of path components; `age_secs` is seconds
    /// since the entry was last modified.
    pub fn allows_entry(&self, path: &str, size: u64, age_secs: u64, depth: u32) -> bool {
        if let Some(max_depth) = self.max_depth {
            if depth > max_depth {
                return false;
            }
        }
        if let Some(min) = self.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.max_size {
            if size > max {
                return false;
            }
        }
        if let Some(min) = self.min_age_secs {
            if age_secs < min {
                return false;
            }
        }
        if let Some(max) = self.max_age_secs {
            if age_secs > max {
                return false;
            }
        }
        self.allows(path)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

fn parse_bound(bound: &Option<String>) -> Result<Option<u64>, FilterError> {
    match bound {
        None => Ok(None),
        Some(expr) => parse_size(expr)
            .map(Some)
            .map_err(|e| FilterError::BadBound(e.to_string())),
    }
}

/// Translate one glob into an anchored regex.
///
/// A leading `/` anchors at the scope root; otherwise the pattern matches
/// at any depth. A trailing `/` is shorthand for the directory and its
/// contents.
fn glob_to_regex(glob: &str) -> String {
    let anchored = glob.starts_with('/');
    let mut body = glob.trim_start_matches('/').to_string();
    if body.ends_with('/') {
        body.push_str("**");
    }

    let mut re = String::from("^");
    if !anchored {
        re.push_str("(?:.*/)?");
    }

    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    re.push_str(".*");
                } else {
                    re.push_str("[^/]*");
                }
            }
            '?' => re.push_str("[^/]"),
            '[' => {
                re.push('[');
                if chars.peek() == Some(&'!') {
                    chars.next();
                    re.push('^');
                }
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                    if inner == '\\' {
                        re.push('\\');
                    }
                    re.push(inner);
                }
                re.push(']');
            }
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '{' | '}' | '\\' => {
                re.push('\\');
                re.push(c);
            }
            _ => re.push(c),
        }
    }

    re.push('$');
    re
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
