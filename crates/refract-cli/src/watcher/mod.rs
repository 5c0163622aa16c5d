// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File system watching for full-page reload rules.
//!
//! This module provides `RefreshWatcher` for monitoring the paths named by
//! the configured reload rules and triggering live reloads.
//!
//! # Features
//!
//! - One debounced watcher per rule, each with its own delay (750ms default)
//! - Glob matching against project-relative paths
//! - Watch roots derived from the glob prefixes, not the project root

use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use refract::RefreshRule;

/// Debounce window for rules without an explicit delay.
pub const DEFAULT_DEBOUNCE_MS: u64 = 750;

/// Watches the filesystem for changes matching the configured reload rules.
///
/// Uses debouncing to prevent multiple rapid reloads. Rules are independent:
/// each gets its own debouncer so a per-rule `delay_ms` never slows down the
/// others.
pub struct RefreshWatcher {
    // Dropping a debouncer stops its watching, so they all live here
    #[allow(dead_code)]
    watchers: Vec<Debouncer<RecommendedWatcher, RecommendedCache>>,
}

impl RefreshWatcher {
    /// Creates a watcher for the given rules.
    ///
    /// # Arguments
    ///
    /// * `rules` - Reload rules, each a set of globs with an optional delay
    /// * `base_path` - Project root the globs are relative to
    /// * `on_change` - Callback invoked with the matching relative paths
    pub fn new<F>(rules: Vec<RefreshRule>, base_path: PathBuf, on_change: F) -> anyhow::Result<Self>
    where
        F: Fn(Vec<PathBuf>) + Send + Sync + 'static,
    {
        let on_change = Arc::new(on_change);
        let mut watchers = Vec::new();

        for rule in rules {
            let globs = build_glob_set(&rule.paths)?;
            let delay = Duration::from_millis(rule.delay_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));

            let base = base_path.clone();
            let callback = on_change.clone();

            let mut debouncer =
                new_debouncer(delay, None, move |result: DebounceEventResult| {
                    match result {
                        Ok(events) => {
                            let changed: Vec<PathBuf> = events
                                .iter()
                                .flat_map(|e| e.paths.iter())
                                .filter_map(|p| p.strip_prefix(&base).ok())
                                .filter(|rel| globs.is_match(rel))
                                .map(Path::to_path_buf)
                                .collect();

                            if !changed.is_empty() {
                                callback(changed);
                            }
                        }
                        Err(errors) => {
                            for error in errors {
                                tracing::warn!("watch error: {}", error);
                            }
                        }
                    }
                })?;

            // Watch each glob's literal prefix rather than the project root,
            // so unrelated trees (target/, node_modules/, build output) never
            // generate events for this rule
            let roots: BTreeSet<PathBuf> = rule
                .paths
                .iter()
                .map(|pattern| base_path.join(glob_literal_prefix(pattern)))
                .collect();
            for root in roots {
                if root.exists() {
                    debouncer.watch(&root, RecursiveMode::Recursive)?;
                }
            }

            watchers.push(debouncer);
        }

        Ok(Self { watchers })
    }
}

fn build_glob_set(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// The leading path components of a glob before its first metacharacter.
fn glob_literal_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in Path::new(pattern).components() {
        match component {
            Component::CurDir => continue,
            Component::Normal(part) => {
                let text = part.to_string_lossy();
                if text.contains(['*', '?', '[', '{']) {
                    break;
                }
                prefix.push(part);
            }
            _ => break,
        }
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_prefix_stops_at_the_first_metacharacter() {
        assert_eq!(
            glob_literal_prefix("resources/views/**"),
            PathBuf::from("resources/views")
        );
        assert_eq!(
            glob_literal_prefix("routes/*.rs"),
            PathBuf::from("routes")
        );
        assert_eq!(
            glob_literal_prefix("resources/**/partials/*.html"),
            PathBuf::from("resources")
        );
        assert_eq!(glob_literal_prefix("**/*.css"), PathBuf::from(""));
        assert_eq!(
            glob_literal_prefix("./config/app.toml"),
            PathBuf::from("config/app.toml")
        );
    }

    #[test]
    fn rule_globs_match_relative_paths() {
        let globs = build_glob_set(&[
            "resources/views/**".to_string(),
            "routes/**".to_string(),
        ])
        .unwrap();

        assert!(globs.is_match("resources/views/home.html"));
        assert!(globs.is_match("resources/views/partials/nav.html"));
        assert!(globs.is_match("routes/web.rs"));
        assert!(!globs.is_match("resources/js/app.jsx"));
        assert!(!globs.is_match("public/build/manifest.json"));
    }

    #[test]
    fn hidden_directories_are_plain_components() {
        assert_eq!(
            glob_literal_prefix(".refract/dev/**"),
            PathBuf::from(".refract/dev")
        );
    }
}
