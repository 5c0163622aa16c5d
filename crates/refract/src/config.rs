// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Asset pipeline configuration.
//!
//! [`PluginConfig`] is the user-facing shape, normally deserialized from the
//! `[assets]` table of `refract.toml`. It is resolved into an immutable
//! [`ResolvedPluginConfig`] by [`PluginConfig::resolve`], which fills in
//! defaults and enforces the configuration invariants. Nothing downstream
//! reads the raw user shape.
//!
//! # Example Configuration
//!
//! ```toml
//! [assets]
//! input = ["resources/js/app.jsx", "resources/css/app.css"]
//! public_directory = "public"
//! build_directory = "build"
//! refresh = ["resources/views/**"]
//! detect_tls = false
//! ```

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{RefractError, Result};

/// Paths watched for full-page reloads when `refresh = true`.
pub const DEFAULT_REFRESH_PATHS: &[&str] = &["resources/views/**", "routes/**"];

/// One or several entry-point paths.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    /// A single entry point.
    One(String),
    /// Several entry points.
    Many(Vec<String>),
}

impl InputSpec {
    fn into_vec(self) -> Vec<String> {
        match self {
            InputSpec::One(path) => vec![path],
            InputSpec::Many(paths) => paths,
        }
    }
}

/// TLS detection mode for the certificate locator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DetectTls {
    /// `true` derives the host from the local TLS configuration;
    /// `false` skips detection entirely (plain HTTP).
    Enabled(bool),
    /// A literal host to look up certificates for.
    Host(String),
}

impl Default for DetectTls {
    fn default() -> Self {
        DetectTls::Enabled(false)
    }
}

impl DetectTls {
    /// Returns true unless detection is explicitly disabled.
    pub fn is_requested(&self) -> bool {
        !matches!(self, DetectTls::Enabled(false))
    }
}

/// A single reload-watcher rule: glob patterns plus an optional debounce.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefreshRule {
    /// Glob patterns, relative to the project root.
    pub paths: Vec<String>,
    /// Debounce window in milliseconds for this rule's watcher.
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

impl RefreshRule {
    /// Builds a rule over the given patterns with the default debounce.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            delay_ms: None,
        }
    }
}

/// The `refresh` option accepts a bool, a list of globs, or full rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RefreshSpec {
    /// `true` watches [`DEFAULT_REFRESH_PATHS`]; `false` watches nothing.
    Enabled(bool),
    /// Shorthand: a list of glob patterns forming one rule.
    Paths(Vec<String>),
    /// Full rule objects, one watcher instance each.
    Rules(Vec<RefreshRule>),
}

impl RefreshSpec {
    fn into_rules(self) -> Vec<RefreshRule> {
        match self {
            RefreshSpec::Enabled(false) => Vec::new(),
            RefreshSpec::Enabled(true) => vec![RefreshRule::new(DEFAULT_REFRESH_PATHS.iter().copied())],
            RefreshSpec::Paths(paths) => vec![RefreshRule::new(paths)],
            RefreshSpec::Rules(rules) => rules,
        }
    }
}

/// User-supplied asset pipeline configuration.
///
/// All fields are optional except `input`; missing values fall back to the
/// documented defaults during [`resolve`](PluginConfig::resolve).
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    /// Entry points, relative to the project root.
    #[serde(default)]
    pub input: Option<InputSpec>,

    /// Directory served as the web root (default: "public").
    #[serde(default = "default_public_directory")]
    pub public_directory: String,

    /// Build output directory inside the public directory (default: "build").
    #[serde(default = "default_build_directory")]
    pub build_directory: String,

    /// SSR entry points; fall back to `input` when unset.
    #[serde(default)]
    pub ssr: Option<InputSpec>,

    /// Output directory for SSR bundles (default: "ssr").
    #[serde(default = "default_ssr_output_directory")]
    pub ssr_output_directory: String,

    /// Full-page reload rules (default: no watching).
    #[serde(default)]
    pub refresh: Option<RefreshSpec>,

    /// Hot file location (default: `<public_directory>/hot`).
    #[serde(default)]
    pub hot_file: Option<PathBuf>,

    /// TLS detection mode (default: off).
    #[serde(default)]
    pub detect_tls: DetectTls,
}

fn default_public_directory() -> String {
    "public".to_string()
}

fn default_build_directory() -> String {
    "build".to_string()
}

fn default_ssr_output_directory() -> String {
    "ssr".to_string()
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            input: None,
            public_directory: default_public_directory(),
            build_directory: default_build_directory(),
            ssr: None,
            ssr_output_directory: default_ssr_output_directory(),
            refresh: None,
            hot_file: None,
            detect_tls: DetectTls::default(),
        }
    }
}

impl PluginConfig {
    /// Builds a config with the given entry points and all defaults.
    pub fn with_input<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: Some(InputSpec::Many(
                input.into_iter().map(Into::into).collect(),
            )),
            ..Self::default()
        }
    }

    /// Validates the configuration and resolves every default, returning a
    /// new immutable [`ResolvedPluginConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RefractError::ConfigurationError`] when `input` is missing
    /// or empty, or when `public_directory`/`build_directory` is empty or
    /// starts with a path separator.
    pub fn resolve(self) -> Result<ResolvedPluginConfig> {
        let input = match self.input {
            Some(spec) => spec.into_vec(),
            None => Vec::new(),
        };
        if input.is_empty() || input.iter().any(|entry| entry.trim().is_empty()) {
            return Err(RefractError::ConfigurationError(
                "`input` is required: list at least one entry point, e.g. \
                 input = [\"resources/js/app.jsx\"]"
                    .to_string(),
            ));
        }

        validate_directory("public_directory", &self.public_directory)?;
        validate_directory("build_directory", &self.build_directory)?;

        let ssr = match self.ssr {
            Some(spec) => spec.into_vec(),
            None => input.clone(),
        };

        let hot_file = self
            .hot_file
            .unwrap_or_else(|| PathBuf::from(&self.public_directory).join("hot"));

        let refresh = self.refresh.map(RefreshSpec::into_rules).unwrap_or_default();

        Ok(ResolvedPluginConfig {
            input,
            public_directory: self.public_directory,
            build_directory: self.build_directory,
            ssr,
            ssr_output_directory: self.ssr_output_directory,
            refresh,
            hot_file,
            detect_tls: self.detect_tls,
        })
    }
}

fn validate_directory(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RefractError::ConfigurationError(format!(
            "`{field}` must not be empty"
        )));
    }
    if value.starts_with('/') || value.starts_with('\\') {
        return Err(RefractError::ConfigurationError(format!(
            "`{field}` must be relative to the project root, got `{value}`"
        )));
    }
    Ok(())
}

/// Fully resolved, immutable asset pipeline configuration.
///
/// Produced by [`PluginConfig::resolve`]; every field is concrete.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPluginConfig {
    /// Entry points, relative to the project root. Never empty.
    pub input: Vec<String>,
    /// Web root directory.
    pub public_directory: String,
    /// Build output directory inside the web root.
    pub build_directory: String,
    /// SSR entry points (equal to `input` unless overridden).
    pub ssr: Vec<String>,
    /// Output directory for SSR bundles.
    pub ssr_output_directory: String,
    /// Normalized reload rules; empty when refresh is disabled.
    pub refresh: Vec<RefreshRule>,
    /// Hot file location.
    pub hot_file: PathBuf,
    /// TLS detection mode.
    pub detect_tls: DetectTls,
}

impl ResolvedPluginConfig {
    /// Build output directory on disk: `<public_directory>/<build_directory>`.
    pub fn build_path(&self) -> PathBuf {
        PathBuf::from(&self.public_directory).join(&self.build_directory)
    }

    /// Manifest location: `<public_directory>/<build_directory>/manifest.json`.
    pub fn manifest_path(&self) -> PathBuf {
        self.build_path().join("manifest.json")
    }
}
