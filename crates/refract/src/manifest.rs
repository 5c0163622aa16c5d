// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Build manifest reading.
//!
//! The manifest maps logical asset keys (source-relative paths) to their
//! content-hashed build outputs. Lookups are fail-fast: a missing key is a
//! [`MissingAssetError`](crate::RefractError::MissingAssetError), never a
//! silent fallback. Every [`Manifest::read`] call re-reads the file; there
//! is deliberately no cross-call cache, trading a little throughput for
//! always-fresh data after rebuilds.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RefractError, Result};

/// One manifest entry: where a logical asset ended up after the build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Output path relative to the build directory.
    pub file: String,
    /// Source path the entry was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Whether this is a configured entry point.
    #[serde(default, rename = "isEntry", skip_serializing_if = "std::ops::Not::not")]
    pub is_entry: bool,
    /// Stylesheets emitted for this entry, relative to the build directory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css: Vec<String>,
}

/// A parsed build manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    entries: BTreeMap<String, ManifestEntry>,
    version: String,
}

impl Manifest {
    /// Reads and parses the manifest at `path`.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let raw = fs::read(&path)?;
        let entries: BTreeMap<String, ManifestEntry> = serde_json::from_slice(&raw)?;
        let version = format!("{:x}", Sha256::digest(&raw));
        Ok(Self {
            path,
            entries,
            version,
        })
    }

    /// The file this manifest was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up a logical asset key, failing fast when it is absent.
    pub fn entry(&self, key: &str) -> Result<&ManifestEntry> {
        self.entries.get(key).ok_or_else(|| RefractError::MissingAssetError {
            key: key.to_string(),
            manifest: self.path.clone(),
        })
    }

    /// Looks up a logical asset key without failing.
    pub fn get(&self, key: &str) -> Option<&ManifestEntry> {
        self.entries.get(key)
    }

    /// Iterates all entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Content hash of the manifest file, used as the Inertia asset version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "resources/js/app.jsx": {
            "file": "assets/app-4f3b2a1c.js",
            "src": "resources/js/app.jsx",
            "isEntry": true,
            "css": ["assets/app-9d8e7f6a.css"]
        },
        "resources/css/app.css": {
            "file": "assets/app-9d8e7f6a.css",
            "src": "resources/css/app.css"
        }
    }"#;

    fn write_manifest(tmp: &TempDir) -> PathBuf {
        let path = tmp.path().join("manifest.json");
        fs::write(&path, MANIFEST).unwrap();
        path
    }

    #[test]
    fn reads_entries_and_metadata() {
        let tmp = TempDir::new().unwrap();
        let manifest = Manifest::read(write_manifest(&tmp)).unwrap();

        assert_eq!(manifest.len(), 2);
        let entry = manifest.entry("resources/js/app.jsx").unwrap();
        assert_eq!(entry.file, "assets/app-4f3b2a1c.js");
        assert!(entry.is_entry);
        assert_eq!(entry.css, vec!["assets/app-9d8e7f6a.css"]);

        let css = manifest.entry("resources/css/app.css").unwrap();
        assert!(!css.is_entry);
        assert!(css.css.is_empty());
    }

    #[test]
    fn absent_key_fails_naming_the_key() {
        let tmp = TempDir::new().unwrap();
        let manifest = Manifest::read(write_manifest(&tmp)).unwrap();

        let err = manifest.entry("resources/js/missing.js").unwrap_err();
        assert!(matches!(err, RefractError::MissingAssetError { .. }));
        assert!(err.to_string().contains("resources/js/missing.js"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Manifest::read("/nonexistent/manifest.json").unwrap_err();
        assert!(matches!(err, RefractError::IoError(_)));
    }

    #[test]
    fn malformed_manifest_is_a_json_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("manifest.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Manifest::read(&path).unwrap_err(),
            RefractError::JsonError(_)
        ));
    }

    #[test]
    fn version_tracks_file_content() {
        let tmp = TempDir::new().unwrap();
        let path = write_manifest(&tmp);
        let first = Manifest::read(&path).unwrap().version().to_string();

        fs::write(&path, r#"{"a": {"file": "assets/a-11111111.js"}}"#).unwrap();
        let second = Manifest::read(&path).unwrap().version().to_string();

        assert_ne!(first, second);
        assert_eq!(first.len(), 64);
    }
}
