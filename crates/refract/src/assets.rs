// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Runtime asset resolution.
//!
//! [`AssetResolver`] turns logical asset names into URLs at render time. If
//! the hot file exists, a dev server is running and every asset resolves to
//! `<dev server url>/<name>`; otherwise the build manifest decides, and the
//! result is `/<build_directory>/<hashed file>`. Manifest lookups re-read
//! the file on every call and fail fast on unknown keys.

use std::path::{Path, PathBuf};

use crate::config::ResolvedPluginConfig;
use crate::error::Result;
use crate::hot::HotFile;
use crate::manifest::Manifest;

/// Extensions treated as stylesheets when rendering tags.
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "pcss", "styl"];

/// Resolves logical asset names against the hot file and the manifest.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    config: ResolvedPluginConfig,
    root: PathBuf,
    hot: HotFile,
}

impl AssetResolver {
    /// Creates a resolver rooted at the current working directory.
    pub fn new(config: ResolvedPluginConfig) -> Self {
        Self::with_root(".", config)
    }

    /// Creates a resolver rooted at `root` (the project directory).
    pub fn with_root(root: impl Into<PathBuf>, config: ResolvedPluginConfig) -> Self {
        let root = root.into();
        let hot = HotFile::new(root.join(&config.hot_file));
        Self { config, root, hot }
    }

    /// Whether a dev server is currently advertising itself.
    pub fn is_dev(&self) -> bool {
        self.hot.exists()
    }

    /// The dev-server base URL, when the hot file exists.
    pub fn dev_server_url(&self) -> Result<Option<String>> {
        if self.hot.exists() {
            Ok(Some(self.hot.read()?))
        } else {
            Ok(None)
        }
    }

    /// Resolves a logical asset name to a URL.
    ///
    /// Dev mode returns `<dev server url>/<name>` without further I/O; prod
    /// mode reads the manifest and returns `/<build_directory>/<file>`,
    /// failing with a
    /// [`MissingAssetError`](crate::RefractError::MissingAssetError) when the
    /// key is absent.
    pub fn url(&self, key: &str) -> Result<String> {
        if self.hot.exists() {
            let base = self.hot.read()?;
            return Ok(format!("{base}/{key}"));
        }

        let manifest = self.read_manifest()?;
        let entry = manifest.entry(key)?;
        Ok(format!("/{}/{}", self.config.build_directory, entry.file))
    }

    /// Renders the HTML tags for the given entry points.
    ///
    /// Dev mode emits the live-reload client once, then a module script (or
    /// stylesheet link) per entry against the dev server. Prod mode emits
    /// the hashed entry file plus a link per stylesheet the entry pulled in.
    pub fn tags(&self, keys: &[&str]) -> Result<String> {
        let mut html = String::new();

        if self.hot.exists() {
            let base = self.hot.read()?;
            html.push_str(&format!(
                "<script src=\"{base}/__refract/livereload.js\"></script>\n"
            ));
            for key in keys {
                if is_style_path(key) {
                    html.push_str(&format!(
                        "<link rel=\"stylesheet\" href=\"{base}/{key}\">\n"
                    ));
                } else {
                    html.push_str(&format!(
                        "<script type=\"module\" src=\"{base}/{key}\"></script>\n"
                    ));
                }
            }
            return Ok(html);
        }

        let manifest = self.read_manifest()?;
        let build = &self.config.build_directory;
        for key in keys {
            let entry = manifest.entry(key)?;
            for css in &entry.css {
                html.push_str(&format!(
                    "<link rel=\"stylesheet\" href=\"/{build}/{css}\">\n"
                ));
            }
            if is_style_path(&entry.file) {
                html.push_str(&format!(
                    "<link rel=\"stylesheet\" href=\"/{build}/{}\">\n",
                    entry.file
                ));
            } else {
                html.push_str(&format!(
                    "<script type=\"module\" src=\"/{build}/{}\"></script>\n",
                    entry.file
                ));
            }
        }
        Ok(html)
    }

    /// The current asset version: the manifest content hash in prod, `None`
    /// in dev or before any build has produced a manifest.
    pub fn version(&self) -> Result<Option<String>> {
        if self.hot.exists() {
            return Ok(None);
        }
        let path = self.manifest_path();
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(Manifest::read(path)?.version().to_string()))
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(self.config.manifest_path())
    }

    fn read_manifest(&self) -> Result<Manifest> {
        Manifest::read(self.manifest_path())
    }
}

fn is_style_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| STYLE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
