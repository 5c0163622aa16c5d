// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Refract project configuration.
//!
//! Configuration is loaded from `refract.toml` at the project root.
//!
//! # Example Configuration
//!
//! ```toml
//! [project]
//! name = "storefront"
//!
//! [dev]
//! port = 5173
//! host = "127.0.0.1"
//!
//! [assets]
//! input = ["resources/js/app.jsx", "resources/css/app.css"]
//! refresh = true
//!
//! [toolchain]
//! enabled = ["esbuild", "tailwind"]
//! ```

use anyhow::Context as _;
use refract::urls::HmrOverrides;
use refract::PluginConfig;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::toolchain::ToolchainConfig;

/// Main configuration structure loaded from `refract.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Project metadata (name, version).
    #[serde(default)]
    pub project: ProjectConfig,
    /// Development asset server settings.
    #[serde(default)]
    pub dev: DevConfig,
    /// Asset pipeline configuration (entries, directories, refresh, TLS).
    #[serde(default)]
    pub assets: PluginConfig,
    /// Front-end toolchain configuration.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Project metadata configuration.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    #[serde(default = "ProjectConfig::unnamed")]
    pub name: String,
    /// Project version.
    #[serde(default = "ProjectConfig::zero_version")]
    pub version: String,
}

impl ProjectConfig {
    fn unnamed() -> String {
        "unnamed".to_string()
    }

    fn zero_version() -> String {
        "0.1.0".to_string()
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: Self::unnamed(),
            version: Self::zero_version(),
        }
    }
}

/// Development asset server configuration.
#[derive(Debug, Deserialize)]
pub struct DevConfig {
    /// Server port.
    #[serde(default = "DevConfig::default_port")]
    pub port: u16,
    /// Host the browser uses to reach the server. Unset means the bound
    /// address is advertised as-is.
    #[serde(default)]
    pub host: Option<String>,
    /// Explicit HMR channel overrides.
    #[serde(default)]
    pub hmr: HmrOverrides,
}

impl DevConfig {
    fn default_port() -> u16 {
        5173
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: Self::default_port(),
            host: None,
            hmr: HmrOverrides::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `refract.toml` in the current directory.
    ///
    /// A missing file is not an error; every section has defaults. Note that
    /// the default `[assets]` table has no entry points, so commands that
    /// resolve it will fail with an actionable message.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("refract.toml"))
    }

    /// Loads configuration from an explicit path, defaulting when absent.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        toml::from_str(&text).with_context(|| format!("could not parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract::DetectTls;

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [project]
            name = "my-app"

            [dev]
            port = 3100
            host = "myapp.test"

            [dev.hmr]
            client_port = 443

            [assets]
            input = ["resources/js/app.jsx", "resources/css/app.css"]
            refresh = true
            detect_tls = true

            [toolchain]
            enabled = ["esbuild", "tailwind"]
            esbuild_version = "0.25.0"
            "#,
        )
        .unwrap();

        assert_eq!(config.project.name, "my-app");
        assert_eq!(config.dev.port, 3100);
        assert_eq!(config.dev.host.as_deref(), Some("myapp.test"));
        assert_eq!(config.dev.hmr.client_port, Some(443));
        assert_eq!(config.toolchain.esbuild_version, "0.25.0");

        let assets = config.assets.resolve().unwrap();
        assert_eq!(assets.input.len(), 2);
        assert_eq!(assets.detect_tls, DetectTls::Enabled(true));
        assert_eq!(assets.refresh.len(), 1);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/refract.toml")).unwrap();
        assert_eq!(config.project.name, "unnamed");
        assert_eq!(config.dev.port, 5173);
        assert!(config.dev.host.is_none());
        // No entry points configured: resolving must fail loudly.
        assert!(config.assets.resolve().is_err());
    }
}
