// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Types shared across the toolchain module.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Build tools the CLI can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Bundles JavaScript and TypeScript entry points.
    Esbuild,
    /// Compiles utility-class CSS.
    Tailwind,
}

impl Tool {
    /// Lowercase name used in configuration, cache paths, and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Esbuild => "esbuild",
            Tool::Tailwind => "tailwind",
        }
    }

    /// Label shown in build output, cased the way the tool brands itself.
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Esbuild => "esbuild",
            Tool::Tailwind => "Tailwind",
        }
    }

    /// File name the downloaded artifact is stored under.
    ///
    /// esbuild ships as an npm tarball; the Tailwind artifact is the
    /// executable itself.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Tool::Esbuild => "esbuild.tar.gz",
            Tool::Tailwind => "tailwind",
        }
    }
}

impl std::str::FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_lowercase();
        match name.as_str() {
            "esbuild" | "typescript" | "ts" => Ok(Tool::Esbuild),
            "tailwind" | "tailwindcss" => Ok(Tool::Tailwind),
            _ => Err(format!("unknown tool '{}'", name)),
        }
    }
}

/// OS and architecture pair a prebuilt binary is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    LinuxX64,
    LinuxArm64,
    DarwinX64,
    DarwinArm64,
    WindowsX64,
}

impl Platform {
    /// Platform of the running process, when its binaries are published.
    pub fn current() -> Option<Self> {
        match (std::env::consts::OS, std::env::consts::ARCH) {
            ("linux", "x86_64") => Some(Platform::LinuxX64),
            ("linux", "aarch64") => Some(Platform::LinuxArm64),
            ("macos", "x86_64") => Some(Platform::DarwinX64),
            ("macos", "aarch64") => Some(Platform::DarwinArm64),
            ("windows", "x86_64") => Some(Platform::WindowsX64),
            _ => None,
        }
    }

    /// npm package carrying the esbuild binary for this platform.
    pub fn esbuild_package(&self) -> String {
        let (os, arch) = match self {
            Platform::LinuxX64 => ("linux", "x64"),
            Platform::LinuxArm64 => ("linux", "arm64"),
            Platform::DarwinX64 => ("darwin", "x64"),
            Platform::DarwinArm64 => ("darwin", "arm64"),
            Platform::WindowsX64 => ("win32", "x64"),
        };
        format!("@esbuild/{}-{}", os, arch)
    }

    /// File name of the Tailwind release binary for this platform.
    pub fn tailwind_asset(&self) -> &'static str {
        match self {
            Platform::LinuxX64 => "tailwindcss-linux-x64",
            Platform::LinuxArm64 => "tailwindcss-linux-arm64",
            Platform::DarwinX64 => "tailwindcss-macos-x64",
            Platform::DarwinArm64 => "tailwindcss-macos-arm64",
            Platform::WindowsX64 => "tailwindcss-windows-x64.exe",
        }
    }

    /// Path of the tool executable below its version directory.
    pub fn executable_rel(&self, tool: Tool) -> PathBuf {
        match tool {
            // stored under the tool name; the artifact is the executable
            Tool::Tailwind => PathBuf::from(tool.as_str()),
            Tool::Esbuild => match self {
                Platform::WindowsX64 => Path::new("package").join("esbuild.exe"),
                _ => Path::new("package/bin").join("esbuild"),
            },
        }
    }
}

/// The `[toolchain]` table of refract.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Tools to run. Accepts "esbuild"/"typescript"/"ts" and
    /// "tailwind"/"tailwindcss".
    #[serde(default = "ToolchainConfig::default_enabled")]
    pub enabled: Vec<String>,

    /// esbuild version, pinned or "latest".
    #[serde(default = "ToolchainConfig::latest")]
    pub esbuild_version: String,

    /// Tailwind version, pinned or "latest".
    #[serde(default = "ToolchainConfig::latest")]
    pub tailwind_version: String,

    /// Pinned sha256 of the esbuild download, verified when set
    #[serde(default)]
    pub esbuild_checksum: Option<String>,

    /// Pinned sha256 of the tailwind download, verified when set
    #[serde(default)]
    pub tailwind_checksum: Option<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            esbuild_version: Self::latest(),
            tailwind_version: Self::latest(),
            esbuild_checksum: None,
            tailwind_checksum: None,
        }
    }
}

impl ToolchainConfig {
    fn default_enabled() -> Vec<String> {
        vec!["esbuild".to_string()]
    }

    fn latest() -> String {
        "latest".to_string()
    }

    /// Parses the enabled list, ignoring names that match no tool.
    pub fn get_enabled_tools(&self) -> HashSet<Tool> {
        self.enabled
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect()
    }

    /// Configured version for the given tool.
    pub fn version_for(&self, tool: Tool) -> &str {
        match tool {
            Tool::Esbuild => &self.esbuild_version,
            Tool::Tailwind => &self.tailwind_version,
        }
    }

    /// Pinned checksum for the given tool, if any.
    pub fn checksum_for(&self, tool: Tool) -> Option<&str> {
        match tool {
            Tool::Esbuild => self.esbuild_checksum.as_deref(),
            Tool::Tailwind => self.tailwind_checksum.as_deref(),
        }
    }
}

/// Where one tool's build stands within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// A cached executable at a concrete version.
#[derive(Debug, Clone)]
pub struct ToolPath {
    pub tool: Tool,
    /// Resolved version, never "latest".
    pub version: String,
    pub path: PathBuf,
}

/// Errors from tool download, caching, and execution.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// No prebuilt binaries exist for the host.
    #[error("no prebuilt binaries for {0}")]
    UnsupportedPlatform(String),

    /// A download could not be completed.
    #[error("download failed: {0}")]
    DownloadFailed(String),

    /// A downloaded artifact did not match its pinned checksum
    #[error("checksum mismatch for {tool}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Tool whose download was rejected.
        tool: String,
        /// Pinned sha256 from the configuration.
        expected: String,
        /// sha256 of the bytes actually downloaded.
        actual: String,
    },

    /// A downloaded archive could not be unpacked.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// The npm registry or GitHub release lookup failed.
    #[error("release lookup failed: {0}")]
    ReleaseFetchFailed(String),

    /// A tool exited with failure or could not be spawned.
    #[error("tool run failed: {0}")]
    ExecutionFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ToolchainResult<T> = Result<T, ToolchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_aliases_parse() {
        assert_eq!("ts".parse::<Tool>(), Ok(Tool::Esbuild));
        assert_eq!("tailwindcss".parse::<Tool>(), Ok(Tool::Tailwind));
        assert!("webpack".parse::<Tool>().is_err());
    }

    #[test]
    fn platform_names_follow_upstream_conventions() {
        assert_eq!(Platform::DarwinArm64.esbuild_package(), "@esbuild/darwin-arm64");
        assert_eq!(Platform::WindowsX64.esbuild_package(), "@esbuild/win32-x64");
        assert_eq!(
            Platform::LinuxArm64.tailwind_asset(),
            "tailwindcss-linux-arm64"
        );
    }

    #[test]
    fn executables_resolve_below_the_version_directory() {
        assert_eq!(
            Platform::LinuxX64.executable_rel(Tool::Esbuild),
            PathBuf::from("package/bin/esbuild")
        );
        assert_eq!(
            Platform::WindowsX64.executable_rel(Tool::Esbuild),
            Path::new("package").join("esbuild.exe")
        );
        assert_eq!(
            Platform::LinuxX64.executable_rel(Tool::Tailwind),
            PathBuf::from("tailwind")
        );
    }
}
