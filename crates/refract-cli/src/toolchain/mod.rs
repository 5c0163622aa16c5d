// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Managed build tools.
//!
//! refract downloads esbuild and Tailwind on demand instead of requiring a
//! Node toolchain on the machine. Binaries land in a per-user cache keyed by
//! tool and version, and a `latest` symlink tracks the newest download.

pub mod build;
pub mod output;
pub mod types;

mod download;

use console::style;
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::{fs, io};

pub use self::types::{Platform, Tool, ToolPath, ToolchainConfig, ToolchainError, ToolchainResult};

/// Downloads that already failed during this process.
///
/// Watch-mode rebuild loops come back through tool preparation; a download
/// that failed once must not hammer the network again in the same run.
pub(crate) struct FailureLog(Mutex<Vec<String>>);

impl FailureLog {
    const fn empty() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    fn key(tool: Tool, version: &str) -> String {
        format!("{}@{}", tool.as_str(), version)
    }

    pub(crate) fn record(&self, tool: Tool, version: &str) {
        self.0.lock().unwrap().push(Self::key(tool, version));
    }

    fn contains(&self, tool: Tool, version: &str) -> bool {
        self.0.lock().unwrap().contains(&Self::key(tool, version))
    }
}

pub(crate) static FAILED_DOWNLOADS: FailureLog = FailureLog::empty();

fn host_platform() -> ToolchainResult<Platform> {
    Platform::current().ok_or_else(|| {
        ToolchainError::UnsupportedPlatform(format!(
            "{}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ))
    })
}

/// Owns the on-disk tool cache.
pub struct ToolchainManager {
    cache_dir: PathBuf,
}

impl ToolchainManager {
    /// Opens the cache, creating the directory on first use.
    pub fn new() -> ToolchainResult<Self> {
        let cache_dir = Self::cache_root()?;
        fs::create_dir_all(&cache_dir)?;

        Ok(Self { cache_dir })
    }

    /// Platform cache directory for tool binaries.
    fn cache_root() -> ToolchainResult<PathBuf> {
        ProjectDirs::from("com", "maravilla-labs", "refract")
            .map(|dirs| dirs.cache_dir().join("tools"))
            .ok_or_else(|| {
                ToolchainError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no cache directory available on this platform",
                ))
            })
    }

    /// Returns the executable for `tool`, downloading it on a cache miss.
    ///
    /// The boolean is `true` when the cache already had the requested
    /// version.
    pub async fn ensure_tool(
        &self,
        tool: Tool,
        version: &str,
        checksum: Option<&str>,
    ) -> ToolchainResult<(ToolPath, bool)> {
        if FAILED_DOWNLOADS.contains(tool, version) {
            return Err(ToolchainError::DownloadFailed(format!(
                "{} v{} already failed to download in this run",
                tool.as_str(),
                version
            )));
        }

        if let Some(found) = self.lookup(tool, version)? {
            return Ok((found, true));
        }

        let platform = host_platform()?;
        let (resolved, path) =
            download::fetch_tool(tool, platform, version, checksum, &self.cache_dir).await?;

        Ok((
            ToolPath {
                tool,
                version: resolved,
                path,
            },
            false,
        ))
    }

    /// Cache lookup. `latest` follows the symlink left by the last download.
    fn lookup(&self, tool: Tool, version: &str) -> ToolchainResult<Option<ToolPath>> {
        let tool_dir = self.cache_dir.join(tool.as_str());

        let resolved = if version == "latest" {
            let Ok(target) = fs::read_link(tool_dir.join("latest")) else {
                return Ok(None);
            };
            match target.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => return Ok(None),
            }
        } else {
            version.to_string()
        };

        let platform = host_platform()?;
        let executable = tool_dir.join(&resolved).join(platform.executable_rel(tool));
        if !executable.is_file() {
            return Ok(None);
        }

        Ok(Some(ToolPath {
            tool,
            version: resolved,
            path: executable,
        }))
    }
}

/// Prepares the build tools needed for asset compilation
pub async fn prepare_build_tools(
    toolchain_config: &ToolchainConfig,
) -> ToolchainResult<HashMap<Tool, PathBuf>> {
    let enabled = toolchain_config.get_enabled_tools();
    if enabled.is_empty() {
        return Ok(HashMap::new());
    }

    println!("{}", style("Preparing build tools...").cyan());

    let manager = ToolchainManager::new()?;
    let mut tool_paths = HashMap::new();
    let mut failed: Vec<&str> = Vec::new();

    // Sequential on purpose: parallel progress bars interleave badly
    let mut tools: Vec<Tool> = enabled.into_iter().collect();
    tools.sort_by_key(Tool::as_str);

    for tool in tools {
        let version = toolchain_config.version_for(tool);
        let checksum = toolchain_config.checksum_for(tool);

        match manager.ensure_tool(tool, version, checksum).await {
            Ok((found, cached)) => {
                println!(
                    "  {:<12} {} {}{}",
                    style(tool.as_str()).cyan(),
                    style("✓").green(),
                    style(format!("v{}", found.version)).dim(),
                    style(if cached { " (cached)" } else { "" }).dim()
                );
                tool_paths.insert(tool, found.path);
            }
            Err(err) => {
                println!(
                    "  {:<12} {} {}",
                    style(tool.as_str()).cyan(),
                    style("✗").red(),
                    style(err.to_string()).red()
                );
                failed.push(tool.as_str());
            }
        }
    }

    if !failed.is_empty() {
        return Err(ToolchainError::DownloadFailed(format!(
            "could not prepare {}; check your network connection and try again",
            failed.join(", ")
        )));
    }

    Ok(tool_paths)
}
