// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Fetches tool binaries from their upstream release channels.

use super::types::{Platform, Tool, ToolchainError, ToolchainResult};
use super::FAILED_DOWNLOADS;
use console::style;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;

/// Attempts per download before giving up
const MAX_RETRIES: u32 = 3;

/// First retry waits this long; each further retry doubles it
const BASE_DELAY_MS: u64 = 500;

/// Fallback Tailwind version when the GitHub API is rate limited
const TAILWIND_FALLBACK_VERSION: &str = "4.1.11";

const USER_AGENT: &str = "refract-cli";

/// Downloads `tool` into the cache, returning the resolved version and the
/// executable path.
pub(super) async fn fetch_tool(
    tool: Tool,
    platform: Platform,
    requested: &str,
    checksum: Option<&str>,
    cache_dir: &Path,
) -> ToolchainResult<(String, PathBuf)> {
    let client = Client::builder().user_agent(USER_AGENT).build()?;

    let version = if requested == "latest" {
        latest_version(&client, tool).await?
    } else {
        requested.to_string()
    };

    let tool_dir = cache_dir.join(tool.as_str());
    let version_dir = tool_dir.join(&version);
    fs::create_dir_all(&version_dir)?;

    let url = resolve_download_url(&client, tool, platform, &version).await?;
    let (artifact, digest) =
        download_with_retry(&client, tool, &version, &url, checksum, &version_dir).await?;

    let executable = install(tool, platform, &artifact, &version_dir)?;
    #[cfg(unix)]
    set_executable(&executable)?;

    // Recorded beside the binary so a pin can be copied into refract.toml
    fs::write(
        version_dir.join(format!("{}.sha256", tool.as_str())),
        &digest,
    )?;

    if requested == "latest" {
        update_latest_symlink(&tool_dir, &version);
    }

    Ok((version, executable))
}

/// Resolves `"latest"` to a concrete version string.
async fn latest_version(client: &Client, tool: Tool) -> ToolchainResult<String> {
    match tool {
        Tool::Esbuild => {
            let meta: serde_json::Value = client
                .get("https://registry.npmjs.org/esbuild")
                .send()
                .await?
                .json()
                .await?;

            meta["dist-tags"]["latest"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    ToolchainError::ReleaseFetchFailed(
                        "npm registry response had no dist-tags.latest".to_string(),
                    )
                })
        }

        Tool::Tailwind => {
            let response = client
                .get("https://api.github.com/repos/tailwindlabs/tailwindcss/releases/latest")
                .send()
                .await
                .map_err(|err| {
                    ToolchainError::ReleaseFetchFailed(format!(
                        "GitHub release lookup failed: {}",
                        err
                    ))
                })?;

            // Unauthenticated rate limit; the pinned fallback keeps first
            // runs working
            if response.status() == StatusCode::FORBIDDEN {
                print_tailwind_fallback();
                return Ok(TAILWIND_FALLBACK_VERSION.to_string());
            }

            let release: serde_json::Value = response.json().await.map_err(|err| {
                ToolchainError::ReleaseFetchFailed(format!(
                    "could not parse GitHub release response: {}",
                    err
                ))
            })?;

            if let Some(message) = release["message"].as_str() {
                if message.contains("rate limit") {
                    print_tailwind_fallback();
                    return Ok(TAILWIND_FALLBACK_VERSION.to_string());
                }
                return Err(ToolchainError::ReleaseFetchFailed(format!(
                    "GitHub API: {}",
                    message
                )));
            }

            release["tag_name"]
                .as_str()
                .map(|tag| tag.strip_prefix('v').unwrap_or(tag).to_string())
                .ok_or_else(|| {
                    ToolchainError::ReleaseFetchFailed(
                        "GitHub release had no tag_name".to_string(),
                    )
                })
        }
    }
}

fn print_tailwind_fallback() {
    println!(
        "{}",
        style(format!(
            "GitHub API rate limited; falling back to Tailwind v{}",
            TAILWIND_FALLBACK_VERSION
        ))
        .yellow()
    );
}

/// Release URL for the tool artifact.
///
/// esbuild ships as a platform-specific npm package whose tarball URL comes
/// from the registry metadata. Tailwind publishes raw binaries on the GitHub
/// release itself.
async fn resolve_download_url(
    client: &Client,
    tool: Tool,
    platform: Platform,
    version: &str,
) -> ToolchainResult<String> {
    match tool {
        Tool::Tailwind => Ok(format!(
            "https://github.com/tailwindlabs/tailwindcss/releases/download/v{}/{}",
            version,
            platform.tailwind_asset()
        )),

        Tool::Esbuild => {
            let package = platform.esbuild_package();
            let meta: serde_json::Value = client
                .get(format!("https://registry.npmjs.org/{}/{}", package, version))
                .send()
                .await?
                .json()
                .await?;

            meta["dist"]["tarball"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    ToolchainError::DownloadFailed(format!(
                        "no tarball URL in registry metadata for {}@{}",
                        package, version
                    ))
                })
        }
    }
}

/// Downloads the artifact with exponential backoff, verifying any pinned
/// checksum on success.
async fn download_with_retry(
    client: &Client,
    tool: Tool,
    version: &str,
    url: &str,
    checksum: Option<&str>,
    version_dir: &Path,
) -> ToolchainResult<(PathBuf, String)> {
    let mut attempt = 0;

    loop {
        let pb = progress_bar(tool, version);
        let target = version_dir.join(tool.artifact_name());
        let outcome = stream_artifact(client, url, target, &pb).await;
        pb.finish_and_clear();

        match outcome {
            Ok((path, digest)) => {
                if let Some(expected) = checksum {
                    if !expected.eq_ignore_ascii_case(&digest) {
                        let _ = fs::remove_file(&path);
                        FAILED_DOWNLOADS.record(tool, version);
                        // a wrong pin never resolves itself; do not retry
                        return Err(ToolchainError::ChecksumMismatch {
                            tool: tool.as_str().to_string(),
                            expected: expected.to_string(),
                            actual: digest,
                        });
                    }
                }

                println!(
                    "  {:<12} {} {}",
                    style(tool.as_str()).cyan(),
                    style("✓").green(),
                    style(format!("downloaded v{}", version)).dim()
                );
                return Ok((path, digest));
            }
            Err(err) => {
                attempt += 1;
                if attempt >= MAX_RETRIES {
                    FAILED_DOWNLOADS.record(tool, version);
                    return Err(err);
                }

                let delay = BASE_DELAY_MS * 2_u64.pow(attempt - 1);
                eprintln!(
                    "{}",
                    style(format!(
                        "download failed ({}); retrying in {}ms [{}/{}]",
                        err, delay, attempt, MAX_RETRIES
                    ))
                    .yellow()
                );
                sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

fn progress_bar(tool: Tool, version: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.cyan} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes}")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_message(format!("{} v{}", tool.as_str(), version));
    pb
}

/// Streams the response body to `path`, hashing it as it goes.
async fn stream_artifact(
    client: &Client,
    url: &str,
    path: PathBuf,
    pb: &ProgressBar,
) -> ToolchainResult<(PathBuf, String)> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ToolchainError::DownloadFailed(format!(
            "HTTP {} from {}",
            response.status(),
            url
        )));
    }

    pb.set_length(response.content_length().unwrap_or(0));

    let mut file = File::create(&path)?;
    let mut hasher = Sha256::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        pb.inc(chunk.len() as u64);
        hasher.update(&chunk);
        file.write_all(&chunk)?;
    }

    Ok((path, format!("{:x}", hasher.finalize())))
}

/// Places the downloaded artifact and returns the executable path.
///
/// The Tailwind artifact is the executable itself. esbuild unpacks to
/// `package/bin/esbuild` inside the version directory.
fn install(
    tool: Tool,
    platform: Platform,
    artifact: &Path,
    version_dir: &Path,
) -> ToolchainResult<PathBuf> {
    match tool {
        Tool::Tailwind => Ok(artifact.to_path_buf()),

        Tool::Esbuild => {
            let archive = File::open(artifact)?;
            tar::Archive::new(GzDecoder::new(archive))
                .unpack(version_dir)
                .map_err(|err| {
                    ToolchainError::ExtractionFailed(format!(
                        "{}: {}",
                        artifact.display(),
                        err
                    ))
                })?;
            fs::remove_file(artifact)?;
            Ok(version_dir.join(platform.executable_rel(tool)))
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> ToolchainResult<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

/// Repoints `<tool>/latest` at the version directory just written.
fn update_latest_symlink(tool_dir: &Path, version: &str) {
    let link = tool_dir.join("latest");
    if link.is_symlink() {
        let _ = fs::remove_file(&link);
    }

    // relative target; the cache tree stays relocatable
    #[cfg(unix)]
    {
        let _ = std::os::unix::fs::symlink(version, &link);
    }
    #[cfg(windows)]
    {
        let _ = std::os::windows::fs::symlink_file(version, &link);
    }
}
