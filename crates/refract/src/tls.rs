// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! TLS certificate discovery for the dev server.
//!
//! Two independent strategies, tried in caller-defined priority:
//!
//! 1. [`resolve_environment_server_config`] honors an explicit
//!    `REFRACT_DEV_SERVER_KEY` / `REFRACT_DEV_SERVER_CERT` pair and derives
//!    the HTTPS host from `APP_URL`.
//! 2. [`resolve_development_server_config`] discovers locally provisioned
//!    certificates under the platform config directory
//!    (`Certificates/<host>.{key,crt}`), deriving the host from the project
//!    directory name and the configured top-level domain.
//!
//! At most one strategy's result is used per run. Certificates that are
//! simply not configured are not an error: the dev server falls back to
//! plain HTTP. Certificates that are configured but absent fail loudly with
//! both expected paths named.

use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::config::DetectTls;
use crate::environment::{Environment, APP_URL, DEV_SERVER_CERT, DEV_SERVER_KEY};
use crate::error::{RefractError, Result};

/// Certificate and key material for an HTTPS dev server.
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    /// PEM contents of the private key.
    pub key: Vec<u8>,
    /// PEM contents of the certificate.
    pub cert: Vec<u8>,
    /// Where the key was read from.
    pub key_path: PathBuf,
    /// Where the certificate was read from.
    pub cert_path: PathBuf,
}

/// HMR channel settings derived alongside the certificates.
#[derive(Debug, Clone)]
pub struct HmrSettings {
    /// Host the browser should use for the reload channel.
    pub host: String,
}

/// Server configuration produced by a certificate resolution strategy.
#[derive(Debug, Clone)]
pub struct ResolvedServerConfig {
    /// Host the dev server should advertise.
    pub host: String,
    /// HMR channel settings.
    pub hmr: HmrSettings,
    /// TLS material, when the strategy found any.
    pub https: Option<TlsMaterial>,
}

impl ResolvedServerConfig {
    fn with_tls(host: String, https: TlsMaterial) -> Self {
        Self {
            hmr: HmrSettings { host: host.clone() },
            host,
            https: Some(https),
        }
    }
}

/// Resolves TLS material from the process environment.
///
/// Activates when at least one of `REFRACT_DEV_SERVER_KEY` and
/// `REFRACT_DEV_SERVER_CERT` is set; returns `Ok(None)` when both are unset.
///
/// # Errors
///
/// [`RefractError::CertificateNotFoundError`] when only one variable is set
/// or either file is missing, naming both expected paths.
/// [`RefractError::HostResolutionError`] when `APP_URL` is unset or no host
/// can be parsed from it.
pub fn resolve_environment_server_config(
    env: &Environment,
) -> Result<Option<ResolvedServerConfig>> {
    let key = env.get(DEV_SERVER_KEY);
    let cert = env.get(DEV_SERVER_CERT);

    if key.is_none() && cert.is_none() {
        return Ok(None);
    }

    let remedy = format!(
        "Set both {DEV_SERVER_KEY} and {DEV_SERVER_CERT} to existing files, \
         or unset both to serve over plain HTTP."
    );

    let (key, cert) = match (key, cert) {
        (Some(key), Some(cert)) => (PathBuf::from(key), PathBuf::from(cert)),
        (key, cert) => {
            return Err(RefractError::CertificateNotFoundError {
                key: describe_env_path(DEV_SERVER_KEY, key),
                cert: describe_env_path(DEV_SERVER_CERT, cert),
                remedy,
            })
        }
    };

    if !key.is_file() || !cert.is_file() {
        return Err(RefractError::CertificateNotFoundError {
            key: key.display().to_string(),
            cert: cert.display().to_string(),
            remedy,
        });
    }

    let host = application_url_host(env)?;
    tracing::debug!(host, key = %key.display(), "using TLS material from the environment");

    let https = TlsMaterial {
        key: fs::read(&key)?,
        cert: fs::read(&cert)?,
        key_path: key,
        cert_path: cert,
    };

    Ok(Some(ResolvedServerConfig::with_tls(host, https)))
}

fn describe_env_path(var: &str, value: Option<&str>) -> String {
    match value {
        Some(path) => path.to_string(),
        None => format!("({var} is not set)"),
    }
}

fn application_url_host(env: &Environment) -> Result<String> {
    let raw = env.get(APP_URL).ok_or_else(|| {
        RefractError::HostResolutionError(format!(
            "`{APP_URL}` is not set; it is required to derive the HTTPS host"
        ))
    })?;

    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .ok_or_else(|| {
            RefractError::HostResolutionError(format!(
                "could not parse a host from {APP_URL}=`{raw}`"
            ))
        })
}

/// Candidate locations of the local TLS configuration.
///
/// The primary location is `<platform config dir>/refract`; the fallback is
/// the `~/.refract` dotfile directory. Both hold an optional `config.json`
/// (top-level `tld` key) and a `Certificates` subdirectory.
#[derive(Debug, Clone)]
pub struct CertificateDirectories {
    /// Platform-specific config location.
    pub primary: PathBuf,
    /// Dotfile fallback in the home directory.
    pub fallback: PathBuf,
}

impl CertificateDirectories {
    /// Locates the candidate directories for the current user.
    pub fn discover() -> Option<Self> {
        let base = directories::BaseDirs::new()?;
        Some(Self {
            primary: base.config_dir().join("refract"),
            fallback: base.home_dir().join(".refract"),
        })
    }

    /// Returns the first candidate that exists on disk.
    pub fn locate(&self) -> Option<&Path> {
        if self.primary.is_dir() {
            Some(&self.primary)
        } else if self.fallback.is_dir() {
            Some(&self.fallback)
        } else {
            None
        }
    }
}

/// Resolves locally provisioned TLS material.
///
/// Returns `Ok(None)` without touching the filesystem when `detect_tls` is
/// disabled. With `detect_tls = true` the host is
/// `<project dir name>.<tld>`, where the tld comes from `config.json` in the
/// local config directory; a string value is used as the host directly.
///
/// # Errors
///
/// [`RefractError::HostResolutionError`] when the host cannot be derived
/// (no config directory, no `config.json`, or no `tld` key).
/// [`RefractError::CertificateNotFoundError`] when `Certificates/<host>.key`
/// or `Certificates/<host>.crt` is missing.
pub fn resolve_development_server_config(
    detect_tls: &DetectTls,
    dirs: &CertificateDirectories,
    project_dir: &Path,
) -> Result<Option<ResolvedServerConfig>> {
    let host = match detect_tls {
        DetectTls::Enabled(false) => return Ok(None),
        DetectTls::Host(host) => host.clone(),
        DetectTls::Enabled(true) => {
            let config_dir = dirs.locate().ok_or_else(|| {
                RefractError::HostResolutionError(format!(
                    "no local TLS configuration found (looked for {} and {})",
                    dirs.primary.display(),
                    dirs.fallback.display()
                ))
            })?;
            format!("{}.{}", project_name(project_dir)?, read_tld(config_dir)?)
        }
    };

    let config_dir = dirs
        .locate()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dirs.primary.clone());
    let certificates = config_dir.join("Certificates");
    let key_path = certificates.join(format!("{host}.key"));
    let cert_path = certificates.join(format!("{host}.crt"));

    if !key_path.is_file() || !cert_path.is_file() {
        return Err(RefractError::CertificateNotFoundError {
            key: key_path.display().to_string(),
            cert: cert_path.display().to_string(),
            remedy: format!(
                "Provision trusted certificates for `{host}` (for example with mkcert) \
                 under {}.",
                certificates.display()
            ),
        });
    }

    tracing::debug!(host, dir = %certificates.display(), "using locally provisioned TLS material");

    let https = TlsMaterial {
        key: fs::read(&key_path)?,
        cert: fs::read(&cert_path)?,
        key_path,
        cert_path,
    };

    Ok(Some(ResolvedServerConfig::with_tls(host, https)))
}

fn project_name(project_dir: &Path) -> Result<String> {
    project_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            RefractError::HostResolutionError(format!(
                "project directory {} has no name to derive a host from",
                project_dir.display()
            ))
        })
}

fn read_tld(config_dir: &Path) -> Result<String> {
    let path = config_dir.join("config.json");
    if !path.is_file() {
        return Err(RefractError::HostResolutionError(format!(
            "no local TLS configuration found at {}",
            path.display()
        )));
    }

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    value
        .get("tld")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            RefractError::HostResolutionError(format!(
                "{} has no top-level `tld` key",
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_pair(dir: &Path, host: &str) -> (PathBuf, PathBuf) {
        let certificates = dir.join("Certificates");
        fs::create_dir_all(&certificates).unwrap();
        let key = certificates.join(format!("{host}.key"));
        let cert = certificates.join(format!("{host}.crt"));
        fs::write(&key, "key-bytes").unwrap();
        fs::write(&cert, "cert-bytes").unwrap();
        (key, cert)
    }

    fn dirs_in(tmp: &TempDir) -> CertificateDirectories {
        CertificateDirectories {
            primary: tmp.path().join("config/refract"),
            fallback: tmp.path().join(".refract"),
        }
    }

    #[test]
    fn environment_strategy_inactive_when_both_unset() {
        let env = Environment::from_pairs([("APP_URL", "https://app.test")]);
        assert!(resolve_environment_server_config(&env).unwrap().is_none());
    }

    #[test]
    fn environment_strategy_reads_material_and_host() {
        let tmp = TempDir::new().unwrap();
        let key = tmp.path().join("dev.key");
        let cert = tmp.path().join("dev.crt");
        fs::write(&key, "key-bytes").unwrap();
        fs::write(&cert, "cert-bytes").unwrap();

        let env = Environment::from_pairs([
            ("REFRACT_DEV_SERVER_KEY", key.to_str().unwrap()),
            ("REFRACT_DEV_SERVER_CERT", cert.to_str().unwrap()),
            ("APP_URL", "https://myapp.test:8080/login"),
        ]);

        let config = resolve_environment_server_config(&env).unwrap().unwrap();
        assert_eq!(config.host, "myapp.test");
        assert_eq!(config.hmr.host, "myapp.test");
        let material = config.https.unwrap();
        assert_eq!(material.key, b"key-bytes");
        assert_eq!(material.cert, b"cert-bytes");
        assert_eq!(material.key_path, key);
    }

    #[test]
    fn single_env_var_names_both_paths() {
        let env = Environment::from_pairs([
            ("REFRACT_DEV_SERVER_KEY", "/certs/dev.key"),
            ("APP_URL", "https://myapp.test"),
        ]);

        let err = resolve_environment_server_config(&env).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, RefractError::CertificateNotFoundError { .. }));
        assert!(message.contains("/certs/dev.key"));
        assert!(message.contains("REFRACT_DEV_SERVER_CERT"));
    }

    #[test]
    fn missing_files_fail_with_both_paths() {
        let env = Environment::from_pairs([
            ("REFRACT_DEV_SERVER_KEY", "/nope/dev.key"),
            ("REFRACT_DEV_SERVER_CERT", "/nope/dev.crt"),
            ("APP_URL", "https://myapp.test"),
        ]);

        let err = resolve_environment_server_config(&env).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("/nope/dev.key"));
        assert!(message.contains("/nope/dev.crt"));
    }

    #[test]
    fn unparsable_app_url_is_a_host_resolution_error() {
        let tmp = TempDir::new().unwrap();
        let key = tmp.path().join("dev.key");
        let cert = tmp.path().join("dev.crt");
        fs::write(&key, "k").unwrap();
        fs::write(&cert, "c").unwrap();

        let env = Environment::from_pairs([
            ("REFRACT_DEV_SERVER_KEY", key.to_str().unwrap()),
            ("REFRACT_DEV_SERVER_CERT", cert.to_str().unwrap()),
            ("APP_URL", "not a url"),
        ]);

        assert!(matches!(
            resolve_environment_server_config(&env).unwrap_err(),
            RefractError::HostResolutionError(_)
        ));
    }

    #[test]
    fn disabled_detection_returns_none_without_touching_disk() {
        // The candidate paths do not exist; any filesystem probe would
        // surface as an error or a panic in the assertions below.
        let dirs = CertificateDirectories {
            primary: PathBuf::from("/nonexistent/refract"),
            fallback: PathBuf::from("/nonexistent/.refract"),
        };
        let config = resolve_development_server_config(
            &DetectTls::Enabled(false),
            &dirs,
            Path::new("/srv/myapp"),
        )
        .unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn local_strategy_derives_host_from_project_and_tld() {
        let tmp = TempDir::new().unwrap();
        let dirs = dirs_in(&tmp);
        fs::create_dir_all(&dirs.primary).unwrap();
        fs::write(dirs.primary.join("config.json"), r#"{"tld":"test"}"#).unwrap();
        write_pair(&dirs.primary, "myapp.test");

        let config = resolve_development_server_config(
            &DetectTls::Enabled(true),
            &dirs,
            Path::new("/srv/myapp"),
        )
        .unwrap()
        .unwrap();

        assert_eq!(config.host, "myapp.test");
        assert_eq!(config.https.unwrap().cert, b"cert-bytes");
    }

    #[test]
    fn fallback_directory_is_used_when_primary_is_absent() {
        let tmp = TempDir::new().unwrap();
        let dirs = dirs_in(&tmp);
        fs::create_dir_all(&dirs.fallback).unwrap();
        fs::write(dirs.fallback.join("config.json"), r#"{"tld":"dev"}"#).unwrap();
        write_pair(&dirs.fallback, "site.dev");

        let config = resolve_development_server_config(
            &DetectTls::Enabled(true),
            &dirs,
            Path::new("/home/me/site"),
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.host, "site.dev");
    }

    #[test]
    fn string_detect_tls_is_used_as_the_host() {
        let tmp = TempDir::new().unwrap();
        let dirs = dirs_in(&tmp);
        fs::create_dir_all(&dirs.primary).unwrap();
        write_pair(&dirs.primary, "custom.test");

        let config = resolve_development_server_config(
            &DetectTls::Host("custom.test".to_string()),
            &dirs,
            Path::new("/srv/other-name"),
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.host, "custom.test");
    }

    #[test]
    fn missing_local_certificates_name_both_paths() {
        let tmp = TempDir::new().unwrap();
        let dirs = dirs_in(&tmp);
        fs::create_dir_all(&dirs.primary).unwrap();
        fs::write(dirs.primary.join("config.json"), r#"{"tld":"test"}"#).unwrap();

        let err = resolve_development_server_config(
            &DetectTls::Enabled(true),
            &dirs,
            Path::new("/srv/myapp"),
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, RefractError::CertificateNotFoundError { .. }));
        assert!(message.contains("myapp.test.key"));
        assert!(message.contains("myapp.test.crt"));
    }

    #[test]
    fn missing_tld_config_is_a_host_resolution_error() {
        let tmp = TempDir::new().unwrap();
        let dirs = dirs_in(&tmp);
        fs::create_dir_all(&dirs.primary).unwrap();

        let err = resolve_development_server_config(
            &DetectTls::Enabled(true),
            &dirs,
            Path::new("/srv/myapp"),
        )
        .unwrap_err();
        assert!(matches!(err, RefractError::HostResolutionError(_)));
    }
}
