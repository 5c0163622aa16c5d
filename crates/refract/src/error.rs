// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for the refract toolkit.
//!
//! This module defines [`RefractError`], the main error enum shared by the
//! library and the CLI.
//!
//! # Error Categories
//!
//! - **Configuration errors**: Missing or invalid plugin configuration
//! - **Environment errors**: Dev server started in a forbidden context
//! - **Certificate errors**: TLS material absent at its expected paths
//! - **Host resolution errors**: HTTPS host underivable from the environment
//! - **Asset errors**: Logical asset missing from the build manifest
//!
//! Every error is fatal where it is raised; nothing is retried. Messages
//! name the exact missing path or variable and the remedy. The one deliberate
//! non-error: TLS detection treats "nothing configured" as a plain-HTTP
//! fallback rather than a failure.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for refract operations.
///
/// All fallible refract functions return `Result<T, RefractError>` so that
/// callers get detailed, actionable error information.
#[derive(Error, Debug)]
pub enum RefractError {
    /// Plugin configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The dev server was started in an environment where it must not run.
    #[error("{context}. You should build your assets for production instead (`refract build`). To bypass this check, set REFRACT_BYPASS_ENV_CHECK=1 in your environment")]
    ForbiddenEnvironmentError {
        /// Description of the offending context.
        context: String,
    },

    /// TLS certificate files are absent at their expected paths.
    #[error("Unable to find TLS certificates: expected key at `{key}` and certificate at `{cert}`. {remedy}")]
    CertificateNotFoundError {
        /// Expected key file location, or the unset variable.
        key: String,
        /// Expected certificate file location, or the unset variable.
        cert: String,
        /// How to provision the missing material.
        remedy: String,
    },

    /// The HTTPS host for the dev server could not be determined.
    #[error("Unable to determine the dev server host: {0}")]
    HostResolutionError(String),

    /// A logical asset key is absent from the build manifest.
    #[error("Unable to locate asset `{key}` in manifest {manifest:?}. Run `refract build` to regenerate it")]
    MissingAssetError {
        /// The logical asset key that was looked up.
        key: String,
        /// The manifest file that was consulted.
        manifest: PathBuf,
    },

    /// A named route lookup or parameter substitution failed.
    #[error("Routing error: {0}")]
    RoutingError(String),

    /// An underlying filesystem read or write failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization or parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Convenience type alias for Results with [`RefractError`].
pub type Result<T> = std::result::Result<T, RefractError>;
