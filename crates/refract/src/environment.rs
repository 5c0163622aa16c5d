// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Process environment snapshot.
//!
//! The environment guard and the TLS locator make decisions based on
//! environment variables. They read from an [`Environment`] snapshot instead
//! of `std::env` directly, so tests can construct arbitrary environments
//! without mutating process state.

use std::collections::HashMap;

/// Bypass flag for the environment guard (`"1"` disables the check).
pub const BYPASS_ENV_CHECK: &str = "REFRACT_BYPASS_ENV_CHECK";
/// Path to a user-supplied TLS private key for the dev server.
pub const DEV_SERVER_KEY: &str = "REFRACT_DEV_SERVER_KEY";
/// Path to a user-supplied TLS certificate for the dev server.
pub const DEV_SERVER_CERT: &str = "REFRACT_DEV_SERVER_CERT";
/// Application base URL; the HTTPS host is derived from it.
pub const APP_URL: &str = "APP_URL";
/// Set when the dev server runs inside a managed container environment.
pub const CONTAINER: &str = "REFRACT_CONTAINER";
/// Overrides the port the dev asset server binds to.
pub const DEV_PORT: &str = "REFRACT_DEV_PORT";

/// An immutable snapshot of environment variables.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Captures the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Builds an environment from explicit key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value of `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Returns true if `key` is set, regardless of value.
    pub fn is_set(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Returns true if `key` is set to exactly `"1"`.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key) == Some("1")
    }
}
