// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Environment guard for the dev server.
//!
//! The interactive dev server must not run inside deployment or CI
//! environments: the hot file it writes would leak into the deployed
//! artifact and point every request at a dev server that no longer exists.
//! Building is always safe.

use crate::environment::{Environment, BYPASS_ENV_CHECK};
use crate::error::{RefractError, Result};

/// The command the guard is protecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedCommand {
    /// Production asset build; always allowed.
    Build,
    /// Interactive dev server; blocked in deployment and CI contexts.
    Serve,
}

/// Deployment and CI markers, each with the context named in its error.
const FORBIDDEN_MARKERS: &[(&str, &str)] = &[
    ("FLY_APP_NAME", "on Fly.io"),
    ("RAILWAY_ENVIRONMENT", "on Railway"),
    ("RENDER", "on Render"),
    ("CI", "in a CI environment"),
];

/// Verifies that `command` may run in the given environment.
///
/// `Build` always passes. Setting [`BYPASS_ENV_CHECK`] to `"1"` skips the
/// check entirely. Otherwise the first matching deployment or CI marker
/// fails the call with a [`RefractError::ForbiddenEnvironmentError`] naming
/// the offending context.
pub fn ensure_command_should_run_in_environment(
    command: GuardedCommand,
    env: &Environment,
) -> Result<()> {
    if command == GuardedCommand::Build {
        return Ok(());
    }

    if env.is_enabled(BYPASS_ENV_CHECK) {
        tracing::debug!("environment check bypassed via {}", BYPASS_ENV_CHECK);
        return Ok(());
    }

    for (var, context) in FORBIDDEN_MARKERS {
        if env.is_set(var) {
            return Err(RefractError::ForbiddenEnvironmentError {
                context: format!("You should not run the dev server {context} (`{var}` is set)"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_always_passes() {
        let env = Environment::from_pairs([("CI", "true"), ("FLY_APP_NAME", "my-app")]);
        assert!(ensure_command_should_run_in_environment(GuardedCommand::Build, &env).is_ok());
    }

    #[test]
    fn serve_fails_in_ci_unless_bypassed() {
        let env = Environment::from_pairs([("CI", "true")]);
        let err =
            ensure_command_should_run_in_environment(GuardedCommand::Serve, &env).unwrap_err();
        assert!(matches!(
            err,
            RefractError::ForbiddenEnvironmentError { .. }
        ));
        assert!(err.to_string().contains("CI"));
        assert!(err.to_string().contains("REFRACT_BYPASS_ENV_CHECK"));

        let env = Environment::from_pairs([("CI", "true"), ("REFRACT_BYPASS_ENV_CHECK", "1")]);
        assert!(ensure_command_should_run_in_environment(GuardedCommand::Serve, &env).is_ok());
    }

    #[test]
    fn bypass_requires_literal_one() {
        let env = Environment::from_pairs([("CI", "true"), ("REFRACT_BYPASS_ENV_CHECK", "true")]);
        assert!(ensure_command_should_run_in_environment(GuardedCommand::Serve, &env).is_err());
    }

    #[test]
    fn each_platform_marker_names_its_context() {
        for (var, context) in [
            ("FLY_APP_NAME", "Fly.io"),
            ("RAILWAY_ENVIRONMENT", "Railway"),
            ("RENDER", "Render"),
        ] {
            let env = Environment::from_pairs([(var, "x")]);
            let err = ensure_command_should_run_in_environment(GuardedCommand::Serve, &env)
                .unwrap_err();
            assert!(err.to_string().contains(context), "marker {var}");
        }
    }

    #[test]
    fn clean_environment_passes() {
        let env = Environment::default();
        assert!(ensure_command_should_run_in_environment(GuardedCommand::Serve, &env).is_ok());
    }
}
