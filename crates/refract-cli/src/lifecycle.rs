// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Hot-file lifecycle for the dev server.
//!
//! The hot file must never outlive the dev-server process: a stale file
//! would point every asset request at a server that no longer exists. The
//! [`HotFileLifecycle`] owns the hot file for the duration of the dev
//! command and guarantees removal on all four termination paths: normal
//! exit, interrupt, termination signal, and hangup.
//!
//! Signal hooks are registered through [`register_shutdown_hooks_once`],
//! which is idempotent via an atomic latch, so restarts and retries inside
//! the dev command can never stack duplicate handlers.
//!
//! [`register_shutdown_hooks_once`]: HotFileLifecycle::register_shutdown_hooks_once

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use refract::HotFile;

/// Exit code reported after a signal-triggered shutdown.
const SIGNAL_EXIT_CODE: i32 = 0;

/// Owns the hot file and the shutdown hooks that remove it.
#[derive(Debug)]
pub struct HotFileLifecycle {
    hot: HotFile,
    hooks_registered: AtomicBool,
}

impl HotFileLifecycle {
    /// Creates a lifecycle around the hot file at its resolved location.
    pub fn new(hot: HotFile) -> Arc<Self> {
        Arc::new(Self {
            hot,
            hooks_registered: AtomicBool::new(false),
        })
    }

    /// The managed hot file.
    pub fn hot_file(&self) -> &HotFile {
        &self.hot
    }

    /// Writes the dev-server URL to the hot file.
    ///
    /// The parent directory is not created; a missing public directory is
    /// surfaced as the underlying I/O error.
    pub fn publish(&self, url: &str) -> refract::Result<()> {
        self.hot.write(url)
    }

    /// Registers the signal hooks, exactly once per lifecycle.
    ///
    /// Returns `true` when this call performed the registration and `false`
    /// when a previous call already had. Hooks cover interrupt (Ctrl-C) on
    /// every platform, plus SIGTERM and SIGHUP on Unix; each removes the hot
    /// file and exits the process with code 0.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register_shutdown_hooks_once(self: &Arc<Self>) -> bool {
        if self.hooks_registered.swap(true, Ordering::SeqCst) {
            return false;
        }

        {
            let lifecycle = Arc::clone(self);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(lifecycle.handle_termination());
                }
            });
        }

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let lifecycle = Arc::clone(self);
            tokio::spawn(async move {
                if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                    sigterm.recv().await;
                    std::process::exit(lifecycle.handle_termination());
                }
            });

            let lifecycle = Arc::clone(self);
            tokio::spawn(async move {
                if let Ok(mut sighup) = signal(SignalKind::hangup()) {
                    sighup.recv().await;
                    std::process::exit(lifecycle.handle_termination());
                }
            });
        }

        true
    }

    /// Removes the hot file if it exists. Failures are logged, not raised:
    /// this runs on shutdown paths where there is nothing left to abort.
    pub fn cleanup(&self) {
        if let Err(err) = self.hot.remove() {
            tracing::warn!(
                path = %self.hot.path().display(),
                %err,
                "failed to remove hot file during shutdown"
            );
        }
    }

    /// Runs the cleanup a signal handler performs and returns the process
    /// exit code it reports.
    pub fn handle_termination(&self) -> i32 {
        self.cleanup();
        SIGNAL_EXIT_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn termination_removes_the_hot_file_and_exits_zero() {
        let tmp = TempDir::new().unwrap();
        let hot = HotFile::new(tmp.path().join("hot"));
        let lifecycle = HotFileLifecycle::new(hot);

        lifecycle.publish("http://127.0.0.1:5173").unwrap();
        assert!(lifecycle.hot_file().exists());

        let code = lifecycle.handle_termination();
        assert_eq!(code, 0);
        assert!(!lifecycle.hot_file().exists());
    }

    #[test]
    fn termination_without_a_hot_file_still_exits_zero() {
        let tmp = TempDir::new().unwrap();
        let lifecycle = HotFileLifecycle::new(HotFile::new(tmp.path().join("hot")));
        assert_eq!(lifecycle.handle_termination(), 0);
    }

    #[tokio::test]
    async fn hook_registration_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let lifecycle = HotFileLifecycle::new(HotFile::new(tmp.path().join("hot")));

        assert!(lifecycle.register_shutdown_hooks_once());
        assert!(!lifecycle.register_shutdown_hooks_once());
        assert!(!lifecycle.register_shutdown_hooks_once());
    }
}
