// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Hot file primitives.
//!
//! The hot file is a single-line sentinel containing the dev-server base
//! URL. Its existence tells the runtime asset helper that a dev server is
//! running; it must never outlive the dev-server process. Writing and
//! reading live here; the shutdown hooks that guarantee removal belong to
//! the dev-server wrapper in the CLI.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Handle on the hot file at a fixed location.
#[derive(Debug, Clone)]
pub struct HotFile {
    path: PathBuf,
}

impl HotFile {
    /// Creates a handle for the hot file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The hot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the hot file currently exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes the dev-server URL, overwriting any previous content.
    ///
    /// Parent directories are not created: the public directory is expected
    /// to exist already.
    pub fn write(&self, url: &str) -> Result<()> {
        fs::write(&self.path, url)?;
        tracing::debug!(path = %self.path.display(), url, "wrote hot file");
        Ok(())
    }

    /// Reads the dev-server URL back, trimming trailing whitespace.
    pub fn read(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.path)?.trim_end().to_string())
    }

    /// Removes the hot file. Missing files are not an error, so cleanup
    /// paths can call this unconditionally.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "removed hot file");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_read_remove_round_trip() {
        let tmp = TempDir::new().unwrap();
        let hot = HotFile::new(tmp.path().join("hot"));

        assert!(!hot.exists());
        hot.write("http://127.0.0.1:5173").unwrap();
        assert!(hot.exists());
        assert_eq!(hot.read().unwrap(), "http://127.0.0.1:5173");

        hot.remove().unwrap();
        assert!(!hot.exists());
    }

    #[test]
    fn write_overwrites_previous_url() {
        let tmp = TempDir::new().unwrap();
        let hot = HotFile::new(tmp.path().join("hot"));
        hot.write("http://127.0.0.1:5173").unwrap();
        hot.write("https://myapp.test:5174").unwrap();
        assert_eq!(hot.read().unwrap(), "https://myapp.test:5174");
    }

    #[test]
    fn write_does_not_create_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let hot = HotFile::new(tmp.path().join("missing/public/hot"));
        assert!(hot.write("http://127.0.0.1:5173").is_err());
    }

    #[test]
    fn remove_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let hot = HotFile::new(tmp.path().join("hot"));
        hot.remove().unwrap();
        hot.write("http://127.0.0.1:5173").unwrap();
        hot.remove().unwrap();
        hot.remove().unwrap();
    }
}
