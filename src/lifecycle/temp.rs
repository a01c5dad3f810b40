//! Temporary working directories tied to process cleanup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::TempDir;

use crate::config::{self, env_flag, LEAVE_TEMP_ENV};
use crate::error::Result;

use super::cleanup::CleanupToken;
use super::Lifecycle;

/// Whether temp workspaces should be left on disk.
///
/// Read at disposal time, so setting the variable late in a script still
/// applies to workspaces created earlier.
pub fn leave_temp() -> bool {
    env_flag(LEAVE_TEMP_ENV).unwrap_or_else(config::leave_temp_default)
}

/// A temp directory removed on drop or at shutdown, whichever comes first.
///
/// Set `SHELLBRACKET_LEAVE_TEMP=1` to keep it for inspection.
#[derive(Debug)]
pub struct TempWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
    token: Option<CleanupToken>,
}

impl TempWorkspace {
    /// Create a workspace registered with `lifecycle`'s cleanup registry.
    pub fn new(lifecycle: &Lifecycle) -> Result<Self> {
        Self::with_prefix(lifecycle, "shellbracket-")
    }

    pub fn with_prefix(lifecycle: &Lifecycle, prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().to_path_buf();

        let target = path.clone();
        let token = lifecycle.registry().register(
            format!("temp workspace {}", path.display()),
            move || remove_workspace(&target),
        );

        tracing::debug!(path = %path.display(), "temp workspace created");
        Ok(Self {
            dir: Some(dir),
            path,
            token: Some(token),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }

    /// Keep the directory regardless of settings and return its path.
    pub fn keep(mut self) -> PathBuf {
        if let Some(token) = self.token.take() {
            token.unregister();
        }
        if let Some(dir) = self.dir.take() {
            dir.keep();
        }
        self.path.clone()
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.unregister();
        }
        let Some(dir) = self.dir.take() else {
            return;
        };
        if leave_temp() {
            let kept = dir.keep();
            tracing::warn!(path = %kept.display(), "leaving temp workspace");
        } else if let Err(e) = dir.close() {
            tracing::warn!(path = %self.path.display(), "failed to remove temp workspace: {}", e);
        }
    }
}

fn remove_workspace(path: &Path) -> anyhow::Result<()> {
    if leave_temp() {
        tracing::warn!(path = %path.display(), "leaving temp workspace");
        return Ok(());
    }
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}
