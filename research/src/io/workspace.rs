//! Workspace root and the path guard every file operation goes through.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::path::{is_within, normalize};
use crate::error::ToolError;

/// The directory tree tools may read and write.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Use `root` as the workspace. Relative roots are made absolute against the
    /// process working directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let base = if root.is_absolute() {
            PathBuf::from("/")
        } else {
            std::env::current_dir().context("read current directory")?
        };
        Ok(Self {
            root: normalize(&base, root),
        })
    }

    /// Workspace rooted at the process working directory.
    pub fn current() -> Result<Self> {
        let cwd = std::env::current_dir().context("read current directory")?;
        Self::new(cwd)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize `raw` and reject it unless it stays inside the workspace.
    ///
    /// Only lexical normalization is applied; a symlink inside the workspace that
    /// points elsewhere is not detected.
    pub fn guard(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let resolved = normalize(&self.root, Path::new(raw));
        if !is_within(&self.root, &resolved) {
            debug!(path = raw, "rejected path outside workspace");
            return Err(ToolError::PathViolation {
                path: raw.to_string(),
            });
        }
        Ok(resolved)
    }

    /// Render a guarded path relative to the root, `.` for the root itself.
    pub fn display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }
}
