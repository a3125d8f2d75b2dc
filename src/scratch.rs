//! Process-scoped scratch directory.
//!
//! All intermediate artifacts of one run live in a single `kernel-*`
//! directory. It is removed when the [`Scratch`] value drops, on success,
//! error return or unwind alike.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create a fresh scratch directory under `base`, creating `base` if needed.
    pub fn create_in(base: &Path) -> Result<Self> {
        fs::create_dir_all(base)
            .with_context(|| format!("creating scratch base '{}'", base.display()))?;
        let dir = tempfile::Builder::new()
            .prefix("kernel-")
            .tempdir_in(base)
            .with_context(|| format!("creating scratch directory under '{}'", base.display()))?;
        debug!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }
}
