//! Preflight checks run before any network activity.
//!
//! Validates the kernel directory, the keys directory and the host tools
//! the pipeline shells out to, so a missing prerequisite fails fast instead
//! of halfway through a download.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Host tools the pipeline drives.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("koji", "koji"),
    ("dnf", "dnf"),
    ("rpmkeys", "rpm"),
    ("rpm2cpio", "rpm"),
    ("cpio", "cpio"),
    ("make", "make"),
];

/// The kernel directory being configured.
#[derive(Debug, Clone)]
pub struct KernelTree {
    /// Directory holding `version`, the source archive and `config-base`.
    pub dir: PathBuf,
    /// Target kernel version, e.g. `6.1`.
    pub version: String,
    /// `<dir>/linux-<version>.tar`
    pub archive: PathBuf,
}

impl KernelTree {
    /// Name of the top-level directory inside the source archive.
    pub fn source_dir_name(&self) -> String {
        format!("linux-{}", self.version)
    }

    pub fn config_base(&self) -> PathBuf {
        self.dir.join("config-base")
    }
}

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Check that specific tools are available.
///
/// Returns an error listing every missing tool and the package providing it.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check that every tool in [`REQUIRED_TOOLS`] is available.
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}

/// Resolve the kernel directory: `version` file and matching source archive.
pub fn check_kernel_dir(dir: &Path) -> Result<KernelTree> {
    if !dir.is_dir() {
        bail!("kernel directory '{}' not found", dir.display());
    }

    let version_file = dir.join("version");
    if !version_file.is_file() {
        bail!("version file not found: {}", version_file.display());
    }
    let version = fs::read_to_string(&version_file)
        .with_context(|| format!("reading '{}'", version_file.display()))?
        .trim()
        .to_string();
    if version.is_empty() {
        bail!("version file '{}' is empty", version_file.display());
    }

    let archive = dir.join(format!("linux-{version}.tar"));
    if !archive.is_file() {
        bail!("kernel archive '{}' not found", archive.display());
    }

    Ok(KernelTree {
        dir: dir.to_path_buf(),
        version,
        archive,
    })
}

/// The keys directory must exist; individual keys are checked once the
/// release is known.
pub fn check_keys_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("keys directory '{}' not found", dir.display());
    }
    Ok(())
}

/// A release's public key must already be on disk; it is never fetched.
pub fn check_key_file(key_file: &Path) -> Result<()> {
    if !key_file.is_file() {
        bail!("key file '{}' not found", key_file.display());
    }
    Ok(())
}
