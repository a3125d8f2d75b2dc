//! Regenerate the packaged config against the target kernel's Kconfig.
//!
//! The distribution config is dropped into the unpacked target source tree
//! as `.config` and `make olddefconfig` reconciles it: options that only
//! exist with distribution patches go away, options new in the target
//! kernel take their defaults.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::process::{CommandRunner, CommandSpec};

/// Inputs for one regeneration.
#[derive(Debug, Clone)]
pub struct RegenRequest<'a> {
    /// Packaged config text.
    pub raw_config: &'a str,
    /// `linux-<version>.tar`
    pub archive: &'a Path,
    /// Top-level directory the archive unpacks to, e.g. `linux-6.1`.
    pub source_dir_name: &'a str,
    /// `kernel-core-<version>-<release>`
    pub package_spec: &'a str,
    /// Header lines written by the normalization pass.
    pub strip_lines: usize,
}

/// Unpack the kernel source archive into `dest`.
pub fn unpack_source(archive: &Path, dest: &Path) -> Result<()> {
    let file =
        File::open(archive).with_context(|| format!("opening '{}'", archive.display()))?;
    tar::Archive::new(file)
        .unpack(dest)
        .with_context(|| format!("unpacking '{}' into '{}'", archive.display(), dest.display()))
}

/// Run the non-interactive normalization pass in `source_dir`.
///
/// Output is discarded; only the exit status matters.
pub fn normalize_config(runner: &dyn CommandRunner, source_dir: &Path) -> Result<()> {
    runner
        .run(
            &CommandSpec::new("make")
                .arg("olddefconfig")
                .current_dir(source_dir)
                .quiet(),
        )
        .with_context(|| format!("running make olddefconfig in '{}'", source_dir.display()))?;
    Ok(())
}

/// Drop exactly `count` leading lines.
///
/// Text with fewer lines than that means the normalization pass did not
/// write its usual header, so it is rejected rather than emptied.
pub fn strip_leading_lines(text: &str, count: usize) -> Result<&str> {
    let mut rest = text;
    for stripped in 0..count {
        match rest.find('\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None if !rest.is_empty() && stripped + 1 == count => rest = "",
            None => bail!(
                "regenerated config has {} line(s), expected at least {} header lines",
                stripped + usize::from(!rest.is_empty()),
                count
            ),
        }
    }
    Ok(rest)
}

/// Comment block naming the package the config came from.
pub fn provenance_header(package_spec: &str) -> String {
    format!(
        "# Base config based on Fedora's config ({package_spec}.rpm)\n\
         # Only modification is `make olddefconfig` to drop config settings which\n\
         # depend on Fedora patches and adjust for the small version difference.\n"
    )
}

/// Produce the ConfigBase text for `request`, working inside `work_dir`.
pub fn regenerate(
    runner: &dyn CommandRunner,
    request: &RegenRequest<'_>,
    work_dir: &Path,
) -> Result<String> {
    unpack_source(request.archive, work_dir).context("extracting kernel sources")?;

    let source_dir = work_dir.join(request.source_dir_name);
    if !source_dir.is_dir() {
        bail!(
            "extracted kernel source directory '{}' not found",
            source_dir.display()
        );
    }

    let config_path = source_dir.join(".config");
    fs::write(&config_path, request.raw_config)
        .with_context(|| format!("seeding '{}'", config_path.display()))?;

    info!(source = %source_dir.display(), "normalizing config");
    normalize_config(runner, &source_dir)?;

    let regenerated = fs::read_to_string(&config_path)
        .with_context(|| format!("reading regenerated '{}'", config_path.display()))?;
    let body = strip_leading_lines(&regenerated, request.strip_lines)?;

    Ok(format!("{}{}", provenance_header(request.package_spec), body))
}

/// Write `content` to `path` through a temporary file in the same directory,
/// so `path` is either the old file or the complete new one.
///
/// An existing file keeps its permissions; a new one gets the same mode a
/// plain create would (0666 less the umask).
///
/// Returns the hex SHA-256 of the content.
pub fn write_config_base(path: &Path, content: &str) -> Result<String> {
    let dir: PathBuf = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let existing = fs::metadata(path).ok().map(|meta| meta.permissions());

    let mut builder = tempfile::Builder::new();
    builder.prefix(".config-base");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder
        .tempfile_in(&dir)
        .with_context(|| format!("creating temporary file in '{}'", dir.display()))?;
    if let Some(perms) = existing {
        tmp.as_file()
            .set_permissions(perms)
            .with_context(|| format!("copying permissions of '{}'", path.display()))?;
    }
    tmp.write_all(content.as_bytes())
        .context("writing config-base contents")?;
    tmp.as_file()
        .sync_all()
        .context("flushing config-base contents")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("moving config-base into place at '{}'", path.display()))?;

    let digest = format!("{:x}", Sha256::digest(content.as_bytes()));
    info!(path = %path.display(), sha256 = %digest, "wrote config-base");
    Ok(digest)
}
