//! Signature verification against a single release key.
//!
//! The key is imported into a throwaway rpm database inside the scratch
//! directory; the system trust store is never consulted.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::process::{CommandRunner, CommandSpec};

/// Check `artifact` against `key_file` using a private key database at `db_dir`.
///
/// Passes only if `rpmkeys --checksig` exits zero AND prints
/// `confirmation_phrase`.
pub fn verify_signature(
    runner: &dyn CommandRunner,
    artifact: &Path,
    key_file: &Path,
    db_dir: &Path,
    confirmation_phrase: &str,
) -> Result<()> {
    fs::create_dir_all(db_dir)
        .with_context(|| format!("creating key database '{}'", db_dir.display()))?;

    runner
        .run(
            &CommandSpec::new("rpmkeys")
                .arg("--dbpath")
                .arg(db_dir)
                .arg("--import")
                .arg(key_file),
        )
        .with_context(|| format!("importing key '{}'", key_file.display()))?;

    let output = runner
        .run(
            &CommandSpec::new("rpmkeys")
                .arg("--dbpath")
                .arg(db_dir)
                .arg("--checksig")
                .arg(artifact),
        )
        .with_context(|| format!("checking signature of '{}'", artifact.display()))?;

    let stdout = output.stdout_lossy();
    if !stdout.contains(confirmation_phrase) {
        bail!(
            "signature check of '{}' did not report '{}': {}",
            artifact.display(),
            confirmation_phrase,
            stdout.trim()
        );
    }

    info!(artifact = %artifact.display(), "signature verified");
    Ok(())
}
