//! Pull the packaged kernel config out of a verified package.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::model::KernelBuild;
use crate::process::{CommandRunner, CommandSpec};

/// In-package path of the config: `./lib/modules/<version>-<release>.<arch>/config`.
pub fn packaged_config_path(build: &KernelBuild, arch: &str) -> String {
    format!(
        "./lib/modules/{}-{}.{}/config",
        build.version, build.release, arch
    )
}

/// Extract the kernel config text from `package`.
///
/// The rpm payload is converted to a cpio archive in `work_dir`, then the
/// single config member is read out of it.
pub fn extract_config(
    runner: &dyn CommandRunner,
    package: &Path,
    build: &KernelBuild,
    arch: &str,
    work_dir: &Path,
) -> Result<String> {
    let member = packaged_config_path(build, arch);

    let payload = runner
        .run(&CommandSpec::new("rpm2cpio").arg(package))
        .with_context(|| format!("converting '{}' to cpio", package.display()))?;
    let payload_path = work_dir.join("payload.cpio");
    fs::write(&payload_path, &payload.stdout)
        .with_context(|| format!("writing '{}'", payload_path.display()))?;

    let output = runner
        .run(
            &CommandSpec::new("cpio")
                .args(["--quiet", "-i", "--to-stdout", "-F"])
                .arg(&payload_path)
                .arg(&member),
        )
        .with_context(|| format!("reading '{member}' from the package payload"))?;

    if output.stdout.is_empty() {
        bail!("'{}' not found in '{}'", member, package.display());
    }

    let config = String::from_utf8(output.stdout)
        .with_context(|| format!("'{member}' is not valid UTF-8"))?;
    info!(member = %member, bytes = config.len(), "extracted packaged config");
    Ok(config)
}
