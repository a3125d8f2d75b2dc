//! Package download, scoped to the chosen release's repositories.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::model::SelectedBuild;
use crate::process::{CommandRunner, CommandSpec};

/// Suffix marking a downloaded package whose signature has not been checked.
pub const UNTRUSTED_SUFFIX: &str = ".untrusted";

/// What to download and from where.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub build: &'a SelectedBuild,
    pub core_package: &'a str,
    pub arch: &'a str,
    pub include_testing: bool,
}

impl FetchRequest<'_> {
    /// `kernel-core-<version>-<release>`
    pub fn package_spec(&self) -> String {
        self.build.package_spec(self.core_package)
    }

    /// File name dnf produces for the package.
    pub fn expected_file_name(&self) -> String {
        format!("{}.{}.rpm", self.package_spec(), self.arch)
    }

    fn download_command(&self, dest: &Path) -> CommandSpec {
        let mut spec = CommandSpec::new("dnf")
            .args(["-q", "download"])
            .arg(self.package_spec())
            .arg(format!("--arch={}", self.arch))
            .args(["--disablerepo=*", "--enablerepo=fedora", "--enablerepo=updates"]);
        if self.include_testing {
            spec = spec.arg("--enablerepo=updates-testing");
        }
        spec.arg(format!("--releasever={}", self.build.release_id))
            .current_dir(dest)
    }
}

/// Download the package into `dest` and mark it untrusted.
///
/// Returns the path of the renamed `<file>.untrusted` artifact.
pub fn download_package(
    runner: &dyn CommandRunner,
    request: &FetchRequest<'_>,
    dest: &Path,
) -> Result<PathBuf> {
    let package = request.package_spec();
    info!(package = %package, release_id = request.build.release_id, "downloading package");

    runner
        .run(&request.download_command(dest))
        .with_context(|| format!("downloading '{package}'"))?;

    let downloaded = dest.join(request.expected_file_name());
    if !downloaded.is_file() {
        bail!(
            "downloaded package '{}' not found in '{}'",
            request.expected_file_name(),
            dest.display()
        );
    }

    let untrusted = dest.join(format!("{}{}", request.expected_file_name(), UNTRUSTED_SUFFIX));
    fs::rename(&downloaded, &untrusted).with_context(|| {
        format!(
            "marking '{}' untrusted as '{}'",
            downloaded.display(),
            untrusted.display()
        )
    })?;

    Ok(untrusted)
}
