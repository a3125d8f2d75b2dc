//! Data shared between pipeline stages.

use std::collections::{BTreeMap, BTreeSet};

/// One tagged build of the kernel package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelBuild {
    /// Numbered distribution release the build was discovered under.
    pub release_id: u32,
    /// Build tag the build was listed from (e.g. `f39-updates`).
    pub target: String,
    /// Upstream kernel version (e.g. `6.2.9`).
    pub version: String,
    /// Distribution release string (e.g. `300.fc39`).
    pub release: String,
    pub build_id: i64,
}

impl KernelBuild {
    /// `kernel-core-<version>-<release>`, without architecture or extension.
    pub fn package_spec(&self, core_package: &str) -> String {
        format!("{}-{}-{}", core_package, self.version, self.release)
    }
}

/// Release id -> build tags belonging to that release.
///
/// Ordered so iteration is deterministic; the query walks it in reverse.
pub type ReleaseTargetMap = BTreeMap<u32, BTreeSet<String>>;

/// The build chosen as the closest match for the target kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedBuild(pub KernelBuild);

impl std::ops::Deref for SelectedBuild {
    type Target = KernelBuild;

    fn deref(&self) -> &KernelBuild {
        &self.0
    }
}
