//! Version selection: reduce discovered builds to one per release, then pick
//! the release closest to the target kernel.

use std::collections::BTreeMap;
use tracing::info;

use crate::model::{KernelBuild, SelectedBuild};
use crate::version::{is_close, DottedVersion};

/// Keep the highest-versioned build of each release.
///
/// On equal versions the build seen first is kept. The result is ordered by
/// release id, descending.
pub fn latest_per_release(builds: &[KernelBuild]) -> Vec<KernelBuild> {
    let mut latest: BTreeMap<u32, (DottedVersion, &KernelBuild)> = BTreeMap::new();

    for build in builds {
        let version = DottedVersion::parse(&build.version);
        let newer = latest
            .get(&build.release_id)
            .map_or(true, |(best, _)| version > *best);
        if newer {
            latest.insert(build.release_id, (version, build));
        }
    }

    latest
        .into_values()
        .rev()
        .map(|(_, build)| build.clone())
        .collect()
}

/// Pick the highest close build from the latest set.
///
/// Returns `None` when no build is close; that means there is nothing to
/// update, not a failure. Equal versions resolve to the higher release.
pub fn closest_build(latest: &[KernelBuild], target_version: &str) -> Option<SelectedBuild> {
    let chosen = latest
        .iter()
        .filter(|b| is_close(target_version, &b.version))
        .max_by(|a, b| {
            DottedVersion::parse(&a.version)
                .cmp(&DottedVersion::parse(&b.version))
                .then(a.release_id.cmp(&b.release_id))
        })
        .cloned()
        .map(SelectedBuild);

    match &chosen {
        Some(build) => info!(
            target = target_version,
            version = %build.version,
            release = %build.release,
            release_id = build.release_id,
            "selected closest build"
        ),
        None => info!(target = target_version, "no close build found"),
    }
    chosen
}
