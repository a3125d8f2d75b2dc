//! Release discovery.
//!
//! Every hub target named exactly `f<N>` is a release. Each release maps to
//! its own tag plus `f<N>-updates`, and `f<N>-updates-testing` when testing
//! builds were asked for.

use anyhow::{Context, Result};
use regex::Regex;
use tracing::info;

use super::BuildService;
use crate::model::ReleaseTargetMap;

const RELEASE_TARGET_PATTERN: &str = r"^f(\d+)$";

/// Build the release -> tags map from the hub's target list.
pub fn discover_releases(
    service: &dyn BuildService,
    include_testing: bool,
) -> Result<ReleaseTargetMap> {
    let pattern = Regex::new(RELEASE_TARGET_PATTERN).context("compiling release target pattern")?;
    let targets = service
        .build_targets()
        .context("listing build targets")?;

    let mut releases = ReleaseTargetMap::new();
    for target in &targets {
        let Some(caps) = pattern.captures(&target.name) else {
            continue;
        };
        // Digits-only but possibly too large for u32; such a target is not a release.
        let Ok(release_id) = caps[1].parse::<u32>() else {
            continue;
        };
        releases
            .entry(release_id)
            .or_default()
            .insert(target.name.clone());
    }

    for (release_id, tags) in releases.iter_mut() {
        tags.insert(format!("f{release_id}-updates"));
        if include_testing {
            tags.insert(format!("f{release_id}-updates-testing"));
        }
    }

    let ids: Vec<u32> = releases.keys().copied().collect();
    info!(releases = ?ids, "discovered release targets");
    Ok(releases)
}
