//! Kernel builds tagged for each release.

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::BuildService;
use crate::model::{KernelBuild, ReleaseTargetMap};

/// Result of querying every release tag.
#[derive(Debug, Clone, Default)]
pub struct BuildListing {
    /// Builds that passed the release-candidate filter.
    pub builds: Vec<KernelBuild>,
    /// Entries the service returned before filtering.
    pub listed: usize,
}

/// Whether a build's release string marks a release candidate.
pub fn is_release_candidate(release: &str) -> bool {
    release.to_ascii_lowercase().contains("rc")
}

/// List every build of `package` tagged into each release's tags.
///
/// Releases are visited from highest to lowest. Release candidates are
/// dropped unless `include_rc` is set; nothing else is filtered.
pub fn list_kernel_builds(
    service: &dyn BuildService,
    releases: &ReleaseTargetMap,
    package: &str,
    include_rc: bool,
) -> Result<BuildListing> {
    let mut listing = BuildListing::default();

    for (&release_id, tags) in releases.iter().rev() {
        for tag in tags {
            let tagged = service
                .tagged_builds(tag, package)
                .with_context(|| format!("listing '{package}' builds tagged '{tag}'"))?;
            debug!(tag = %tag, count = tagged.len(), "listed tagged builds");
            listing.listed += tagged.len();

            for build in tagged {
                if !include_rc && is_release_candidate(&build.release) {
                    continue;
                }
                listing.builds.push(KernelBuild {
                    release_id,
                    target: tag.clone(),
                    version: build.version,
                    release: build.release,
                    build_id: build.build_id,
                });
            }
        }
    }

    info!(
        listed = listing.listed,
        kept = listing.builds.len(),
        "collected kernel builds"
    );
    Ok(listing)
}
