//! The config-base pipeline.
//!
//! ```text
//! catalog -> query -> select -> fetch -> verify -> extract -> regenerate -> write
//! ```
//!
//! Stages run strictly in order, each consuming only the previous stage's
//! output. Every intermediate file lives in one [`Scratch`] directory that is
//! removed when the run ends. `config-base` is written last, only after all
//! earlier stages succeeded.

use std::path::PathBuf;
use tracing::info;

use crate::config::Settings;
use crate::error::{PipelineError, Stage, StageContext};
use crate::extract::extract_config;
use crate::fetch::{download_package, FetchRequest};
use crate::koji::catalog::discover_releases;
use crate::koji::query::list_kernel_builds;
use crate::koji::BuildService;
use crate::preflight;
use crate::process::CommandRunner;
use crate::regen::{regenerate, write_config_base, RegenRequest};
use crate::scratch::Scratch;
use crate::select::{closest_build, latest_per_release};
use crate::verify::verify_signature;

/// Per-run inputs.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub kernel_dir: PathBuf,
    pub keys_dir: PathBuf,
    pub include_rc: bool,
    pub include_testing: bool,
    /// Check for host tools on PATH before starting.
    pub check_host_tools: bool,
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// No build is close to the target kernel; nothing was downloaded.
    NoUpdate,
    Written {
        /// `kernel-core-<version>-<release>`
        package: String,
        path: PathBuf,
        sha256: String,
    },
}

/// External clients and settings for a run.
pub struct Pipeline<'a> {
    service: &'a dyn BuildService,
    runner: &'a dyn CommandRunner,
    settings: &'a Settings,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        service: &'a dyn BuildService,
        runner: &'a dyn CommandRunner,
        settings: &'a Settings,
    ) -> Self {
        Self {
            service,
            runner,
            settings,
        }
    }

    pub fn run(&self, options: &PipelineOptions) -> Result<PipelineOutcome, PipelineError> {
        let settings = self.settings;

        let tree = preflight::check_kernel_dir(&options.kernel_dir)
            .map_err(PipelineError::MissingPrerequisite)?;
        preflight::check_keys_dir(&options.keys_dir)
            .map_err(PipelineError::MissingPrerequisite)?;
        if options.check_host_tools {
            preflight::check_host_tools().map_err(PipelineError::MissingPrerequisite)?;
        }
        info!(version = %tree.version, dir = %tree.dir.display(), "target kernel");

        let releases =
            discover_releases(self.service, options.include_testing).stage(Stage::Catalog)?;
        let listing = list_kernel_builds(
            self.service,
            &releases,
            &settings.package,
            options.include_rc,
        )
        .stage(Stage::Query)?;
        if listing.listed == 0 {
            return Err(PipelineError::NoBuilds);
        }

        let latest = latest_per_release(&listing.builds);
        let Some(chosen) = closest_build(&latest, &tree.version) else {
            return Ok(PipelineOutcome::NoUpdate);
        };

        let key_file = settings.key_file(&options.keys_dir, chosen.release_id);
        preflight::check_key_file(&key_file).map_err(PipelineError::MissingPrerequisite)?;

        let scratch_base = settings.resolve_scratch_base().stage(Stage::Scratch)?;
        let scratch = Scratch::create_in(&scratch_base).stage(Stage::Scratch)?;

        let fetch = FetchRequest {
            build: &chosen,
            core_package: &settings.core_package,
            arch: &settings.arch,
            include_testing: options.include_testing,
        };
        let package_spec = fetch.package_spec();
        let artifact = download_package(self.runner, &fetch, scratch.path()).stage(Stage::Fetch)?;

        verify_signature(
            self.runner,
            &artifact,
            &key_file,
            &scratch.join("rpmdb"),
            &settings.confirmation_phrase,
        )
        .stage(Stage::Verify)?;

        let raw_config = extract_config(
            self.runner,
            &artifact,
            &chosen,
            &settings.arch,
            scratch.path(),
        )
        .stage(Stage::Extract)?;

        let source_dir_name = tree.source_dir_name();
        let config_base = regenerate(
            self.runner,
            &RegenRequest {
                raw_config: &raw_config,
                archive: &tree.archive,
                source_dir_name: &source_dir_name,
                package_spec: &package_spec,
                strip_lines: settings.strip_lines,
            },
            scratch.path(),
        )
        .stage(Stage::Regenerate)?;

        let path = tree.config_base();
        let sha256 = write_config_base(&path, &config_base).stage(Stage::Persist)?;

        Ok(PipelineOutcome::Written {
            package: package_spec,
            path,
            sha256,
        })
    }
}
