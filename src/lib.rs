//! Baseline kernel config from a signed distribution kernel.
//!
//! Given a kernel directory holding a `version` file (e.g. `6.1`) and the
//! matching `linux-<version>.tar`, this crate finds the Fedora kernel build
//! closest to that version, downloads `kernel-core` for it, checks the
//! package signature against the release key, pulls out the packaged
//! config, and regenerates it against the target source tree with
//! `make olddefconfig`. The result is written to `config-base`.
//!
//! # Architecture
//!
//! ```text
//! koji::catalog   releases + tags from the hub
//!      │
//! koji::query     kernel builds per tag
//!      │
//! select          latest per release, then closest to target
//!      │
//! fetch           dnf download, marked .untrusted
//!      │
//! verify          rpmkeys against a private key db
//!      │
//! extract         rpm2cpio | cpio the packaged config
//!      │
//! regen           olddefconfig, strip header, add provenance
//! ```
//!
//! External clients sit behind two traits, [`koji::BuildService`] and
//! [`process::CommandRunner`], so the whole pipeline can run against fakes.
//!
//! # Example
//!
//! ```rust,ignore
//! use kernel_config_base::{KojiCli, Pipeline, PipelineOptions, Settings, SystemRunner};
//!
//! let settings = Settings::default();
//! let runner = SystemRunner;
//! let koji = KojiCli::new(&runner, settings.koji_server.clone());
//! let outcome = Pipeline::new(&koji, &runner, &settings).run(&PipelineOptions {
//!     kernel_dir: "linux".into(),
//!     keys_dir: "keys".into(),
//!     include_rc: false,
//!     include_testing: false,
//!     check_host_tools: true,
//! })?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod koji;
pub mod model;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod regen;
pub mod scratch;
pub mod select;
pub mod telemetry;
pub mod verify;
pub mod version;

pub use config::Settings;
pub use error::{PipelineError, Stage};
pub use koji::{BuildService, KojiCli};
pub use model::{KernelBuild, ReleaseTargetMap, SelectedBuild};
pub use pipeline::{Pipeline, PipelineOptions, PipelineOutcome};
pub use process::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
