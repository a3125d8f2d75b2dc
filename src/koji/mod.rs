//! Build-tracking service access.
//!
//! The pipeline only needs two hub calls: list build targets, and list the
//! builds of one package tagged into one tag. [`BuildService`] is that seam;
//! [`KojiCli`] implements it by driving the `koji` client's
//! `call --json-output` mode through a [`CommandRunner`].
//!
//! - [`catalog`] - release discovery (Build Catalog)
//! - [`query`] - kernel builds per release tag (Build Query)

pub mod catalog;
pub mod query;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::process::{CommandRunner, CommandSpec};

/// A build target as reported by the hub.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BuildTarget {
    pub name: String,
}

/// One entry of a `listTagged` response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TaggedBuild {
    pub version: String,
    pub release: String,
    pub build_id: i64,
}

/// Read-only view of the build-tracking service.
pub trait BuildService {
    fn build_targets(&self) -> Result<Vec<BuildTarget>>;

    fn tagged_builds(&self, tag: &str, package: &str) -> Result<Vec<TaggedBuild>>;
}

/// [`BuildService`] backed by the `koji` command-line client.
pub struct KojiCli<'a> {
    runner: &'a dyn CommandRunner,
    server: String,
}

impl<'a> KojiCli<'a> {
    pub fn new(runner: &'a dyn CommandRunner, server: impl Into<String>) -> Self {
        Self {
            runner,
            server: server.into(),
        }
    }

    fn call<T: DeserializeOwned>(&self, method: &str, params: &[String]) -> Result<Vec<T>> {
        let spec = CommandSpec::new("koji")
            .args(["--server", self.server.as_str(), "call", "--json-output", method])
            .args(params);
        let output = self
            .runner
            .run(&spec)
            .with_context(|| format!("calling koji hub method '{method}'"))?;
        parse_entries(&output.stdout, method)
    }
}

impl BuildService for KojiCli<'_> {
    fn build_targets(&self) -> Result<Vec<BuildTarget>> {
        self.call("getBuildTargets", &[])
    }

    fn tagged_builds(&self, tag: &str, package: &str) -> Result<Vec<TaggedBuild>> {
        self.call("listTagged", &[tag.to_string(), format!("package={package}")])
    }
}

/// Decode a JSON array, skipping entries that lack the fields we need.
fn parse_entries<T: DeserializeOwned>(stdout: &[u8], method: &str) -> Result<Vec<T>> {
    let raw: Vec<serde_json::Value> = serde_json::from_slice(stdout)
        .with_context(|| format!("parsing koji '{method}' response as a JSON array"))?;

    let mut entries = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<T>(value) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(method, error = %e, "skipping malformed koji entry"),
        }
    }
    Ok(entries)
}
