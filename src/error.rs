//! Failure taxonomy of the pipeline.
//!
//! Stage internals return `anyhow` errors with context; the orchestrator
//! classifies them here so the caller sees which stage failed.

use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Catalog,
    Query,
    Scratch,
    Fetch,
    Verify,
    Extract,
    Regenerate,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Catalog => "build catalog",
            Stage::Query => "build query",
            Stage::Scratch => "scratch setup",
            Stage::Fetch => "package fetch",
            Stage::Verify => "signature check",
            Stage::Extract => "config extraction",
            Stage::Regenerate => "config regeneration",
            Stage::Persist => "config-base write",
        })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing local prerequisite: {0:#}")]
    MissingPrerequisite(anyhow::Error),

    #[error("no kernel builds found from the build service")]
    NoBuilds,

    #[error("{stage} failed: {cause:#}")]
    Stage { stage: Stage, cause: anyhow::Error },
}

impl PipelineError {
    /// Stage that produced the failure, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Attribute a stage's error to that stage.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> StageContext<T> for anyhow::Result<T> {
    fn stage(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|cause| PipelineError::Stage { stage, cause })
    }
}
