//! Job state vocabulary
//!
//! States travel as plain strings (`"queued"`, `"render:dorender"`, ...) so
//! that workers written against the nexrender protocol can read them as-is.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::job::ModelError;

/// Sub-state reported by a worker while a job is inside the render pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderStage {
    Setup,
    Predownload,
    Download,
    Postdownload,
    Prerender,
    Script,
    Dorender,
    Postrender,
    Cleanup,
}

impl RenderStage {
    pub const ALL: [RenderStage; 9] = [
        RenderStage::Setup,
        RenderStage::Predownload,
        RenderStage::Download,
        RenderStage::Postdownload,
        RenderStage::Prerender,
        RenderStage::Script,
        RenderStage::Dorender,
        RenderStage::Postrender,
        RenderStage::Cleanup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStage::Setup => "setup",
            RenderStage::Predownload => "predownload",
            RenderStage::Download => "download",
            RenderStage::Postdownload => "postdownload",
            RenderStage::Prerender => "prerender",
            RenderStage::Script => "script",
            RenderStage::Dorender => "dorender",
            RenderStage::Postrender => "postrender",
            RenderStage::Cleanup => "cleanup",
        }
    }
}

/// Lifecycle state of a render job
///
/// The store only ever moves a job to `Queued` (create) and `Picked`
/// (pickup). Every other transition is written by the caller through
/// update and is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JobState {
    Created,
    Queued,
    Picked,
    Started,
    Render(RenderStage),
    Finished,
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Queued => "queued",
            JobState::Picked => "picked",
            JobState::Started => "started",
            JobState::Render(RenderStage::Setup) => "render:setup",
            JobState::Render(RenderStage::Predownload) => "render:predownload",
            JobState::Render(RenderStage::Download) => "render:download",
            JobState::Render(RenderStage::Postdownload) => "render:postdownload",
            JobState::Render(RenderStage::Prerender) => "render:prerender",
            JobState::Render(RenderStage::Script) => "render:script",
            JobState::Render(RenderStage::Dorender) => "render:dorender",
            JobState::Render(RenderStage::Postrender) => "render:postrender",
            JobState::Render(RenderStage::Cleanup) => "render:cleanup",
            JobState::Finished => "finished",
            JobState::Error => "error",
        }
    }

    /// `finished` and `error` make a job eligible for the retention sweep
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Error)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s {
            "created" => JobState::Created,
            "queued" => JobState::Queued,
            "picked" => JobState::Picked,
            "started" => JobState::Started,
            "finished" => JobState::Finished,
            "error" => JobState::Error,
            other => {
                let stage = other
                    .strip_prefix("render:")
                    .and_then(|stage| RenderStage::ALL.into_iter().find(|s| s.as_str() == stage))
                    .ok_or_else(|| ModelError::UnknownState(other.to_string()))?;
                JobState::Render(stage)
            }
        };

        Ok(state)
    }
}

impl TryFrom<String> for JobState {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, ModelError> {
        value.parse()
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_string()
    }
}
