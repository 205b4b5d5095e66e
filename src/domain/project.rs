//! Project identity and analysis status

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Wire sentinel for an analysis that has not been queued yet.
const RATE_NOT_STARTED: i32 = -3;

/// A project as selected locally, before the server knows about it.
///
/// `name` is the natural key for server-side lookup; it is derived from the
/// local directory name when a check is triggered on a folder or workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    /// Natural key used for lookup-by-name
    pub name: String,
    /// Local directory the archive snapshot is taken from
    pub local_path: PathBuf,
}

impl ProjectRef {
    pub fn new(name: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            local_path: local_path.into(),
        }
    }
}

/// A project the server already knows: it has an id and an analysis rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownProject {
    /// Server-assigned identifier
    pub project_id: String,
    /// Last reported analysis status
    pub analysis_rate: AnalysisRate,
}

/// Server-reported completion status of a SAST scan.
///
/// This is the sole externally observed status signal; all lifecycle branching
/// keys off it. It is mutated only by server responses or progress-feed
/// events, never invented locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum AnalysisRate {
    /// Scan progress in `[0, 100]`; `100` means a completed analysis
    Percent(u8),
    /// Analysis has not been queued yet (wire sentinel `-3`)
    NotStarted,
    /// A prior upload or analysis errored; the exact cause is not recoverable
    /// from the status value
    Indeterminate,
}

impl AnalysisRate {
    /// Whether the last analysis ran to completion.
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Percent(100))
    }

    /// Progress baseline for a new subscription: sentinel states start at 0.
    pub fn baseline(self) -> u8 {
        match self {
            Self::Percent(p) => p,
            Self::NotStarted | Self::Indeterminate => 0,
        }
    }

    /// Short status label for notifications.
    pub fn status_label(self) -> &'static str {
        match self {
            Self::Percent(100) => "analysis complete",
            Self::Percent(_) => "analysis in progress",
            Self::NotStarted => "analysis not started",
            Self::Indeterminate => "previous analysis errored",
        }
    }
}

impl From<i32> for AnalysisRate {
    fn from(raw: i32) -> Self {
        match raw {
            0..=100 => Self::Percent(raw as u8),
            RATE_NOT_STARTED => Self::NotStarted,
            _ => Self::Indeterminate,
        }
    }
}

impl From<AnalysisRate> for i32 {
    fn from(rate: AnalysisRate) -> i32 {
        match rate {
            AnalysisRate::Percent(p) => i32::from(p),
            AnalysisRate::NotStarted => RATE_NOT_STARTED,
            AnalysisRate::Indeterminate => -1,
        }
    }
}
