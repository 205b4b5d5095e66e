//! Flagged dependency modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vulnerability::Severity;

/// A third-party dependency the scan flagged, with severity counts.
///
/// Read-only snapshot of one entry from the module page listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    /// Server-assigned identifier
    pub id: String,
    /// Package name
    pub name: String,
    /// Detected version
    pub version: String,
    /// Where the module was sourced from (registry name)
    pub origin: Option<String>,
    /// Link to the module's registry page
    pub url: Option<String>,
    /// Total known vulnerabilities
    pub vulnerability_count: u32,
    /// High-severity count
    pub high: u32,
    /// Medium-severity count
    pub medium: u32,
    /// Low-severity count
    pub low: u32,
    /// Count of vulnerabilities outside the three main buckets
    pub other: u32,
    /// Recommended upgrade target, if the server has one
    pub recommended_version: Option<String>,
    /// Release date of the recommended version
    pub recommended_released_at: Option<DateTime<Utc>>,
    /// Latest published version
    pub latest_version: Option<String>,
    /// Release date of the latest version
    pub latest_released_at: Option<DateTime<Utc>>,
    /// How closely local files match the known vulnerable module
    pub match_type: super::MatchType,
}

impl ModuleRecord {
    /// Highest severity bucket with a non-zero count, or `None` when the
    /// module carries no vulnerabilities.
    pub fn highest_severity(&self) -> Option<Severity> {
        if self.high > 0 {
            Some(Severity::High)
        } else if self.medium > 0 {
            Some(Severity::Medium)
        } else if self.low > 0 {
            Some(Severity::Low)
        } else if self.other > 0 {
            Some(Severity::Other)
        } else {
            None
        }
    }
}
