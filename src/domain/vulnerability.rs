//! Vulnerability records and severity levels

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Defect severity as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    #[serde(alias = "mid", alias = "middle")]
    Medium,
    Low,
    #[serde(other)]
    Other,
}

impl Severity {
    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Other => "other",
        }
    }

    /// Theme-color token the editor surface resolves to an actual color
    pub fn color_token(self) -> &'static str {
        match self {
            Self::High => "severity.high",
            Self::Medium => "severity.medium",
            Self::Low => "severity.low",
            Self::Other => "severity.other",
        }
    }
}

/// A single known vulnerability affecting a flagged module.
///
/// Read-only snapshot of server-reported fields; decoded fail-closed, so every
/// required field must be present in the page response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRecord {
    /// Server-assigned identifier
    pub id: String,
    /// Advisory name (CVE or vendor identifier)
    pub name: String,
    /// Severity bucket
    pub severity: Severity,
    /// Display score shown next to the name
    pub score: String,
    /// Link to the advisory
    pub url: Option<String>,
    /// Vulnerability category (e.g. injection, overflow)
    pub category: Option<String>,
    /// Advisory publication date
    pub released_at: Option<DateTime<Utc>>,
    /// CVSS base score
    pub base_score: Option<f64>,
    /// CVSS exploitability sub-score
    pub exploitability_score: Option<f64>,
    /// CVSS impact sub-score
    pub impact_score: Option<f64>,
}
