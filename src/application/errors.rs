//! Application-level error taxonomy
//!
//! Every failure is caught at the operation boundary that initiated the async
//! task and converted to a user-visible notification; none propagate far
//! enough to crash the host. There is deliberately no retry layer: every
//! retry is a fresh user-initiated action.

use crate::config::SettingsError;
use crate::infrastructure::api::ApiError;
use crate::infrastructure::archive::ArchiveError;

/// Unified failure type surfaced through the notification path.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Missing URL/token/project configuration; blocks all network action
    #[error("configuration missing: {0}")]
    Configuration(#[from] SettingsError),

    /// Request failed, timed out, or decoded to an invalid payload
    #[error("request failed: {0}")]
    Network(#[from] ApiError),

    /// Progress connection closed before reaching 100%
    #[error("progress stream dropped before completion{}", reason_suffix(.reason))]
    StreamDropped { reason: Option<String> },

    /// Temporary archive could not be produced; aborts before any network call
    #[error("failed to archive project: {0}")]
    Archive(#[from] ArchiveError),
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(": {r}"),
        None => String::new(),
    }
}
