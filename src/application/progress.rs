//! Live analysis-progress subscription
//!
//! A [`ProgressChannel`] owns at most one subscription for its lifetime:
//! `connecting → active → {completed | failed | closed}`, terminal states
//! final. `Failed` means the connection or a frame errored; `Closed` means
//! the peer ended the stream before reporting 100%. Watching again requires
//! a new instance; starting a second `watch` on a live channel is the
//! caller's responsibility to avoid.
//!
//! Each watch opens its own progress session so its increments accumulate
//! against a fresh window. The session accumulates increments, so the channel
//! reports `p - last_reported` for every event, never the absolute value —
//! replaying an absolute would over-report. Server percentages are
//! monotonically non-decreasing; a regression is not expected and passes
//! through as a negative increment rather than being corrected here.
//!
//! Completion is signalled by returning `Ok`; the caller refreshes the result
//! tree on it. A drop before 100% returns [`ClientError::StreamDropped`], so
//! "completed" and "dropped mid-flight" stay distinguishable and no refresh
//! happens.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use super::errors::ClientError;
use super::surface::{Notifier, ProgressReporter};
use crate::domain::AnalysisRate;
use crate::infrastructure::progress_feed::ProgressFeed;

/// Lifecycle of one progress subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Connecting,
    Active,
    /// The server reported 100%
    Completed,
    /// The connection or a frame errored
    Failed,
    /// The peer ended the stream before reporting 100%
    Closed,
}

impl SubscriptionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Closed)
    }
}

/// Single-use watcher translating feed events into progress increments.
pub struct ProgressChannel {
    feed: Arc<dyn ProgressFeed>,
    reporter: Arc<dyn ProgressReporter>,
    notifier: Arc<dyn Notifier>,
    state: SubscriptionState,
}

impl ProgressChannel {
    pub fn new(
        feed: Arc<dyn ProgressFeed>,
        reporter: Arc<dyn ProgressReporter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            feed,
            reporter,
            notifier,
            state: SubscriptionState::Connecting,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Subscribe to `project_id` and watch until completion or drop.
    ///
    /// The displayed progress baselines at `initial_rate` (0 for sentinel
    /// states); the baseline is reported once when the subscription opens.
    pub async fn watch(
        &mut self,
        project_id: &str,
        project_name: &str,
        initial_rate: AnalysisRate,
    ) -> Result<(), ClientError> {
        let mut stream = match self.feed.subscribe(project_id).await {
            Ok(stream) => stream,
            Err(e) => {
                self.state = SubscriptionState::Failed;
                return Err(ClientError::StreamDropped {
                    reason: Some(e.to_string()),
                });
            }
        };

        self.state = SubscriptionState::Active;
        let session = self
            .reporter
            .begin(&format!("{project_name}: analysis"));
        let baseline = f64::from(initial_rate.baseline());
        session.report(baseline, "waiting for analysis");
        self.notifier
            .status(&format!("{project_name}: analysis started"));

        let mut last_reported = baseline;
        while let Some(event) = stream.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    warn!(%project_id, error = %e, "progress subscription errored");
                    self.state = SubscriptionState::Failed;
                    return Err(ClientError::StreamDropped {
                        reason: Some(e.to_string()),
                    });
                }
            };

            let percent = event.percent;
            let increment = percent - last_reported;
            last_reported = percent;
            debug!(%project_id, percent, increment, "progress event");
            session.report(increment, &format!("analyzing, {percent}%"));
            self.notifier
                .status(&format!("{project_name}: analyzing {percent}%"));

            if percent >= 100.0 {
                self.state = SubscriptionState::Completed;
                self.notifier
                    .info(&format!("{project_name}: analysis complete"));
                self.notifier
                    .status(&format!("{project_name}: analysis complete"));
                return Ok(());
            }
        }

        // Connection closed before reaching 100%. No automatic reconnect.
        warn!(%project_id, "progress connection closed before completion");
        self.state = SubscriptionState::Closed;
        self.notifier
            .status(&format!("{project_name}: analysis errored"));
        Err(ClientError::StreamDropped { reason: None })
    }
}
