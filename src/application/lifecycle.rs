//! Analysis lifecycle state machine
//!
//! Decides the next action for a project from its server-reported status and
//! executes it: upload, re-upload, resume watching, or fetch existing
//! results. The decision itself is a pure function of the lookup result so
//! the branch table stays testable without any I/O.
//!
//! Branches (`rate` is the server-reported [`AnalysisRate`]):
//!
//! | server state            | action                                        |
//! |-------------------------|-----------------------------------------------|
//! | unknown (lookup miss)   | archive + fresh upload + watch                |
//! | `Percent(100)`          | prompt: re-analyze / re-upload / fetch results |
//! | `Percent(0..100)`, `NotStarted` | resume watching, no upload            |
//! | `Indeterminate`         | prompt: re-upload or re-trigger only          |
//!
//! Every upload branch runs strictly: archive → upload (with byte-proportional
//! progress) → watch. The archive handle is released after the upload attempt
//! completes or fails, so no temp file leaks on either path. A prompt
//! dismissal is a valid terminal no-op.

use std::sync::Arc;

use tracing::info;

use super::errors::ClientError;
use super::progress::ProgressChannel;
use super::surface::{Notifier, ProgressReporter, RecheckChoice, RecoverChoice, UserPrompt};
use crate::domain::{AnalysisRate, KnownProject, ProjectRef};
use crate::infrastructure::api::SastApi;
use crate::infrastructure::archive::Archiver;
use crate::infrastructure::progress_feed::ProgressFeed;

/// Project version tag under which editor uploads are registered.
pub const PROJECT_VERSION: &str = "vscode";

/// Next action derived from the server-reported status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Project unknown to the server: archive, upload, watch
    FreshUpload,
    /// Analysis previously completed: ask the user what to do
    PromptRecheck(KnownProject),
    /// Analysis queued or in progress: resume watching, no new upload
    Watch(KnownProject),
    /// Prior upload/analysis errored: ask whether to re-upload first
    PromptRecover(KnownProject),
}

/// Terminal outcome of one user-initiated check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Analysis ran to completion; results should be (re)loaded
    AnalysisCompleted,
    /// Existing results were chosen without re-analysis; load them
    ResultsReady,
    /// The user dismissed every offered action
    Declined,
}

impl CheckOutcome {
    /// Whether the result tree should refresh after this outcome.
    pub fn should_refresh(self) -> bool {
        matches!(self, Self::AnalysisCompleted | Self::ResultsReady)
    }
}

/// Pure decision table over the lookup result.
pub fn decide(lookup: Option<KnownProject>) -> NextAction {
    match lookup {
        None => NextAction::FreshUpload,
        Some(known) if known.analysis_rate.is_complete() => NextAction::PromptRecheck(known),
        Some(known) => match known.analysis_rate {
            AnalysisRate::Indeterminate => NextAction::PromptRecover(known),
            AnalysisRate::Percent(_) | AnalysisRate::NotStarted => NextAction::Watch(known),
        },
    }
}

/// Orchestrates one check from lookup to watched completion.
pub struct AnalysisLifecycle {
    api: Arc<dyn SastApi>,
    archiver: Arc<dyn Archiver>,
    feed: Arc<dyn ProgressFeed>,
    prompt: Arc<dyn UserPrompt>,
    notifier: Arc<dyn Notifier>,
    reporter: Arc<dyn ProgressReporter>,
}

impl AnalysisLifecycle {
    pub fn new(
        api: Arc<dyn SastApi>,
        archiver: Arc<dyn Archiver>,
        feed: Arc<dyn ProgressFeed>,
        prompt: Arc<dyn UserPrompt>,
        notifier: Arc<dyn Notifier>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            api,
            archiver,
            feed,
            prompt,
            notifier,
            reporter,
        }
    }

    /// Look the project up and run the appropriate branch to its end.
    pub async fn run_check(&self, project: &ProjectRef) -> Result<CheckOutcome, ClientError> {
        let lookup = self
            .api
            .find_project(&project.name, PROJECT_VERSION)
            .await?;

        match decide(lookup) {
            NextAction::FreshUpload => self.fresh_upload(project).await,
            NextAction::Watch(known) => {
                info!(project = %project.name, "resuming progress watch");
                self.watch(&known.project_id, project, known.analysis_rate)
                    .await
            }
            NextAction::PromptRecheck(known) => self.recheck(known, project).await,
            NextAction::PromptRecover(known) => self.recover(known, project).await,
        }
    }

    async fn recheck(
        &self,
        known: KnownProject,
        project: &ProjectRef,
    ) -> Result<CheckOutcome, ClientError> {
        match self.prompt.recheck_completed(&project.name).await {
            Some(RecheckChoice::Reanalyze) => self.start_and_watch(&known.project_id, project).await,
            Some(RecheckChoice::ReuploadAndReanalyze) => {
                self.reupload(&known.project_id, project).await?;
                self.start_and_watch(&known.project_id, project).await
            }
            Some(RecheckChoice::FetchResults) => Ok(CheckOutcome::ResultsReady),
            None => Ok(CheckOutcome::Declined),
        }
    }

    async fn recover(
        &self,
        known: KnownProject,
        project: &ProjectRef,
    ) -> Result<CheckOutcome, ClientError> {
        let status = known.analysis_rate.status_label();
        match self.prompt.recover_failed(&project.name, status).await {
            Some(RecoverChoice::Reupload) => {
                self.reupload(&known.project_id, project).await?;
                self.start_and_watch(&known.project_id, project).await
            }
            Some(RecoverChoice::ReanalyzeOnly) => {
                self.start_and_watch(&known.project_id, project).await
            }
            None => Ok(CheckOutcome::Declined),
        }
    }

    /// Archive + create + watch, for a project the server has never seen.
    async fn fresh_upload(&self, project: &ProjectRef) -> Result<CheckOutcome, ClientError> {
        let handle = self.archiver.archive(&project.local_path).await?;
        // The upload owns its progress window; the watch opens another.
        let session = self
            .reporter
            .begin(&format!("{}: uploading", project.name));
        let created = self
            .api
            .create_project(handle.path(), &project.name, PROJECT_VERSION, session)
            .await;
        // Cleanup must run whether the upload succeeded or failed.
        handle.release();
        let created = created?;

        if let Some(message) = created.message {
            self.notifier.info(&message);
        }
        info!(project = %project.name, project_id = %created.project_id, "project uploaded");
        self.watch(&created.project_id, project, AnalysisRate::NotStarted)
            .await
    }

    /// Archive + re-upload into an existing project.
    async fn reupload(&self, project_id: &str, project: &ProjectRef) -> Result<(), ClientError> {
        let handle = self.archiver.archive(&project.local_path).await?;
        let session = self
            .reporter
            .begin(&format!("{}: uploading", project.name));
        let ack = self
            .api
            .update_project(project_id, handle.path(), &project.name, session)
            .await;
        handle.release();
        let ack = ack?;

        if let Some(message) = ack.message {
            self.notifier.info(&message);
        }
        info!(project = %project.name, %project_id, "project source updated");
        Ok(())
    }

    /// Re-trigger analysis without uploading, then watch from a zero baseline
    /// (the server restarts reporting for a fresh run).
    async fn start_and_watch(
        &self,
        project_id: &str,
        project: &ProjectRef,
    ) -> Result<CheckOutcome, ClientError> {
        let ack = self.api.start_analysis(project_id).await?;
        if let Some(message) = ack.message {
            self.notifier.info(&message);
        }
        self.watch(project_id, project, AnalysisRate::NotStarted)
            .await
    }

    async fn watch(
        &self,
        project_id: &str,
        project: &ProjectRef,
        initial_rate: AnalysisRate,
    ) -> Result<CheckOutcome, ClientError> {
        let mut channel = ProgressChannel::new(
            self.feed.clone(),
            self.reporter.clone(),
            self.notifier.clone(),
        );
        channel
            .watch(project_id, &project.name, initial_rate)
            .await?;
        Ok(CheckOutcome::AnalysisCompleted)
    }
}
