//! Command dispatch
//!
//! The editor surface registers thin command handlers that forward here.
//! Every branch returns a `Result` and the dispatcher converts each failure
//! into exactly one error notification; nothing is fire-and-forget and
//! nothing panics the host.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::application::errors::ClientError;
use crate::application::lifecycle::{AnalysisLifecycle, PROJECT_VERSION};
use crate::application::surface::{EditorOps, Notifier};
use crate::application::tree::{FileDetail, ResultTreeController};
use crate::config::SettingsError;
use crate::domain::{FileNode, MatchType, ProjectRef};
use crate::infrastructure::api::SastApi;
use crate::presentation::view;

/// Commands exposed to the surrounding editor surface.
#[derive(Debug, Clone)]
pub enum Command {
    /// Check the selected folder; its basename becomes the project name
    CheckFolder { path: PathBuf },
    /// Check the workspace root under the given name
    CheckWorkspace { name: String, path: PathBuf },
    /// Reload the module pane for the configured project
    RefreshResults,
    /// Switch the vulnerability pane to a module
    ShowModuleVulnerabilities { module_id: String },
    /// Activate the module pane's load-more sentinel
    ShowMoreModules,
    /// Activate the vulnerability pane's load-more sentinel
    ShowMoreVulnerabilities,
    /// Open or diff an activated file leaf
    ShowFileDetails {
        node: FileNode,
        match_type: MatchType,
        project_root: PathBuf,
    },
}

/// Routes commands to the lifecycle and tree controller.
pub struct CommandDispatcher {
    lifecycle: AnalysisLifecycle,
    tree: Arc<ResultTreeController>,
    api: Arc<dyn SastApi>,
    notifier: Arc<dyn Notifier>,
    editor: Arc<dyn EditorOps>,
    settings: crate::config::Settings,
}

impl CommandDispatcher {
    pub fn new(
        lifecycle: AnalysisLifecycle,
        tree: Arc<ResultTreeController>,
        api: Arc<dyn SastApi>,
        notifier: Arc<dyn Notifier>,
        editor: Arc<dyn EditorOps>,
        settings: crate::config::Settings,
    ) -> Self {
        Self {
            lifecycle,
            tree,
            api,
            notifier,
            editor,
            settings,
        }
    }

    /// Run one command; failures end as a single error notification.
    pub async fn handle(&self, command: Command) {
        if let Err(e) = self.dispatch(command).await {
            warn!(error = %e, "command failed");
            self.notifier.error(&e.to_string());
        }
    }

    async fn dispatch(&self, command: Command) -> Result<(), ClientError> {
        match command {
            Command::CheckFolder { path } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or(ClientError::Configuration(
                        SettingsError::MissingProjectName,
                    ))?;
                self.check(ProjectRef::new(name, path)).await
            }
            Command::CheckWorkspace { name, path } => {
                self.check(ProjectRef::new(name, path)).await
            }
            Command::RefreshResults => {
                let project = self.current_project_id().await?;
                self.tree.refresh(&project.1).await?;
                self.notifier
                    .info(&format!("Results refreshed for {}.", project.0));
                Ok(())
            }
            Command::ShowModuleVulnerabilities { module_id } => {
                if let Some(record) = self.tree.select_module(&module_id).await? {
                    self.notifier
                        .status(&view::vulnerability_pane_title(&record));
                }
                Ok(())
            }
            Command::ShowMoreModules => self.tree.show_more_modules().await,
            Command::ShowMoreVulnerabilities => self.tree.show_more_vulnerabilities().await,
            Command::ShowFileDetails {
                node,
                match_type,
                project_root,
            } => {
                let detail = self
                    .tree
                    .file_detail(&node, match_type, &project_root)
                    .await?;
                match detail {
                    FileDetail::Open { local } => self.editor.open_file(&local),
                    FileDetail::Diff { local, reference } => {
                        let title = format!("remote ⟷ local: {}", node.name);
                        self.editor.show_diff(&local, reference, &title);
                    }
                }
                Ok(())
            }
        }
    }

    /// Run the lifecycle for `project` and reload results when warranted.
    async fn check(&self, project: ProjectRef) -> Result<(), ClientError> {
        let outcome = self.lifecycle.run_check(&project).await?;
        if outcome.should_refresh() {
            // The id may have been assigned during this very check.
            if let Some(known) = self.api.find_project(&project.name, PROJECT_VERSION).await? {
                self.tree.refresh(&known.project_id).await?;
            }
        }
        Ok(())
    }

    async fn current_project_id(&self) -> Result<(String, String), ClientError> {
        let project = self.settings.project()?;
        let known = self
            .api
            .find_project(&project.name, PROJECT_VERSION)
            .await?
            .ok_or_else(|| {
                ClientError::Network(crate::infrastructure::api::ApiError::Service(
                    "project is not known to the service yet; run a check first".into(),
                ))
            })?;
        Ok((project.name, known.project_id))
    }
}
