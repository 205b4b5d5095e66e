//! Result tree orchestration
//!
//! Two independent lazily-loaded hierarchies: the flat module list, and — for
//! the selected module — its vulnerabilities plus its file/folder match tree.
//! Modules and vulnerabilities ride on [`PaginatedCollection`]s; the file
//! tree is a one-shot full-subtree fetch cached per module. Viewers read
//! snapshots synchronously and must not retain entries across a refresh.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::errors::ClientError;
use super::pagination::{FetchOutcome, Page, PageEntry, PageFetcher, PaginatedCollection};
use super::surface::{Notifier, ViewSink};
use crate::domain::{FileNode, MatchType, ModuleRecord, VulnerabilityRecord};
use crate::infrastructure::api::{ApiError, SastApi};

struct ModulePages {
    api: Arc<dyn SastApi>,
}

#[async_trait]
impl PageFetcher<ModuleRecord> for ModulePages {
    async fn fetch_page(
        &self,
        scope: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ModuleRecord>, ApiError> {
        self.api.list_modules(scope, page, page_size).await
    }
}

struct VulnerabilityPages {
    api: Arc<dyn SastApi>,
}

#[async_trait]
impl PageFetcher<VulnerabilityRecord> for VulnerabilityPages {
    async fn fetch_page(
        &self,
        scope: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<VulnerabilityRecord>, ApiError> {
        self.api.list_vulnerabilities(scope, page, page_size).await
    }
}

/// What the editor surface should do for an activated file leaf.
#[derive(Debug)]
pub enum FileDetail {
    /// Exact match: open the local file
    Open { local: PathBuf },
    /// Partial match: diff the local file against the server reference copy
    Diff {
        local: PathBuf,
        reference: ReferenceFileHandle,
    },
}

/// Server reference copy materialized as a disposable temp artifact.
///
/// The file is deleted when the handle is dropped; the editor surface keeps
/// it alive for as long as the diff view needs it.
#[derive(Debug)]
pub struct ReferenceFileHandle {
    temp: tempfile::TempPath,
}

impl ReferenceFileHandle {
    pub fn path(&self) -> &Path {
        &self.temp
    }
}

/// Controller behind the two linked result views.
pub struct ResultTreeController {
    api: Arc<dyn SastApi>,
    notifier: Arc<dyn Notifier>,
    view: Arc<dyn ViewSink>,
    modules: PaginatedCollection<ModuleRecord>,
    vulnerabilities: PaginatedCollection<VulnerabilityRecord>,
    file_trees: Mutex<HashMap<String, Arc<FileNode>>>,
    project_id: Mutex<Option<String>>,
}

impl ResultTreeController {
    pub fn new(
        api: Arc<dyn SastApi>,
        notifier: Arc<dyn Notifier>,
        view: Arc<dyn ViewSink>,
        page_size: usize,
    ) -> Self {
        let modules = PaginatedCollection::new(
            Arc::new(ModulePages { api: api.clone() }),
            page_size,
        );
        let vulnerabilities = PaginatedCollection::new(
            Arc::new(VulnerabilityPages { api: api.clone() }),
            page_size,
        );
        Self {
            api,
            notifier,
            view,
            modules,
            vulnerabilities,
            file_trees: Mutex::new(HashMap::new()),
            project_id: Mutex::new(None),
        }
    }

    /// Rescope to `project_id`, drop cached subtrees, and load the first
    /// module page. Run on root expansion and whenever an analysis completes.
    pub async fn refresh(&self, project_id: &str) -> Result<(), ClientError> {
        {
            let mut current = self.project_id.lock().expect("scope lock poisoned");
            *current = Some(project_id.to_string());
        }
        self.file_trees
            .lock()
            .expect("file tree lock poisoned")
            .clear();

        self.modules.reset(project_id);
        self.modules.fetch_next().await?;
        self.view.view_changed();
        if !self.modules.has_more() {
            self.notifier.info("All flagged modules fetched.");
        }
        Ok(())
    }

    /// Snapshot of the module pane, sentinel included while pages remain.
    pub fn module_view(&self) -> Vec<PageEntry<ModuleRecord>> {
        self.modules.current_view()
    }

    /// Explicit activation of the module pane's load-more sentinel.
    pub async fn show_more_modules(&self) -> Result<(), ClientError> {
        let outcome = self.modules.fetch_next().await?;
        if let FetchOutcome::Fetched { .. } = outcome {
            self.view.view_changed();
            self.notifier.info(&format!(
                "Fetched {} of {} modules.",
                self.modules.len(),
                self.modules.total_known()
            ));
            if !self.modules.has_more() {
                self.notifier.info("All flagged modules fetched.");
            }
        }
        Ok(())
    }

    /// Switch the vulnerability pane to `module_id` and load its first page.
    ///
    /// Returns the module record (when it is in the fetched set) so the
    /// surface can retitle the pane.
    pub async fn select_module(
        &self,
        module_id: &str,
    ) -> Result<Option<ModuleRecord>, ClientError> {
        self.vulnerabilities.reset(module_id);
        self.vulnerabilities.fetch_next().await?;
        self.view.view_changed();
        Ok(self.modules.find(|m| m.id == module_id))
    }

    /// Snapshot of the vulnerability pane for the selected module.
    pub fn vulnerability_view(&self) -> Vec<PageEntry<VulnerabilityRecord>> {
        self.vulnerabilities.current_view()
    }

    /// Explicit activation of the vulnerability pane's load-more sentinel.
    pub async fn show_more_vulnerabilities(&self) -> Result<(), ClientError> {
        let outcome = self.vulnerabilities.fetch_next().await?;
        if let FetchOutcome::Fetched { .. } = outcome {
            self.view.view_changed();
            self.notifier.info(&format!(
                "Fetched {} of {} vulnerabilities.",
                self.vulnerabilities.len(),
                self.vulnerabilities.total_known()
            ));
        }
        Ok(())
    }

    /// Full match subtree for a module; fetched once and cached until the
    /// next [`refresh`](Self::refresh).
    pub async fn expand_module(&self, module_id: &str) -> Result<Arc<FileNode>, ClientError> {
        if let Some(tree) = self
            .file_trees
            .lock()
            .expect("file tree lock poisoned")
            .get(module_id)
        {
            return Ok(tree.clone());
        }

        let project_id = self
            .project_id
            .lock()
            .expect("scope lock poisoned")
            .clone()
            .ok_or_else(|| {
                ClientError::Network(ApiError::Service(
                    "no project loaded; refresh the results first".into(),
                ))
            })?;

        let tree = Arc::new(self.api.get_file_tree(module_id, &project_id).await?);
        debug!(%module_id, leaves = tree.leaves().len(), "file tree fetched");
        self.file_trees
            .lock()
            .expect("file tree lock poisoned")
            .insert(module_id.to_string(), tree.clone());
        Ok(tree)
    }

    /// Flattened file leaves of a module's match tree, in server order.
    pub async fn file_leaves(&self, module_id: &str) -> Result<Vec<FileNode>, ClientError> {
        let tree = self.expand_module(module_id).await?;
        Ok(tree.leaves().into_iter().cloned().collect())
    }

    /// Resolve what to show for an activated file leaf.
    ///
    /// Exact matches open the local file; partial matches fetch the
    /// server-held reference copy into a temp artifact for diffing.
    pub async fn file_detail(
        &self,
        node: &FileNode,
        match_type: MatchType,
        project_root: &Path,
    ) -> Result<FileDetail, ClientError> {
        let local = project_root.join(&node.path);
        match match_type {
            MatchType::Exact => Ok(FileDetail::Open { local }),
            MatchType::Partial => {
                let file_id = node.file_id.as_deref().ok_or_else(|| {
                    ClientError::Network(ApiError::Decode(
                        "file node is missing its server file id".into(),
                    ))
                })?;
                let content = self.api.get_reference_file(file_id).await?;

                let mut temp = tempfile::NamedTempFile::new().map_err(ApiError::Io)?;
                temp.write_all(content.as_bytes()).map_err(ApiError::Io)?;
                Ok(FileDetail::Diff {
                    local,
                    reference: ReferenceFileHandle {
                        temp: temp.into_temp_path(),
                    },
                })
            }
        }
    }
}
