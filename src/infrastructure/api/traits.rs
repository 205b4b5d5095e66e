//! Backend API trait
//!
//! The application layer holds this as `Arc<dyn SastApi>`; the reqwest
//! implementation lives in [`super::http`] and tests substitute wiremock-backed
//! or scripted implementations.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::ApiError;
use crate::application::pagination::Page;
use crate::application::surface::ProgressSession;
use crate::domain::{FileNode, KnownProject, ModuleRecord, VulnerabilityRecord};

/// Acknowledgement of a mutating call, with the service's display message.
#[derive(Debug, Clone, Default)]
pub struct Ack {
    pub message: Option<String>,
}

/// Result of a fresh project upload.
#[derive(Debug, Clone)]
pub struct CreatedProject {
    pub project_id: String,
    pub message: Option<String>,
}

/// Request/response contract of the remote SAST service.
#[async_trait]
pub trait SastApi: Send + Sync {
    /// Lookup by natural key. `Ok(None)` is the unknown-project branch of the
    /// lifecycle, not an error.
    async fn find_project(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<KnownProject>, ApiError>;

    /// Multipart upload of a fresh project archive; triggers server-side
    /// analysis. Upload progress is reported proportionally to bytes
    /// transferred, into the caller's progress session.
    async fn create_project(
        &self,
        archive: &Path,
        name: &str,
        version: &str,
        progress: Arc<dyn ProgressSession>,
    ) -> Result<CreatedProject, ApiError>;

    /// Re-upload into an existing project.
    async fn update_project(
        &self,
        project_id: &str,
        archive: &Path,
        name: &str,
        progress: Arc<dyn ProgressSession>,
    ) -> Result<Ack, ApiError>;

    /// Re-trigger analysis without re-uploading.
    async fn start_analysis(&self, project_id: &str) -> Result<Ack, ApiError>;

    /// Module severity summaries, paged.
    async fn list_modules(
        &self,
        project_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ModuleRecord>, ApiError>;

    /// Vulnerabilities of one module, paged.
    async fn list_vulnerabilities(
        &self,
        module_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<VulnerabilityRecord>, ApiError>;

    /// Full file/folder match subtree for a module. Not paginated.
    async fn get_file_tree(
        &self,
        module_id: &str,
        project_id: &str,
    ) -> Result<FileNode, ApiError>;

    /// Server-held reference copy of a file, for diffing partial matches.
    async fn get_reference_file(&self, file_id: &str) -> Result<String, ApiError>;
}
