//! reqwest implementation of the backend API

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::traits::{Ack, CreatedProject, SastApi};
use super::ApiError;
use crate::application::pagination::Page;
use crate::application::surface::ProgressSession;
use crate::config::Connection;
use crate::domain::{AnalysisRate, FileNode, KnownProject, ModuleRecord, VulnerabilityRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Uploads of large archives can legitimately take a long time.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(7200);

/// Standard response envelope of the service. Both fields may be absent.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoundProject {
    project_id: String,
    analysis_rate: i32,
}

#[derive(Debug, Deserialize)]
struct ReferenceFile {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    module_id: Option<&'a str>,
    page: usize,
    page_size: usize,
}

/// HTTP client for the remote SAST service.
pub struct HttpSastApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpSastApi {
    pub fn new(connection: &Connection) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("sastlink/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: connection.base_url.clone(),
            token: connection.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: Response,
    ) -> Result<Envelope<T>, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn require_data<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
        envelope
            .data
            .ok_or_else(|| ApiError::Decode("response envelope carried no data".into()))
    }

    /// Multipart file part that reports upload progress as byte increments
    /// scaled to percentage points of the total.
    async fn progress_part(
        archive: &Path,
        file_name: String,
        progress: Arc<dyn ProgressSession>,
    ) -> Result<Part, ApiError> {
        let file = tokio::fs::File::open(archive).await?;
        let total = file.metadata().await?.len().max(1);
        let sent = Arc::new(AtomicU64::new(0));

        let stream = ReaderStream::new(file).inspect_ok(move |chunk| {
            let done = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
            let increment = chunk.len() as f64 * 100.0 / total as f64;
            let percent = (done as f64 * 100.0 / total as f64).round() as u64;
            progress.report(increment, &format!("{percent}%"));
        });

        Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file_name)
            .mime_str("application/zip")
            .map_err(ApiError::Transport)
    }
}

#[async_trait]
impl SastApi for HttpSastApi {
    async fn find_project(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<KnownProject>, ApiError> {
        let response = self
            .client
            .get(self.url("/api/projects/find"))
            .header("Authorization", &self.token)
            .query(&[("name", name), ("version", version)])
            .send()
            .await?;

        let envelope: Envelope<FoundProject> = Self::read_envelope(response).await?;
        Ok(envelope.data.map(|found| KnownProject {
            project_id: found.project_id,
            analysis_rate: AnalysisRate::from(found.analysis_rate),
        }))
    }

    async fn create_project(
        &self,
        archive: &Path,
        name: &str,
        version: &str,
        progress: Arc<dyn ProgressSession>,
    ) -> Result<CreatedProject, ApiError> {
        let part = Self::progress_part(archive, format!("{name}.zip"), progress).await?;
        let form = Form::new()
            .text("name", name.to_string())
            .text("version", version.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.url("/api/projects"))
            .header("Authorization", &self.token)
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        let envelope: Envelope<String> = Self::read_envelope(response).await?;
        let message = envelope.msg.clone();
        let project_id = Self::require_data(envelope)?;
        debug!(%project_id, "project created");
        Ok(CreatedProject {
            project_id,
            message,
        })
    }

    async fn update_project(
        &self,
        project_id: &str,
        archive: &Path,
        name: &str,
        progress: Arc<dyn ProgressSession>,
    ) -> Result<Ack, ApiError> {
        let part = Self::progress_part(archive, format!("{name}.zip"), progress).await?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(&format!("/api/projects/{project_id}/source")))
            .header("Authorization", &self.token)
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        let envelope: Envelope<serde_json::Value> = Self::read_envelope(response).await?;
        Ok(Ack {
            message: envelope.msg,
        })
    }

    async fn start_analysis(&self, project_id: &str) -> Result<Ack, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/projects/{project_id}/analysis")))
            .header("Authorization", &self.token)
            .send()
            .await?;

        let envelope: Envelope<serde_json::Value> = Self::read_envelope(response).await?;
        Ok(Ack {
            message: envelope.msg,
        })
    }

    async fn list_modules(
        &self,
        project_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ModuleRecord>, ApiError> {
        let response = self
            .client
            .post(self.url("/api/modules/list"))
            .header("Authorization", &self.token)
            .json(&PageRequest {
                project_id: Some(project_id),
                module_id: None,
                page,
                page_size,
            })
            .send()
            .await?;

        Self::require_data(Self::read_envelope(response).await?)
    }

    async fn list_vulnerabilities(
        &self,
        module_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<VulnerabilityRecord>, ApiError> {
        let response = self
            .client
            .post(self.url("/api/vulnerabilities/list"))
            .header("Authorization", &self.token)
            .json(&PageRequest {
                project_id: None,
                module_id: Some(module_id),
                page,
                page_size,
            })
            .send()
            .await?;

        Self::require_data(Self::read_envelope(response).await?)
    }

    async fn get_file_tree(
        &self,
        module_id: &str,
        project_id: &str,
    ) -> Result<FileNode, ApiError> {
        let response = self
            .client
            .post(self.url("/api/files/tree"))
            .header("Authorization", &self.token)
            .json(&serde_json::json!({
                "moduleId": module_id,
                "projectId": project_id,
            }))
            .send()
            .await?;

        Self::require_data(Self::read_envelope(response).await?)
    }

    async fn get_reference_file(&self, file_id: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/files/{file_id}/reference")))
            .header("Authorization", &self.token)
            .send()
            .await?;

        let reference: ReferenceFile = Self::require_data(Self::read_envelope(response).await?)?;
        Ok(reference.content)
    }
}
