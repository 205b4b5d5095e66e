//! Settings store
//!
//! Layered configuration in the style of the service's other clients: an
//! optional `config/default` file, an environment-specific file when `ENV` is
//! set, a `config/local` override, and finally `SASTLINK`-prefixed environment
//! variables (double-underscore separator, e.g. `SASTLINK__SERVICE_URL`).
//!
//! All keys are optional at load time; operations that need the network call
//! [`Settings::connection`] and get a [`SettingsError`] when the URL or token
//! is absent. Nothing here performs I/O beyond reading the files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::ProjectRef;

/// Default page size for both result collections.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Client settings as read from files and environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the SAST service (`https://...`), trailing slashes ignored
    pub service_url: Option<String>,
    /// Opaque auth token sent in the `Authorization` header
    pub token: Option<String>,
    /// Project name used as the natural key for lookup
    pub project_name: Option<String>,
    /// Local project directory the archive snapshot is taken from
    pub project_path: Option<PathBuf>,
    /// Page size for module and vulnerability listings
    pub page_size: Option<usize>,
}

/// Resolved connection parameters; existence proves URL and token are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub base_url: String,
    pub token: String,
}

impl Connection {
    /// WebSocket endpoint derived from the HTTP base URL.
    pub fn ws_base_url(&self) -> String {
        if let Some(rest) = self.base_url.strip_prefix("https") {
            format!("wss{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http") {
            format!("ws{rest}")
        } else {
            self.base_url.clone()
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables.
    pub fn load() -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SASTLINK").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Connection parameters, or which key is missing.
    ///
    /// Absence of the URL or token blocks any network action; callers surface
    /// the error once with a pointer to the settings.
    pub fn connection(&self) -> Result<Connection, SettingsError> {
        let base_url = self
            .service_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(SettingsError::MissingServiceUrl)?;
        let token = self
            .token
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(SettingsError::MissingToken)?;
        Ok(Connection {
            base_url: normalize_url(base_url),
            token: token.to_string(),
        })
    }

    /// The configured project, or which key is missing.
    pub fn project(&self) -> Result<ProjectRef, SettingsError> {
        let name = self
            .project_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(SettingsError::MissingProjectName)?;
        let path = self
            .project_path
            .as_deref()
            .ok_or(SettingsError::MissingProjectPath)?;
        Ok(ProjectRef::new(name, path))
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// Strip trailing slashes so endpoint paths can be appended verbatim.
fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Configuration errors; all of them block network action.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("service URL is not configured")]
    MissingServiceUrl,

    #[error("auth token is not configured")]
    MissingToken,

    #[error("no project has been checked yet; project name is not configured")]
    MissingProjectName,

    #[error("project path is not configured")]
    MissingProjectPath,

    #[error("configuration file error: {0}")]
    File(#[from] config::ConfigError),
}
