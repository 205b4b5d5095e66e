//! SastLink - editor-side client for a remote static analysis service
//!
//! The crate packages and uploads a project directory, drives the analysis
//! lifecycle on the backend, follows live progress over a WebSocket feed, and
//! serves two lazily-paginated result views (flagged modules and, per module,
//! its vulnerabilities and file match tree) to a host editor surface.
//!
//! # Modules
//!
//! - [`config`] — Strongly-typed settings with file and environment variable support
//! - [`domain`] — Server-reported records: projects, modules, vulnerabilities, file trees
//! - [`application`] — The four core engines: lifecycle, progress, pagination, result tree
//! - [`infrastructure`] — HTTP API client, zip archiver, WebSocket progress feed
//! - [`presentation`] — Command dispatch and tree item descriptors
//! - [`logging`] — Structured logging with tracing
//!
//! # Architecture
//!
//! The layering is strict: `domain` has no I/O, `application` reaches every
//! external collaborator through a trait injected as `Arc<dyn ...>`, and
//! `infrastructure` holds the only code that talks to the network or the
//! filesystem.
//!
//! ```text
//! sastlink/
//! ├── domain/           # Pure records and value types
//! ├── application/      # Lifecycle, progress channel, pagination, tree controller
//! │   └── surface.rs    # Traits the host editor implements
//! ├── infrastructure/   # reqwest API client, zip archiver, WebSocket feed
//! ├── presentation/     # Commands and view descriptors
//! └── config/           # Settings management
//! ```
//!
//! # Getting started
//!
//! ```rust,ignore
//! use sastlink::Settings;
//!
//! let settings = Settings::load()?;
//! let connection = settings.connection()?;
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use application::{AnalysisLifecycle, ClientError, ResultTreeController};
pub use config::Settings;
pub use logging::init_tracing;
