//! Seams for the surrounding editor surface
//!
//! Notifications, progress bars, modal prompts and view invalidation are
//! fire-and-forget side effects of the host editor, not data-flow
//! dependencies. The application layer talks to them through these traits;
//! tests substitute recording implementations.

use std::sync::Arc;

use async_trait::async_trait;

/// User-visible notifications. One implementation per host surface.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    /// Short status-line text (e.g. a status bar item).
    fn status(&self, text: &str);
}

/// Factory for scoped progress windows.
///
/// Each long-running operation (an upload, a watched analysis) opens its own
/// session so its increments accumulate against a fresh 0–100 window instead
/// of spilling into the previous operation's bar.
pub trait ProgressReporter: Send + Sync {
    fn begin(&self, title: &str) -> Arc<dyn ProgressSession>;
}

/// One accumulating progress window.
///
/// The surface sums increments; callers must therefore report deltas, never
/// absolute values. Dropping the session closes the window.
pub trait ProgressSession: Send + Sync {
    fn report(&self, increment: f64, message: &str);
}

/// Choice offered when a project's analysis already completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecheckChoice {
    /// Re-run the analysis on the code the server already has
    Reanalyze,
    /// Re-upload the local directory, then re-run
    ReuploadAndReanalyze,
    /// Skip analysis and fetch the existing results
    FetchResults,
}

/// Choice offered when a prior upload or analysis errored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverChoice {
    /// Re-upload the local directory, then re-trigger analysis
    Reupload,
    /// Re-trigger analysis without uploading
    ReanalyzeOnly,
}

/// Modal prompts that block the calling task until the user decides.
///
/// `None` means the user dismissed the prompt; dismissal is a valid terminal
/// choice, not an error.
#[async_trait]
pub trait UserPrompt: Send + Sync {
    async fn recheck_completed(&self, project_name: &str) -> Option<RecheckChoice>;
    async fn recover_failed(&self, project_name: &str, status: &str) -> Option<RecoverChoice>;
}

/// Invalidation hook for a lazily-populated tree view.
pub trait ViewSink: Send + Sync {
    fn view_changed(&self);
}

/// File reveal operations of the host editor.
pub trait EditorOps: Send + Sync {
    /// Open a local file in the editor.
    fn open_file(&self, path: &std::path::Path);
    /// Show a diff between a local file and the server reference copy.
    ///
    /// Ownership of the reference handle moves to the surface, which keeps
    /// the temp artifact alive for as long as the diff view needs it.
    fn show_diff(
        &self,
        local: &std::path::Path,
        reference: crate::application::tree::ReferenceFileHandle,
        title: &str,
    );
}

/// No-op surface used where a caller has nothing to show.
pub struct NullSurface;

impl Notifier for NullSurface {
    fn info(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn status(&self, _text: &str) {}
}

impl ProgressReporter for NullSurface {
    fn begin(&self, _title: &str) -> Arc<dyn ProgressSession> {
        Arc::new(NullSurface)
    }
}

impl ProgressSession for NullSurface {
    fn report(&self, _increment: f64, _message: &str) {}
}

impl ViewSink for NullSurface {
    fn view_changed(&self) {}
}

impl EditorOps for NullSurface {
    fn open_file(&self, _path: &std::path::Path) {}
    fn show_diff(
        &self,
        _local: &std::path::Path,
        _reference: crate::application::tree::ReferenceFileHandle,
        _title: &str,
    ) {
    }
}
