//! Common test utilities: recording surfaces and scripted collaborators
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;

use sastlink::application::pagination::Page;
use sastlink::application::surface::{
    EditorOps, Notifier, ProgressReporter, ProgressSession, RecheckChoice, RecoverChoice,
    UserPrompt, ViewSink,
};
use sastlink::application::tree::ReferenceFileHandle;
use sastlink::domain::{
    FileNode, KnownProject, MatchType, ModuleRecord, NodeKind, VulnerabilityRecord,
};
use sastlink::infrastructure::api::{Ack, ApiError, CreatedProject, SastApi};
use sastlink::infrastructure::archive::{ArchiveError, ArchiveHandle, Archiver};
use sastlink::infrastructure::progress_feed::{
    FeedError, ProgressEvent, ProgressFeed, ProgressStream,
};

/// Notifier that records everything it is shown.
#[derive(Default)]
pub struct RecordingNotifier {
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub statuses: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn status(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }
}

/// One recorded progress window.
pub struct RecordingSession {
    pub title: String,
    pub increments: Mutex<Vec<(f64, String)>>,
}

impl RecordingSession {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            increments: Mutex::new(Vec::new()),
        }
    }

    pub fn increments(&self) -> Vec<f64> {
        self.increments.lock().unwrap().iter().map(|(i, _)| *i).collect()
    }

    /// Accumulated total, the way the host progress bar sums increments.
    pub fn total(&self) -> f64 {
        self.increments().iter().sum()
    }
}

impl ProgressSession for RecordingSession {
    fn report(&self, increment: f64, message: &str) {
        self.increments
            .lock()
            .unwrap()
            .push((increment, message.to_string()));
    }
}

/// Progress surface that records every opened session and its increments.
#[derive(Default)]
pub struct RecordingReporter {
    pub sessions: Mutex<Vec<Arc<RecordingSession>>>,
}

impl RecordingReporter {
    pub fn sessions(&self) -> Vec<Arc<RecordingSession>> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn session_totals(&self) -> Vec<f64> {
        self.sessions().iter().map(|s| s.total()).collect()
    }

    /// Increments across all sessions, in order.
    pub fn increments(&self) -> Vec<f64> {
        self.sessions().iter().flat_map(|s| s.increments()).collect()
    }

    pub fn total(&self) -> f64 {
        self.increments().iter().sum()
    }
}

impl ProgressReporter for RecordingReporter {
    fn begin(&self, title: &str) -> Arc<dyn ProgressSession> {
        let session = Arc::new(RecordingSession::new(title));
        self.sessions.lock().unwrap().push(session.clone());
        session
    }
}

/// Editor surface that records file reveals.
#[derive(Default)]
pub struct RecordingEditor {
    pub opened: Mutex<Vec<PathBuf>>,
    pub diff_titles: Mutex<Vec<String>>,
}

impl RecordingEditor {
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }

    pub fn diff_titles(&self) -> Vec<String> {
        self.diff_titles.lock().unwrap().clone()
    }
}

impl EditorOps for RecordingEditor {
    fn open_file(&self, path: &Path) {
        self.opened.lock().unwrap().push(path.to_path_buf());
    }

    fn show_diff(&self, _local: &Path, _reference: ReferenceFileHandle, title: &str) {
        self.diff_titles.lock().unwrap().push(title.to_string());
    }
}

/// View sink counting invalidations.
#[derive(Default)]
pub struct RecordingView {
    pub invalidations: AtomicUsize,
}

impl RecordingView {
    pub fn count(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl ViewSink for RecordingView {
    fn view_changed(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Prompt that always answers with the configured choices.
#[derive(Default)]
pub struct ScriptedPrompt {
    pub recheck: Option<RecheckChoice>,
    pub recover: Option<RecoverChoice>,
}

#[async_trait]
impl UserPrompt for ScriptedPrompt {
    async fn recheck_completed(&self, _project_name: &str) -> Option<RecheckChoice> {
        self.recheck
    }

    async fn recover_failed(&self, _project_name: &str, _status: &str) -> Option<RecoverChoice> {
        self.recover
    }
}

/// Feed replaying a fixed sequence of percentages, then closing.
pub struct StaticFeed {
    pub percents: Vec<f64>,
    pub fail_connect: bool,
}

impl StaticFeed {
    pub fn events(percents: &[f64]) -> Self {
        Self {
            percents: percents.to_vec(),
            fail_connect: false,
        }
    }

    pub fn unreachable_service() -> Self {
        Self {
            percents: Vec::new(),
            fail_connect: true,
        }
    }
}

#[async_trait]
impl ProgressFeed for StaticFeed {
    async fn subscribe(&self, _project_id: &str) -> Result<ProgressStream, FeedError> {
        if self.fail_connect {
            return Err(FeedError::Connect("connection refused".into()));
        }
        let events: Vec<Result<ProgressEvent, FeedError>> = self
            .percents
            .iter()
            .map(|&percent| Ok(ProgressEvent { percent }))
            .collect();
        Ok(stream::iter(events).boxed())
    }
}

/// Archiver that hands out a fake artifact and counts cleanup runs.
pub struct CountingArchiver {
    pub archived: AtomicUsize,
    pub cleanups: Arc<AtomicUsize>,
}

impl CountingArchiver {
    pub fn new() -> Self {
        Self {
            archived: AtomicUsize::new(0),
            cleanups: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn archive_count(&self) -> usize {
        self.archived.load(Ordering::SeqCst)
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Archiver for CountingArchiver {
    async fn archive(&self, _dir: &Path) -> Result<ArchiveHandle, ArchiveError> {
        self.archived.fetch_add(1, Ordering::SeqCst);
        let cleanups = self.cleanups.clone();
        Ok(ArchiveHandle::new(
            PathBuf::from("/tmp/sastlink-test.zip"),
            Box::new(move || {
                cleanups.fetch_add(1, Ordering::SeqCst);
            }),
        ))
    }
}

/// Scripted backend recording which operations ran.
pub struct ScriptedApi {
    pub found: Option<KnownProject>,
    pub fail_create: bool,
    /// Increments to report through the upload session, simulating bytes
    pub upload_increments: Vec<f64>,
    pub modules: Vec<ModuleRecord>,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub file_tree: FileNode,
    pub reference_content: String,
    pub calls: Mutex<Vec<String>>,
    pub find_names: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new(found: Option<KnownProject>) -> Self {
        Self {
            found,
            fail_create: false,
            upload_increments: Vec::new(),
            modules: Vec::new(),
            vulnerabilities: Vec::new(),
            file_tree: file_tree_fixture(),
            reference_content: "int main() { return 0; }\n".into(),
            calls: Mutex::new(Vec::new()),
            find_names: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn find_names(&self) -> Vec<String> {
        self.find_names.lock().unwrap().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls().iter().any(|c| c == name)
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn slice_page<T: Clone>(all: &[T], page: usize, page_size: usize) -> Page<T> {
        let start = (page * page_size).min(all.len());
        let end = (start + page_size).min(all.len());
        Page {
            total_size: all.len(),
            items: all[start..end].to_vec(),
        }
    }
}

#[async_trait]
impl SastApi for ScriptedApi {
    async fn find_project(
        &self,
        name: &str,
        _version: &str,
    ) -> Result<Option<KnownProject>, ApiError> {
        self.record("find_project");
        self.find_names.lock().unwrap().push(name.to_string());
        Ok(self.found.clone())
    }

    async fn create_project(
        &self,
        _archive: &Path,
        _name: &str,
        _version: &str,
        progress: Arc<dyn ProgressSession>,
    ) -> Result<CreatedProject, ApiError> {
        self.record("create_project");
        if self.fail_create {
            return Err(ApiError::Http { status: 500 });
        }
        for increment in &self.upload_increments {
            progress.report(*increment, "uploading");
        }
        Ok(CreatedProject {
            project_id: "p1".into(),
            message: Some("upload accepted".into()),
        })
    }

    async fn update_project(
        &self,
        _project_id: &str,
        _archive: &Path,
        _name: &str,
        progress: Arc<dyn ProgressSession>,
    ) -> Result<Ack, ApiError> {
        self.record("update_project");
        for increment in &self.upload_increments {
            progress.report(*increment, "uploading");
        }
        Ok(Ack::default())
    }

    async fn start_analysis(&self, _project_id: &str) -> Result<Ack, ApiError> {
        self.record("start_analysis");
        Ok(Ack::default())
    }

    async fn list_modules(
        &self,
        _project_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ModuleRecord>, ApiError> {
        self.record("list_modules");
        Ok(Self::slice_page(&self.modules, page, page_size))
    }

    async fn list_vulnerabilities(
        &self,
        _module_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<VulnerabilityRecord>, ApiError> {
        self.record("list_vulnerabilities");
        Ok(Self::slice_page(&self.vulnerabilities, page, page_size))
    }

    async fn get_file_tree(
        &self,
        _module_id: &str,
        _project_id: &str,
    ) -> Result<FileNode, ApiError> {
        self.record("get_file_tree");
        Ok(self.file_tree.clone())
    }

    async fn get_reference_file(&self, _file_id: &str) -> Result<String, ApiError> {
        self.record("get_reference_file");
        Ok(self.reference_content.clone())
    }
}

pub fn module_fixture(i: usize) -> ModuleRecord {
    ModuleRecord {
        id: format!("m{i}"),
        name: format!("module-{i}"),
        version: "1.0.0".into(),
        origin: Some("registry".into()),
        url: None,
        vulnerability_count: 1,
        high: 1,
        medium: 0,
        low: 0,
        other: 0,
        recommended_version: None,
        recommended_released_at: None,
        latest_version: None,
        latest_released_at: None,
        match_type: MatchType::Exact,
    }
}

pub fn vulnerability_fixture(i: usize) -> VulnerabilityRecord {
    VulnerabilityRecord {
        id: format!("v{i}"),
        name: format!("CVE-2024-{i:04}"),
        severity: sastlink::domain::Severity::High,
        score: "9.8".into(),
        url: None,
        category: Some("overflow".into()),
        released_at: None,
        base_score: Some(9.8),
        exploitability_score: None,
        impact_score: None,
    }
}

pub fn file_tree_fixture() -> FileNode {
    FileNode {
        id: "root".into(),
        name: "module-1".into(),
        kind: NodeKind::Folder,
        path: String::new(),
        children: vec![FileNode {
            id: "n1".into(),
            name: "util.c".into(),
            kind: NodeKind::File,
            path: "src/util.c".into(),
            children: Vec::new(),
            file_id: Some("f1".into()),
        }],
        file_id: None,
    }
}
