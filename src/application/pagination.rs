//! Incremental page-by-page fetch cursor
//!
//! Both result trees (modules, and a module's vulnerabilities) are backed by a
//! [`PaginatedCollection`]: a flat ordered sequence fetched page by page from
//! the server, with a trailing "load more" sentinel while more pages remain.
//!
//! Concurrency model: execution is cooperative, but two near-simultaneous
//! triggers can both reach `fetch_next` before either suspends. The in-flight
//! guard is therefore checked synchronously, before any await point; the
//! second trigger is a no-op. A failed page fetch leaves the cursor untouched
//! so a retry re-issues the same page, and a `reset` while a page is in
//! flight bumps the cursor generation so the stale response is dropped when
//! it lands instead of being applied to the new scope.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::infrastructure::api::ApiError;

/// One page of results as reported by the server.
///
/// `total_size` is authoritative on the first page of a scope; later pages
/// may repeat it but it is ignored there.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_size: usize,
    pub items: Vec<T>,
}

/// Server endpoint seam for one paged listing.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    /// Fetch page `page` (zero-based) of size `page_size` for `scope`.
    ///
    /// The scope key is the project id for the module listing and the module
    /// id for the vulnerability listing.
    async fn fetch_page(
        &self,
        scope: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<T>, ApiError>;
}

/// Entry of the rendered view: a data record or the load-more sentinel.
///
/// The sentinel is a distinguished variant, not a shared placeholder value
/// compared by identity; it carries no data and has no children.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEntry<T> {
    Item(T),
    LoadMore,
}

/// Outcome of a [`PaginatedCollection::fetch_next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page was fetched; `appended` items were added (or loaded, for page 0)
    Fetched { appended: usize },
    /// A fetch was already outstanding; this trigger was a no-op
    AlreadyInFlight,
    /// `has_more` was false; nothing to do
    Exhausted,
    /// A `reset` rebound the cursor while the page was in flight; the
    /// response was discarded
    Superseded,
}

#[derive(Debug)]
struct CursorState<T> {
    scope: String,
    items: Vec<T>,
    page: usize,
    total_known: usize,
    has_more: bool,
    /// Bumped by `reset`; a fetch only applies if it still matches.
    generation: u64,
}

impl<T> CursorState<T> {
    fn empty(generation: u64) -> Self {
        Self {
            scope: String::new(),
            items: Vec::new(),
            page: 0,
            total_known: 0,
            has_more: true,
            generation,
        }
    }
}

/// Generic incremental-fetch cursor.
///
/// Items never shrink except on an explicit [`reset`](Self::reset); at most
/// one fetch is in flight at a time.
pub struct PaginatedCollection<T> {
    fetcher: Arc<dyn PageFetcher<T>>,
    page_size: usize,
    in_flight: AtomicBool,
    state: Mutex<CursorState<T>>,
}

impl<T: Clone + Send> PaginatedCollection<T> {
    pub fn new(fetcher: Arc<dyn PageFetcher<T>>, page_size: usize) -> Self {
        Self {
            fetcher,
            page_size,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(CursorState::empty(0)),
        }
    }

    /// Clear all state and bind the cursor to a new scope key.
    ///
    /// Required before first use and on any semantic change of scope. Viewers
    /// must not retain entries from before the reset. A page still in flight
    /// for the previous scope is discarded when it lands.
    pub fn reset(&self, scope_key: &str) {
        let mut state = self.state.lock().expect("cursor lock poisoned");
        *state = CursorState::empty(state.generation + 1);
        state.scope = scope_key.to_string();
    }

    /// Fetch the next page, if any and if none is outstanding.
    ///
    /// On the first page of a scope the result set is replaced rather than
    /// appended to, which guards against duplicate initial loads; the page's
    /// `total_size` is only honored there. An empty page where more was
    /// expected terminates the cursor (the server under-reported the total).
    pub async fn fetch_next(&self) -> Result<FetchOutcome, ApiError> {
        // Synchronous guard: must happen before any suspension point.
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Ok(FetchOutcome::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let (scope, page, generation) = {
            let state = self.state.lock().expect("cursor lock poisoned");
            if !state.has_more {
                return Ok(FetchOutcome::Exhausted);
            }
            (state.scope.clone(), state.page, state.generation)
        };

        let fetched = self
            .fetcher
            .fetch_page(&scope, page, self.page_size)
            .await?;

        let mut state = self.state.lock().expect("cursor lock poisoned");
        if state.generation != generation {
            debug!(%scope, page, "page response superseded by reset");
            return Ok(FetchOutcome::Superseded);
        }
        let appended = fetched.items.len();
        if page == 0 {
            state.total_known = fetched.total_size;
            state.items = fetched.items;
        } else {
            state.items.extend(fetched.items);
        }
        state.page += 1;
        state.has_more = state.items.len() < state.total_known && appended > 0;
        debug!(
            scope = %state.scope,
            page,
            appended,
            total = state.total_known,
            has_more = state.has_more,
            "page fetched"
        );
        Ok(FetchOutcome::Fetched { appended })
    }

    /// Snapshot of the current entries, with a trailing sentinel iff more
    /// pages remain.
    pub fn current_view(&self) -> Vec<PageEntry<T>> {
        let state = self.state.lock().expect("cursor lock poisoned");
        let mut view: Vec<PageEntry<T>> =
            state.items.iter().cloned().map(PageEntry::Item).collect();
        if state.has_more {
            view.push(PageEntry::LoadMore);
        }
        view
    }

    /// Number of items fetched so far (sentinel excluded).
    pub fn len(&self) -> usize {
        self.state.lock().expect("cursor lock poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Authoritative total reported by the first page of the current scope.
    pub fn total_known(&self) -> usize {
        self.state.lock().expect("cursor lock poisoned").total_known
    }

    /// Whether a trailing sentinel is currently shown.
    pub fn has_more(&self) -> bool {
        self.state.lock().expect("cursor lock poisoned").has_more
    }

    /// First item matching `predicate`, cloned.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let state = self.state.lock().expect("cursor lock poisoned");
        state.items.iter().find(|item| predicate(item)).cloned()
    }
}

/// Clears the in-flight flag on every exit path, including fetch errors.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
