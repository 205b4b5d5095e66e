//! Cursor behavior of the paginated result collections

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use sastlink::application::pagination::{
    FetchOutcome, Page, PageEntry, PageFetcher, PaginatedCollection,
};
use sastlink::infrastructure::api::ApiError;

/// Serves `actual` items while reporting `reported_total` on every page.
struct GridFetcher {
    actual: usize,
    reported_total: usize,
    delay: Option<Duration>,
    fail_next: AtomicBool,
    requests: Mutex<Vec<(String, usize)>>,
    fetches: AtomicUsize,
}

impl GridFetcher {
    fn new(total: usize) -> Self {
        Self {
            actual: total,
            reported_total: total,
            delay: None,
            fail_next: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    fn requests(&self) -> Vec<(String, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher<String> for GridFetcher {
    async fn fetch_page(
        &self,
        scope: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page<String>, ApiError> {
        self.requests
            .lock()
            .unwrap()
            .push((scope.to_string(), page));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Http { status: 500 });
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let start = (page * page_size).min(self.actual);
        let end = (start + page_size).min(self.actual);
        Ok(Page {
            total_size: self.reported_total,
            items: (start..end).map(|i| format!("{scope}:item-{i}")).collect(),
        })
    }
}

#[tokio::test]
async fn sentinel_trails_until_every_page_is_fetched() {
    // 250 items in pages of 100: two full pages and a half page.
    let fetcher = Arc::new(GridFetcher::new(250));
    let collection = PaginatedCollection::new(fetcher.clone(), 100);
    collection.reset("p1");

    let outcome = collection.fetch_next().await.unwrap();
    assert_eq!(outcome, FetchOutcome::Fetched { appended: 100 });
    assert_eq!(collection.len(), 100);
    assert_eq!(collection.total_known(), 250);

    let view = collection.current_view();
    assert_eq!(view.len(), 101);
    assert_eq!(view.last(), Some(&PageEntry::LoadMore));
    assert_eq!(view[0], PageEntry::Item("p1:item-0".into()));

    collection.fetch_next().await.unwrap();
    let outcome = collection.fetch_next().await.unwrap();
    assert_eq!(outcome, FetchOutcome::Fetched { appended: 50 });
    assert_eq!(collection.len(), 250);
    assert!(!collection.has_more());

    let view = collection.current_view();
    assert_eq!(view.len(), 250);
    assert!(!view.contains(&PageEntry::LoadMore));

    // Further triggers are no-ops and hit the server zero times.
    let before = fetcher.requests().len();
    assert_eq!(collection.fetch_next().await.unwrap(), FetchOutcome::Exhausted);
    assert_eq!(fetcher.requests().len(), before);
}

#[tokio::test]
async fn concurrent_triggers_fetch_a_single_page() {
    let mut fetcher = GridFetcher::new(300);
    fetcher.delay = Some(Duration::from_millis(50));
    let fetcher = Arc::new(fetcher);
    let collection = PaginatedCollection::new(fetcher.clone(), 100);
    collection.reset("p1");

    let (a, b) = tokio::join!(collection.fetch_next(), collection.fetch_next());
    let outcomes = [a.unwrap(), b.unwrap()];

    assert!(outcomes.contains(&FetchOutcome::Fetched { appended: 100 }));
    assert!(outcomes.contains(&FetchOutcome::AlreadyInFlight));
    assert_eq!(fetcher.requests().len(), 1);
    assert_eq!(collection.len(), 100);
}

#[tokio::test]
async fn failed_fetch_leaves_the_cursor_for_retry() {
    let fetcher = Arc::new(GridFetcher::new(150));
    fetcher.fail_next.store(true, Ordering::SeqCst);
    let collection = PaginatedCollection::new(fetcher.clone(), 100);
    collection.reset("p1");

    let err = collection.fetch_next().await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 500 }));
    assert_eq!(collection.len(), 0);

    // Retry re-issues the same page; the in-flight guard was cleared.
    let outcome = collection.fetch_next().await.unwrap();
    assert_eq!(outcome, FetchOutcome::Fetched { appended: 100 });
    assert_eq!(
        fetcher.requests(),
        vec![("p1".to_string(), 0), ("p1".to_string(), 0)]
    );
}

#[tokio::test]
async fn empty_page_terminates_an_over_reported_total() {
    // Server claims 300 but only ever serves 120.
    let mut fetcher = GridFetcher::new(120);
    fetcher.reported_total = 300;
    let collection = PaginatedCollection::new(Arc::new(fetcher), 100);
    collection.reset("p1");

    collection.fetch_next().await.unwrap();
    collection.fetch_next().await.unwrap();
    assert_eq!(collection.len(), 120);
    assert!(collection.has_more());

    let outcome = collection.fetch_next().await.unwrap();
    assert_eq!(outcome, FetchOutcome::Fetched { appended: 0 });
    assert!(!collection.has_more());
    assert!(!collection.current_view().contains(&PageEntry::LoadMore));
}

#[tokio::test]
async fn reset_during_an_inflight_fetch_discards_the_stale_page() {
    let mut fetcher = GridFetcher::new(150);
    fetcher.delay = Some(Duration::from_millis(50));
    let fetcher = Arc::new(fetcher);
    let collection = Arc::new(PaginatedCollection::new(fetcher.clone(), 100));
    collection.reset("p1");

    let inflight = {
        let collection = collection.clone();
        tokio::spawn(async move { collection.fetch_next().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    collection.reset("p2");

    // The p1 page lands after the rebind and must not be applied.
    let outcome = inflight.await.unwrap().unwrap();
    assert_eq!(outcome, FetchOutcome::Superseded);
    assert_eq!(collection.len(), 0);
    assert!(collection.has_more());

    let outcome = collection.fetch_next().await.unwrap();
    assert_eq!(outcome, FetchOutcome::Fetched { appended: 100 });
    assert_eq!(
        collection.find(|item| item == "p2:item-0"),
        Some("p2:item-0".to_string())
    );
}

#[tokio::test]
async fn reset_rebinds_the_scope_and_clears_items() {
    let fetcher = Arc::new(GridFetcher::new(150));
    let collection = PaginatedCollection::new(fetcher.clone(), 100);

    collection.reset("p1");
    collection.fetch_next().await.unwrap();
    assert_eq!(collection.len(), 100);

    collection.reset("p2");
    assert_eq!(collection.len(), 0);
    assert!(collection.has_more());

    collection.fetch_next().await.unwrap();
    assert_eq!(
        collection.find(|item| item.ends_with("item-0")),
        Some("p2:item-0".to_string())
    );
    assert_eq!(
        fetcher.requests(),
        vec![("p1".to_string(), 0), ("p2".to_string(), 0)]
    );
}
