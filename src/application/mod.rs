//! Use cases and core engines
//!
//! The four moving parts of the client live here: the pagination cursor, the
//! analysis lifecycle, the progress channel, and the result tree controller.
//! External collaborators (backend API, archiver, progress feed, editor
//! surface) are reached through traits and injected as `Arc<dyn ...>`.

pub mod errors;
pub mod lifecycle;
pub mod pagination;
pub mod progress;
pub mod surface;
pub mod tree;

pub use errors::ClientError;
pub use lifecycle::{decide, AnalysisLifecycle, CheckOutcome, NextAction};
pub use pagination::{FetchOutcome, Page, PageEntry, PageFetcher, PaginatedCollection};
pub use progress::{ProgressChannel, SubscriptionState};
pub use tree::{FileDetail, ResultTreeController};
