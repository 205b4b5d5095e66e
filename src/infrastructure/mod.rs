//! External integrations: backend API client, archiver, progress feed

pub mod api;
pub mod archive;
pub mod progress_feed;
