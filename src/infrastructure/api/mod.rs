//! Backend API contract and reqwest implementation

pub mod http;
pub mod traits;

pub use http::HttpSastApi;
pub use traits::{Ack, CreatedProject, SastApi};

/// Errors from the backend API boundary.
///
/// Decoding fails closed: a response with missing or malformed fields is a
/// [`Decode`](ApiError::Decode) error, never a silently-defaulted record.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local file i/o around a request: reading the upload artifact,
    /// materializing a reference copy.
    #[error("file i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server returned HTTP {status}")]
    Http { status: u16 },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("service error: {0}")]
    Service(String),
}
