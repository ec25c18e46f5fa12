//! Error types for artifact retrieval.

use thiserror::Error;

/// Errors that can occur while retrieving or assembling artifacts.
///
/// `NotFound` is the only variant the packaging pipeline classifies into a
/// caller-visible outcome; everything else propagates unclassified.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested artifact does not exist upstream.
    #[error("Artifact not found for title {title_id}")]
    NotFound { title_id: String },

    /// The upstream returned a non-success status other than 404.
    #[error("Upstream returned HTTP {status}: {detail}")]
    Upstream { status: u16, detail: String },

    /// Transport-level failure talking to the upstream.
    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A retrieved document could not be interpreted.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Key material required for decryption is missing or invalid.
    #[error("Decryption unavailable: {0}")]
    KeyUnavailable(String),

    /// Content decryption failed.
    #[error("Decryption failed: {0}")]
    DecryptFailed(String),
}

impl SourceError {
    /// Creates a not-found error for the given title.
    pub fn not_found(title_id: impl Into<String>) -> Self {
        Self::NotFound {
            title_id: title_id.into(),
        }
    }

    /// Whether this error means the artifact does not exist upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
