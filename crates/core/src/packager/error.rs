//! Error taxonomy for the packaging pipeline.

use thiserror::Error;

use super::archive::ArchiveError;
use crate::source::SourceError;

/// Terminal outcomes of a failed pipeline run.
///
/// `TitleNotFound` and `NoLicense` are the only classified, caller-visible
/// outcomes; they carry a stable error code for the transport layer.
/// Everything else is an unclassified failure the transport maps to a
/// generic server error without leaking detail.
#[derive(Debug, Error)]
pub enum PackageError {
    /// The title id or requested version does not exist upstream.
    #[error("Title ID {0} or Title version not found")]
    TitleNotFound(String),

    /// The title exists but has no publicly retrievable license.
    #[error("No license is available for the requested Title {0}")]
    NoLicense(String),

    /// Unclassified artifact retrieval or assembly failure.
    #[error("Artifact source failure: {0}")]
    Source(#[source] SourceError),

    /// Unclassified archive serialization failure.
    #[error("Archive serialization failure: {0}")]
    Archive(#[from] ArchiveError),
}

impl PackageError {
    /// Stable error code for classified outcomes.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::TitleNotFound(_) => Some("title.notfound"),
            Self::NoLicense(_) => Some("title.notik"),
            Self::Source(_) | Self::Archive(_) => None,
        }
    }

    /// Whether this outcome is part of the documented error contract.
    pub fn is_classified(&self) -> bool {
        self.code().is_some()
    }
}
