//! Title packaging: the pipeline engine and its output containers.

mod archive;
mod engine;
mod error;
mod types;

pub use archive::{ArchiveError, ZipBuilder, CREATOR_SYSTEM};
pub use engine::PackagingEngine;
pub use error::PackageError;
pub use types::{OutputKind, PackageContentType, PackagedOutput, TitleRequest};
