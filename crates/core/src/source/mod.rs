//! Artifact retrieval seam.
//!
//! Everything the packaging pipeline needs from the distribution network
//! (metadata documents, license documents, content blobs, certificate
//! chains, binary package assembly) sits behind the [`ArtifactSource`]
//! trait so the pipeline can be exercised with a substitutable source.

mod error;
mod nus;
mod traits;
mod types;

pub use error::SourceError;
pub use nus::NusSource;
pub use traits::ArtifactSource;
pub use types::{ContentRecord, License, TitleMetadata};
