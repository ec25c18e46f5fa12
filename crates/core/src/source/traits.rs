//! Trait definition for the artifact source seam.

use async_trait::async_trait;

use super::error::SourceError;
use super::types::{ContentRecord, License, TitleMetadata};

/// Provider of title artifacts and packaging primitives.
///
/// The packaging pipeline drives these operations in a fixed order and
/// never caches across requests. Implementations must not hold per-request
/// state.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Returns the name of this source implementation.
    fn name(&self) -> &str;

    /// Retrieves the metadata document for a title at the given version.
    ///
    /// `SourceError::NotFound` means the title id or version does not
    /// exist upstream.
    async fn fetch_metadata(
        &self,
        title_id: &str,
        version: crate::version::ResolvedVersion,
    ) -> Result<TitleMetadata, SourceError>;

    /// Retrieves the license document for a title.
    ///
    /// `SourceError::NotFound` means the title has no publicly
    /// retrievable license.
    async fn fetch_license(&self, title_id: &str) -> Result<License, SourceError>;

    /// Retrieves all content blobs in encrypted form, one per content
    /// record, in record order.
    async fn fetch_contents_bulk(
        &self,
        title_id: &str,
        metadata: &TitleMetadata,
    ) -> Result<Vec<Vec<u8>>, SourceError>;

    /// Retrieves a single content blob in decrypted form.
    async fn fetch_content_decrypted(
        &self,
        title_id: &str,
        record: &ContentRecord,
    ) -> Result<Vec<u8>, SourceError>;

    /// Retrieves the certificate chain bound into binary packages.
    async fn fetch_cert_chain(&self) -> Result<Vec<u8>, SourceError>;

    /// Assembles the complete native installable package.
    async fn build_native_package(
        &self,
        metadata: &TitleMetadata,
        license: &License,
        contents: &[Vec<u8>],
        cert_chain: &[u8],
    ) -> Result<Vec<u8>, SourceError>;

    /// Assembles the complete handheld-console package around a single
    /// content blob.
    async fn build_handheld_package(
        &self,
        metadata: &TitleMetadata,
        license: &License,
        content: &[u8],
        cert_chain: &[u8],
    ) -> Result<Vec<u8>, SourceError>;
}
