//! The title fetch and packaging pipeline.

use std::sync::Arc;
use tracing::{debug, info};

use crate::source::{ArtifactSource, License, SourceError, TitleMetadata};
use crate::version;

use super::archive::ZipBuilder;
use super::error::PackageError;
use super::types::{OutputKind, PackagedOutput, TitleRequest};

/// Orchestrates one packaging run per request: resolve the version, fetch
/// the artifacts in fixed order, and serialize the requested container.
///
/// The engine holds nothing but the artifact source, so concurrent
/// requests share no mutable state and tests can substitute the source.
pub struct PackagingEngine {
    source: Arc<dyn ArtifactSource>,
}

impl PackagingEngine {
    /// Creates a new engine over the given artifact source.
    pub fn new(source: Arc<dyn ArtifactSource>) -> Self {
        Self { source }
    }

    /// Runs the full pipeline for one request.
    ///
    /// Classified failures: an unknown title/version terminates with
    /// `TitleNotFound` after the metadata step; a missing license
    /// terminates with `NoLicense` after the license step. Later failures
    /// propagate unclassified. No step is retried.
    pub async fn package(
        &self,
        request: &TitleRequest,
        kind: OutputKind,
    ) -> Result<PackagedOutput, PackageError> {
        let title_id = request.title_id.as_str();
        let resolved = version::resolve(&request.version_token);
        debug!(
            title_id = title_id,
            kind = kind.as_str(),
            version = %resolved,
            "Starting packaging pipeline"
        );

        // The metadata document is the existence check for the title; no
        // further artifact is requested if it is missing.
        let metadata = self
            .source
            .fetch_metadata(title_id, resolved)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    PackageError::TitleNotFound(title_id.to_string())
                } else {
                    PackageError::Source(e)
                }
            })?;

        let license = if kind.requires_license() {
            let license = self.source.fetch_license(title_id).await.map_err(|e| {
                if e.is_not_found() {
                    PackageError::NoLicense(title_id.to_string())
                } else {
                    PackageError::Source(e)
                }
            })?;
            Some(license)
        } else {
            None
        };

        let contents = self.fetch_contents(title_id, &metadata, kind).await?;

        let cert_chain = if kind.requires_cert_chain() {
            self.source
                .fetch_cert_chain()
                .await
                .map_err(PackageError::Source)?
        } else {
            Vec::new()
        };

        let bytes = self
            .serialize(kind, &metadata, license.as_ref(), contents, &cert_chain)
            .await?;

        let final_version = resolved
            .exact()
            .unwrap_or_else(|| metadata.title_version as u32);
        let suggested_filename = format!(
            "{}-v{}{}",
            title_id,
            final_version,
            kind.filename_suffix()
        );

        info!(
            title_id = title_id,
            kind = kind.as_str(),
            final_version = final_version,
            bytes = bytes.len(),
            "Packaged title"
        );

        Ok(PackagedOutput {
            bytes,
            final_version,
            suggested_filename,
            content_type: kind.content_type(),
        })
    }

    /// Fetches all content blobs in metadata record order.
    ///
    /// The decrypted kind retrieves through the decrypting path, one call
    /// per record; every other kind uses the bulk encrypted retrieval.
    async fn fetch_contents(
        &self,
        title_id: &str,
        metadata: &TitleMetadata,
        kind: OutputKind,
    ) -> Result<Vec<Vec<u8>>, PackageError> {
        match kind {
            OutputKind::DecryptedArchive => {
                let mut contents = Vec::with_capacity(metadata.content_records.len());
                for record in &metadata.content_records {
                    let blob = self
                        .source
                        .fetch_content_decrypted(title_id, record)
                        .await
                        .map_err(PackageError::Source)?;
                    contents.push(blob);
                }
                Ok(contents)
            }
            _ => self
                .source
                .fetch_contents_bulk(title_id, metadata)
                .await
                .map_err(PackageError::Source),
        }
    }

    async fn serialize(
        &self,
        kind: OutputKind,
        metadata: &TitleMetadata,
        license: Option<&License>,
        contents: Vec<Vec<u8>>,
        cert_chain: &[u8],
    ) -> Result<Vec<u8>, PackageError> {
        match kind {
            OutputKind::NativePackage => {
                let license = license.expect("license is fetched for the native package kind");
                self.source
                    .build_native_package(metadata, license, &contents, cert_chain)
                    .await
                    .map_err(PackageError::Source)
            }
            OutputKind::HandheldPackage => {
                let license = license.expect("license is fetched for the handheld package kind");
                let content = contents.into_iter().next().ok_or_else(|| {
                    PackageError::Source(SourceError::MalformedDocument(
                        "title has no content records".to_string(),
                    ))
                })?;
                self.source
                    .build_handheld_package(metadata, license, &content, cert_chain)
                    .await
                    .map_err(PackageError::Source)
            }
            OutputKind::EncryptedArchive | OutputKind::DecryptedArchive => {
                // The decrypted kind carries the license as a trailing
                // entry; the encrypted kind never fetched one.
                let license = match kind {
                    OutputKind::DecryptedArchive => {
                        Some(license.expect("license is fetched for the decrypted archive kind"))
                    }
                    _ => None,
                };
                Ok(build_archive(kind, metadata, license, &contents)?)
            }
        }
    }
}

/// Builds the zip for the archive kinds.
///
/// Content entries appear in metadata record order, named by content id
/// as 8 uppercase hex digits (`.app` suffix for decrypted contents). The
/// metadata document follows as `tmd`, then the license as `tik` when
/// present.
fn build_archive(
    kind: OutputKind,
    metadata: &TitleMetadata,
    license: Option<&License>,
    contents: &[Vec<u8>],
) -> Result<Vec<u8>, super::archive::ArchiveError> {
    let mut zip = ZipBuilder::new();

    for (record, blob) in metadata.content_records.iter().zip(contents) {
        let name = match kind {
            OutputKind::DecryptedArchive => format!("{:08X}.app", record.content_id),
            _ => format!("{:08X}", record.content_id),
        };
        zip.add_entry(&name, blob)?;
    }

    zip.add_entry("tmd", &metadata.raw)?;
    if let Some(license) = license {
        zip.add_entry("tik", &license.raw)?;
    }

    zip.finish()
}
