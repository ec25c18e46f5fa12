//! Scripted artifact source for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::source::{
    ArtifactSource, ContentRecord, License, SourceError, TitleMetadata,
};
use crate::version::ResolvedVersion;

#[derive(Default)]
struct MockState {
    metadata: Option<TitleMetadata>,
    license: Option<License>,
    contents: HashMap<u32, Vec<u8>>,
    cert_chain: Vec<u8>,
    fail_contents: bool,
    calls: Vec<String>,
}

/// Mock artifact source with scripted responses and a call log.
///
/// Absent metadata or license behave as upstream not-found; everything
/// else is returned as configured. Each trait call is recorded so tests
/// can assert on sequencing (notably that some kinds never request a
/// license).
#[derive(Default)]
pub struct MockArtifactSource {
    state: Mutex<MockState>,
}

impl MockArtifactSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the metadata document; `None` makes the title unknown.
    pub fn set_metadata(&self, metadata: Option<TitleMetadata>) {
        self.state.lock().unwrap().metadata = metadata;
    }

    /// Configure the license document; `None` makes it unavailable.
    pub fn set_license(&self, license: Option<License>) {
        self.state.lock().unwrap().license = license;
    }

    /// Configure the blob returned for a content id (both retrieval modes).
    pub fn set_content(&self, content_id: u32, bytes: Vec<u8>) {
        self.state.lock().unwrap().contents.insert(content_id, bytes);
    }

    pub fn set_cert_chain(&self, bytes: Vec<u8>) {
        self.state.lock().unwrap().cert_chain = bytes;
    }

    /// Make every content retrieval fail with an upstream error.
    pub fn set_fail_contents(&self, fail: bool) {
        self.state.lock().unwrap().fail_contents = fail;
    }

    /// Names of all trait operations invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }

    fn content(&self, content_id: u32) -> Result<Vec<u8>, SourceError> {
        let state = self.state.lock().unwrap();
        if state.fail_contents {
            return Err(SourceError::Upstream {
                status: 500,
                detail: "mock content failure".to_string(),
            });
        }
        state.contents.get(&content_id).cloned().ok_or_else(|| {
            SourceError::Upstream {
                status: 500,
                detail: format!("mock has no content {:08X}", content_id),
            }
        })
    }
}

#[async_trait]
impl ArtifactSource for MockArtifactSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_metadata(
        &self,
        title_id: &str,
        version: ResolvedVersion,
    ) -> Result<TitleMetadata, SourceError> {
        self.record(format!("fetch_metadata:{}", version));
        self.state
            .lock()
            .unwrap()
            .metadata
            .clone()
            .ok_or_else(|| SourceError::not_found(title_id))
    }

    async fn fetch_license(&self, title_id: &str) -> Result<License, SourceError> {
        self.record("fetch_license");
        self.state
            .lock()
            .unwrap()
            .license
            .clone()
            .ok_or_else(|| SourceError::not_found(title_id))
    }

    async fn fetch_contents_bulk(
        &self,
        _title_id: &str,
        metadata: &TitleMetadata,
    ) -> Result<Vec<Vec<u8>>, SourceError> {
        self.record("fetch_contents_bulk");
        metadata
            .content_records
            .iter()
            .map(|record| self.content(record.content_id))
            .collect()
    }

    async fn fetch_content_decrypted(
        &self,
        _title_id: &str,
        record: &ContentRecord,
    ) -> Result<Vec<u8>, SourceError> {
        self.record(format!("fetch_content_decrypted:{:08X}", record.content_id));
        self.content(record.content_id)
    }

    async fn fetch_cert_chain(&self) -> Result<Vec<u8>, SourceError> {
        self.record("fetch_cert_chain");
        Ok(self.state.lock().unwrap().cert_chain.clone())
    }

    async fn build_native_package(
        &self,
        metadata: &TitleMetadata,
        license: &License,
        contents: &[Vec<u8>],
        cert_chain: &[u8],
    ) -> Result<Vec<u8>, SourceError> {
        self.record("build_native_package");
        let mut out = b"WAD\0".to_vec();
        out.extend_from_slice(cert_chain);
        out.extend_from_slice(&license.raw);
        out.extend_from_slice(&metadata.raw);
        for content in contents {
            out.extend_from_slice(content);
        }
        Ok(out)
    }

    async fn build_handheld_package(
        &self,
        metadata: &TitleMetadata,
        license: &License,
        content: &[u8],
        cert_chain: &[u8],
    ) -> Result<Vec<u8>, SourceError> {
        self.record("build_handheld_package");
        let mut out = b"TAD\0".to_vec();
        out.extend_from_slice(cert_chain);
        out.extend_from_slice(&license.raw);
        out.extend_from_slice(&metadata.raw);
        out.extend_from_slice(content);
        Ok(out)
    }
}
