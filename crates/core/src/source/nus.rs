//! CDN-backed artifact source.
//!
//! Talks to a NUS-style content distribution network over plain HTTP GETs:
//! `{base}/{title_id}/tmd[.{version}]` for metadata, `{base}/{title_id}/cetk`
//! for licenses and `{base}/{title_id}/{content_id:08X}` for encrypted
//! content blobs. Package assembly and content decryption are provided
//! here as well, so the pipeline never touches binary layouts or key
//! material itself.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, KeyIvInit};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::config::SourceConfig;
use crate::version::ResolvedVersion;

use super::error::SourceError;
use super::traits::ArtifactSource;
use super::types::{ContentRecord, License, TitleMetadata};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Byte length of the signed license body; the certificate chain follows.
const LICENSE_BODY_LEN: usize = 0x2A4;

/// Offset of the encrypted title key inside a license document.
const TITLE_KEY_OFFSET: usize = 0x1BF;

/// Alignment of every section inside a binary package container.
const SECTION_ALIGN: usize = 0x40;

/// Fixed size of the container header.
const CONTAINER_HEADER_SIZE: u32 = 0x20;

/// Container type tag for installable packages.
const CONTAINER_TYPE: [u8; 4] = *b"Is\0\0";

/// Artifact source backed by a NUS-style CDN.
pub struct NusSource {
    client: Client,
    config: SourceConfig,
    common_key: Option<[u8; 16]>,
}

impl NusSource {
    /// Create a new NusSource with the given configuration.
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        let common_key = match &config.common_key {
            Some(hex_key) => {
                let bytes = hex::decode(hex_key)
                    .map_err(|e| SourceError::KeyUnavailable(format!("invalid hex key: {}", e)))?;
                let key: [u8; 16] = bytes.try_into().map_err(|_| {
                    SourceError::KeyUnavailable("common key must be 16 bytes".to_string())
                })?;
                Some(key)
            }
            None => None,
        };

        Ok(Self {
            client,
            config,
            common_key,
        })
    }

    fn title_url(&self, title_id: &str, artifact: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            title_id,
            artifact
        )
    }

    /// Fetch one artifact, mapping 404 to `NotFound` for the given title.
    async fn get_bytes(&self, url: &str, title_id: &str) -> Result<Vec<u8>, SourceError> {
        debug!(url = url, "Fetching artifact");

        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::not_found(title_id));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Upstream {
                status,
                detail: body.chars().take(200).collect(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Derive the title key from a license document using the configured
    /// common key.
    fn title_key(&self, title_id: &str, license: &License) -> Result<[u8; 16], SourceError> {
        let common_key = self.common_key.ok_or_else(|| {
            SourceError::KeyUnavailable(
                "content decryption requires source.common_key to be configured".to_string(),
            )
        })?;

        if license.raw.len() < TITLE_KEY_OFFSET + 16 {
            return Err(SourceError::MalformedDocument(format!(
                "license document too short: {} bytes",
                license.raw.len()
            )));
        }

        let tid_bytes = hex::decode(title_id).map_err(|_| {
            SourceError::MalformedDocument(format!("title id is not hex: {}", title_id))
        })?;
        if tid_bytes.len() != 8 {
            return Err(SourceError::MalformedDocument(format!(
                "title id must be 16 hex digits: {}",
                title_id
            )));
        }

        // Title key IV is the title id padded with zeros.
        let mut iv = [0u8; 16];
        iv[..8].copy_from_slice(&tid_bytes);

        let encrypted: [u8; 16] = license.raw[TITLE_KEY_OFFSET..TITLE_KEY_OFFSET + 16]
            .try_into()
            .unwrap();

        let decrypted = decrypt_cbc(&common_key, &iv, &encrypted)?;
        Ok(decrypted.try_into().unwrap())
    }
}

#[async_trait]
impl ArtifactSource for NusSource {
    fn name(&self) -> &str {
        "nus"
    }

    async fn fetch_metadata(
        &self,
        title_id: &str,
        version: ResolvedVersion,
    ) -> Result<TitleMetadata, SourceError> {
        let artifact = match version.exact() {
            Some(v) => format!("tmd.{}", v),
            None => "tmd".to_string(),
        };
        let raw = self.get_bytes(&self.title_url(title_id, &artifact), title_id).await?;
        TitleMetadata::parse(raw)
    }

    async fn fetch_license(&self, title_id: &str) -> Result<License, SourceError> {
        let raw = self.get_bytes(&self.title_url(title_id, "cetk"), title_id).await?;
        Ok(License::new(raw))
    }

    async fn fetch_contents_bulk(
        &self,
        title_id: &str,
        metadata: &TitleMetadata,
    ) -> Result<Vec<Vec<u8>>, SourceError> {
        // One GET per record, fanned out; try_join_all keeps record order.
        let fetches = metadata.content_records.iter().map(|record| {
            let url = self.title_url(title_id, &format!("{:08X}", record.content_id));
            async move { self.get_bytes(&url, title_id).await }
        });
        try_join_all(fetches).await
    }

    async fn fetch_content_decrypted(
        &self,
        title_id: &str,
        record: &ContentRecord,
    ) -> Result<Vec<u8>, SourceError> {
        let license = self.fetch_license(title_id).await?;
        let title_key = self.title_key(title_id, &license)?;

        let url = self.title_url(title_id, &format!("{:08X}", record.content_id));
        let encrypted = self.get_bytes(&url, title_id).await?;

        // Content IV is the record index padded with zeros.
        let mut iv = [0u8; 16];
        iv[..2].copy_from_slice(&record.index.to_be_bytes());

        let mut decrypted = decrypt_cbc(&title_key, &iv, &encrypted)?;
        if (record.size as usize) > decrypted.len() {
            return Err(SourceError::MalformedDocument(format!(
                "content {:08X} shorter than its declared size",
                record.content_id
            )));
        }
        decrypted.truncate(record.size as usize);
        Ok(decrypted)
    }

    async fn fetch_cert_chain(&self) -> Result<Vec<u8>, SourceError> {
        // The CDN has no standalone certificate endpoint; the retail chain
        // is appended to the anchor title's license document.
        let anchor = self.config.anchor_title.clone();
        let license = self.fetch_license(&anchor).await?;
        cert_chain_from_license(&license.raw)
    }

    async fn build_native_package(
        &self,
        metadata: &TitleMetadata,
        license: &License,
        contents: &[Vec<u8>],
        cert_chain: &[u8],
    ) -> Result<Vec<u8>, SourceError> {
        let content_refs: Vec<&[u8]> = contents.iter().map(|c| c.as_slice()).collect();
        Ok(assemble_container(
            cert_chain,
            &license.raw,
            &metadata.raw,
            &content_refs,
        ))
    }

    async fn build_handheld_package(
        &self,
        metadata: &TitleMetadata,
        license: &License,
        content: &[u8],
        cert_chain: &[u8],
    ) -> Result<Vec<u8>, SourceError> {
        Ok(assemble_container(
            cert_chain,
            &license.raw,
            &metadata.raw,
            &[content],
        ))
    }
}

/// Slice the certificate chain off the end of a license document.
fn cert_chain_from_license(raw: &[u8]) -> Result<Vec<u8>, SourceError> {
    if raw.len() <= LICENSE_BODY_LEN {
        return Err(SourceError::MalformedDocument(
            "license document carries no certificate chain".to_string(),
        ));
    }
    Ok(raw[LICENSE_BODY_LEN..].to_vec())
}

fn decrypt_cbc(key: &[u8; 16], iv: &[u8; 16], data: &[u8]) -> Result<Vec<u8>, SourceError> {
    if data.len() % 16 != 0 {
        return Err(SourceError::DecryptFailed(format!(
            "ciphertext length {} is not block-aligned",
            data.len()
        )));
    }
    let mut buf = data.to_vec();
    Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|e| SourceError::DecryptFailed(e.to_string()))?;
    Ok(buf)
}

/// Assemble the installable container: fixed header followed by cert
/// chain, license, metadata and content sections, each aligned to 0x40.
/// The content size field covers the whole contents section including
/// inter-content padding.
fn assemble_container(
    cert_chain: &[u8],
    license: &[u8],
    metadata: &[u8],
    contents: &[&[u8]],
) -> Vec<u8> {
    let mut content_section = Vec::new();
    for content in contents {
        content_section.extend_from_slice(content);
        pad_to_align(&mut content_section);
    }

    let mut header = Vec::with_capacity(CONTAINER_HEADER_SIZE as usize);
    header.extend_from_slice(&CONTAINER_HEADER_SIZE.to_be_bytes());
    header.extend_from_slice(&CONTAINER_TYPE);
    header.extend_from_slice(&(cert_chain.len() as u32).to_be_bytes());
    header.extend_from_slice(&0u32.to_be_bytes()); // revocation list, unused
    header.extend_from_slice(&(license.len() as u32).to_be_bytes());
    header.extend_from_slice(&(metadata.len() as u32).to_be_bytes());
    header.extend_from_slice(&(content_section.len() as u32).to_be_bytes());
    header.extend_from_slice(&0u32.to_be_bytes()); // footer, unused

    let mut out = header;
    pad_to_align(&mut out);
    for section in [cert_chain, license, metadata] {
        out.extend_from_slice(section);
        pad_to_align(&mut out);
    }
    out.extend_from_slice(&content_section);
    out
}

fn pad_to_align(buf: &mut Vec<u8>) {
    let rem = buf.len() % SECTION_ALIGN;
    if rem != 0 {
        buf.resize(buf.len() + SECTION_ALIGN - rem, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_url() {
        let source = NusSource::new(SourceConfig {
            base_url: "http://cdn.example.test/ccs/download/".to_string(),
            ..SourceConfig::default()
        })
        .unwrap();

        assert_eq!(
            source.title_url("0001000248414141", "tmd.512"),
            "http://cdn.example.test/ccs/download/0001000248414141/tmd.512"
        );
        assert_eq!(
            source.title_url("0001000248414141", &format!("{:08X}", 0x1cu32)),
            "http://cdn.example.test/ccs/download/0001000248414141/0000001C"
        );
    }

    #[test]
    fn test_new_rejects_bad_common_key() {
        let result = NusSource::new(SourceConfig {
            common_key: Some("zz112233445566778899aabbccddeeff".to_string()),
            ..SourceConfig::default()
        });
        assert!(matches!(result, Err(SourceError::KeyUnavailable(_))));

        let result = NusSource::new(SourceConfig {
            common_key: Some("0011".to_string()),
            ..SourceConfig::default()
        });
        assert!(matches!(result, Err(SourceError::KeyUnavailable(_))));
    }

    #[test]
    fn test_cert_chain_from_license() {
        let mut raw = vec![0u8; LICENSE_BODY_LEN];
        raw.extend_from_slice(b"CERTCHAIN");
        assert_eq!(cert_chain_from_license(&raw).unwrap(), b"CERTCHAIN");

        let short = vec![0u8; LICENSE_BODY_LEN];
        assert!(cert_chain_from_license(&short).is_err());
    }

    #[test]
    fn test_assemble_container_layout() {
        let cert = vec![1u8; 10];
        let license = vec![2u8; 0x2A4];
        let metadata = vec![3u8; 0x1E4];
        let contents: Vec<&[u8]> = vec![&[4u8; 5], &[5u8; 0x40]];

        let out = assemble_container(&cert, &license, &metadata, &contents);

        // Header fields
        assert_eq!(&out[0..4], &0x20u32.to_be_bytes());
        assert_eq!(&out[4..8], b"Is\0\0");
        assert_eq!(&out[8..12], &10u32.to_be_bytes());
        assert_eq!(&out[16..20], &(0x2A4u32).to_be_bytes());
        assert_eq!(&out[20..24], &(0x1E4u32).to_be_bytes());
        // Two contents: 5 bytes padded to 0x40, plus 0x40.
        assert_eq!(&out[24..28], &(0x80u32).to_be_bytes());

        // Sections land on aligned offsets.
        assert_eq!(&out[0x40..0x4A], &cert[..]);
        assert_eq!(&out[0x80..0x80 + 0x2A4], &license[..]);
        assert_eq!(out.len() % SECTION_ALIGN, 0);

        // Deterministic assembly.
        assert_eq!(out, assemble_container(&cert, &license, &metadata, &contents));
    }

    #[test]
    fn test_decrypt_cbc_rejects_unaligned_input() {
        let key = [0u8; 16];
        let iv = [0u8; 16];
        assert!(matches!(
            decrypt_cbc(&key, &iv, &[0u8; 15]),
            Err(SourceError::DecryptFailed(_))
        ));
        assert!(decrypt_cbc(&key, &iv, &[0u8; 32]).is_ok());
    }
}
