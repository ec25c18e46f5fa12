//! Artifact document types.

use super::error::SourceError;

/// Byte length of a title metadata document header before the content
/// records begin.
const TMD_RECORDS_OFFSET: usize = 0x1E4;

/// Byte length of one content record inside the metadata document.
const TMD_RECORD_LEN: usize = 0x24;

/// Offset of the title version field inside the metadata document.
const TMD_TITLE_VERSION_OFFSET: usize = 0x1DC;

/// Offset of the content record count inside the metadata document.
const TMD_CONTENT_COUNT_OFFSET: usize = 0x1DE;

/// One content record from a title's metadata document.
///
/// Record order in the metadata defines the on-archive ordering of the
/// corresponding blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRecord {
    /// Identifier used to retrieve the blob and to name archive entries.
    pub content_id: u32,
    /// Position of the content within the title.
    pub index: u16,
    /// Decrypted content length in bytes.
    pub size: u64,
}

/// A title's retrieved metadata document (TMD).
///
/// Owned by a single pipeline invocation and immutable after retrieval.
/// `raw` is the serialized document exactly as retrieved; it is what gets
/// written to the `tmd` archive entry and into binary packages.
#[derive(Debug, Clone)]
pub struct TitleMetadata {
    pub title_version: u16,
    pub content_records: Vec<ContentRecord>,
    pub raw: Vec<u8>,
}

impl TitleMetadata {
    /// Parses the fields the pipeline needs out of a serialized metadata
    /// document. The rest of the document is carried opaquely in `raw`.
    pub fn parse(raw: Vec<u8>) -> Result<Self, SourceError> {
        if raw.len() < TMD_RECORDS_OFFSET {
            return Err(SourceError::MalformedDocument(format!(
                "metadata document too short: {} bytes",
                raw.len()
            )));
        }

        let title_version = read_u16(&raw, TMD_TITLE_VERSION_OFFSET);
        let content_count = read_u16(&raw, TMD_CONTENT_COUNT_OFFSET) as usize;

        let records_end = TMD_RECORDS_OFFSET + content_count * TMD_RECORD_LEN;
        if raw.len() < records_end {
            return Err(SourceError::MalformedDocument(format!(
                "metadata document truncated: {} content records declared, {} bytes present",
                content_count,
                raw.len()
            )));
        }

        let mut content_records = Vec::with_capacity(content_count);
        for i in 0..content_count {
            let base = TMD_RECORDS_OFFSET + i * TMD_RECORD_LEN;
            content_records.push(ContentRecord {
                content_id: read_u32(&raw, base),
                index: read_u16(&raw, base + 4),
                size: read_u64(&raw, base + 8),
            });
        }

        Ok(Self {
            title_version,
            content_records,
            raw,
        })
    }
}

/// A title's license document (ticket). Opaque to the pipeline; bound 1:1
/// to a title id. Absence is an expected outcome, not a generic failure.
#[derive(Debug, Clone)]
pub struct License {
    pub raw: Vec<u8>,
}

impl License {
    pub fn new(raw: Vec<u8>) -> Self {
        Self { raw }
    }
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_parse_metadata_fields() {
        let raw = fixtures::tmd_bytes(512, &[(0, 0, 16), (1, 1, 32), (2, 2, 64)]);
        let metadata = TitleMetadata::parse(raw.clone()).unwrap();

        assert_eq!(metadata.title_version, 512);
        assert_eq!(metadata.content_records.len(), 3);
        assert_eq!(metadata.content_records[0].content_id, 0);
        assert_eq!(metadata.content_records[1].index, 1);
        assert_eq!(metadata.content_records[2].size, 64);
        assert_eq!(metadata.raw, raw);
    }

    #[test]
    fn test_parse_too_short_fails() {
        let result = TitleMetadata::parse(vec![0u8; 16]);
        assert!(matches!(
            result,
            Err(SourceError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_parse_truncated_records_fails() {
        let mut raw = fixtures::tmd_bytes(1, &[(0, 0, 16)]);
        raw.truncate(raw.len() - 4);
        let result = TitleMetadata::parse(raw);
        assert!(matches!(
            result,
            Err(SourceError::MalformedDocument(_))
        ));
    }
}
