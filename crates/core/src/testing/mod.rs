//! Testing utilities and mock implementations.
//!
//! Provides a scripted [`MockArtifactSource`] and document fixtures so the
//! packaging pipeline and the HTTP layer can be tested without a real
//! distribution network.

mod mock_source;

pub use mock_source::MockArtifactSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::source::{License, TitleMetadata};

    /// Serialize a minimal metadata document the parser accepts.
    ///
    /// `records` is a list of `(content_id, index, size)` triples.
    pub fn tmd_bytes(title_version: u16, records: &[(u32, u16, u64)]) -> Vec<u8> {
        let mut raw = vec![0u8; 0x1E4];
        raw[0x1DC..0x1DE].copy_from_slice(&title_version.to_be_bytes());
        raw[0x1DE..0x1E0].copy_from_slice(&(records.len() as u16).to_be_bytes());

        for (content_id, index, size) in records {
            let mut record = vec![0u8; 0x24];
            record[0..4].copy_from_slice(&content_id.to_be_bytes());
            record[4..6].copy_from_slice(&index.to_be_bytes());
            record[8..16].copy_from_slice(&size.to_be_bytes());
            raw.extend_from_slice(&record);
        }
        raw
    }

    /// Parsed metadata fixture built from [`tmd_bytes`].
    pub fn metadata(title_version: u16, records: &[(u32, u16, u64)]) -> TitleMetadata {
        TitleMetadata::parse(tmd_bytes(title_version, records))
            .expect("fixture metadata must parse")
    }

    /// License fixture of the standard body length.
    pub fn license() -> License {
        License::new(vec![0xAA; 0x2A4])
    }
}
