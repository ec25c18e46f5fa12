//! Deterministic zip serialization.
//!
//! Archive downloads must be byte-reproducible across hosts, so this
//! writer pins everything the host normally leaks into a zip: entry
//! timestamps are fixed and the creator-system byte of `version made by`
//! is forced to a single value for every entry.

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;
use thiserror::Error;

/// Creator-system byte stamped on every entry, regardless of host OS.
pub const CREATOR_SYSTEM: u8 = 0;

/// Minimum zip version required to extract deflate entries.
const VERSION_NEEDED: u16 = 20;

/// Fixed DOS date for all entries: 1980-01-01.
const DOS_DATE: u16 = 0x0021;

/// Fixed DOS time for all entries: midnight.
const DOS_TIME: u16 = 0;

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_SIG: u32 = 0x0605_4b50;

const METHOD_DEFLATE: u16 = 8;

/// Errors that can occur while serializing an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Compression failed.
    #[error("Failed to compress entry: {0}")]
    Io(#[from] std::io::Error),

    /// An entry does not fit the 32-bit zip fields.
    #[error("Entry too large for archive: {name}")]
    EntryTooLarge { name: String },
}

struct CentralRecord {
    name: String,
    crc: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    local_header_offset: u32,
}

/// Incremental writer for a deterministic zip archive.
///
/// Entries appear in the archive, and in its central directory, in
/// exactly the order they were added.
pub struct ZipBuilder {
    data: Vec<u8>,
    central: Vec<CentralRecord>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            central: Vec::new(),
        }
    }

    /// Appends one entry, compressing it with deflate.
    pub fn add_entry(&mut self, name: &str, contents: &[u8]) -> Result<(), ArchiveError> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(contents)?;
        let compressed = encoder.finish()?;

        if contents.len() > u32::MAX as usize
            || compressed.len() > u32::MAX as usize
            || self.data.len() > u32::MAX as usize
        {
            return Err(ArchiveError::EntryTooLarge {
                name: name.to_string(),
            });
        }

        let record = CentralRecord {
            name: name.to_string(),
            crc: crc32fast::hash(contents),
            compressed_size: compressed.len() as u32,
            uncompressed_size: contents.len() as u32,
            local_header_offset: self.data.len() as u32,
        };

        // Local file header
        put_u32(&mut self.data, LOCAL_HEADER_SIG);
        put_u16(&mut self.data, VERSION_NEEDED);
        put_u16(&mut self.data, 0); // general purpose flags
        put_u16(&mut self.data, METHOD_DEFLATE);
        put_u16(&mut self.data, DOS_TIME);
        put_u16(&mut self.data, DOS_DATE);
        put_u32(&mut self.data, record.crc);
        put_u32(&mut self.data, record.compressed_size);
        put_u32(&mut self.data, record.uncompressed_size);
        put_u16(&mut self.data, name.len() as u16);
        put_u16(&mut self.data, 0); // extra field length
        self.data.extend_from_slice(name.as_bytes());
        self.data.extend_from_slice(&compressed);

        self.central.push(record);
        Ok(())
    }

    /// Writes the central directory and returns the finished archive.
    pub fn finish(mut self) -> Result<Vec<u8>, ArchiveError> {
        let central_offset = self.data.len() as u32;

        for record in &self.central {
            put_u32(&mut self.data, CENTRAL_HEADER_SIG);
            // version made by: creator system in the high byte, forced.
            put_u16(&mut self.data, ((CREATOR_SYSTEM as u16) << 8) | VERSION_NEEDED);
            put_u16(&mut self.data, VERSION_NEEDED);
            put_u16(&mut self.data, 0); // general purpose flags
            put_u16(&mut self.data, METHOD_DEFLATE);
            put_u16(&mut self.data, DOS_TIME);
            put_u16(&mut self.data, DOS_DATE);
            put_u32(&mut self.data, record.crc);
            put_u32(&mut self.data, record.compressed_size);
            put_u32(&mut self.data, record.uncompressed_size);
            put_u16(&mut self.data, record.name.len() as u16);
            put_u16(&mut self.data, 0); // extra field length
            put_u16(&mut self.data, 0); // comment length
            put_u16(&mut self.data, 0); // disk number start
            put_u16(&mut self.data, 0); // internal attributes
            put_u32(&mut self.data, 0); // external attributes
            put_u32(&mut self.data, record.local_header_offset);
            self.data.extend_from_slice(record.name.as_bytes());
        }

        let central_size = self.data.len() as u32 - central_offset;
        let entries = self.central.len() as u16;

        put_u32(&mut self.data, END_OF_CENTRAL_SIG);
        put_u16(&mut self.data, 0); // disk number
        put_u16(&mut self.data, 0); // central directory disk
        put_u16(&mut self.data, entries);
        put_u16(&mut self.data, entries);
        put_u32(&mut self.data, central_size);
        put_u32(&mut self.data, central_offset);
        put_u16(&mut self.data, 0); // comment length

        Ok(self.data)
    }
}

impl Default for ZipBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::DeflateDecoder;
    use std::io::Read;

    /// Minimal central directory walk used to inspect finished archives.
    fn central_entries(archive: &[u8]) -> Vec<(String, u16)> {
        let eocd = archive.len() - 22;
        assert_eq!(&archive[eocd..eocd + 4], &END_OF_CENTRAL_SIG.to_le_bytes());
        let count = u16::from_le_bytes([archive[eocd + 10], archive[eocd + 11]]) as usize;
        let mut offset =
            u32::from_le_bytes(archive[eocd + 16..eocd + 20].try_into().unwrap()) as usize;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            assert_eq!(&archive[offset..offset + 4], &CENTRAL_HEADER_SIG.to_le_bytes());
            let version_made_by = u16::from_le_bytes([archive[offset + 4], archive[offset + 5]]);
            let name_len =
                u16::from_le_bytes([archive[offset + 28], archive[offset + 29]]) as usize;
            let name =
                String::from_utf8(archive[offset + 46..offset + 46 + name_len].to_vec()).unwrap();
            entries.push((name, version_made_by));
            offset += 46 + name_len;
        }
        entries
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut zip = ZipBuilder::new();
        zip.add_entry("00000002", b"second content").unwrap();
        zip.add_entry("00000000", b"first content").unwrap();
        zip.add_entry("tmd", b"metadata").unwrap();
        let archive = zip.finish().unwrap();

        let names: Vec<String> = central_entries(&archive).into_iter().map(|e| e.0).collect();
        assert_eq!(names, vec!["00000002", "00000000", "tmd"]);
    }

    #[test]
    fn test_creator_system_forced_to_zero() {
        let mut zip = ZipBuilder::new();
        zip.add_entry("tmd", b"metadata").unwrap();
        zip.add_entry("tik", b"license").unwrap();
        let archive = zip.finish().unwrap();

        for (name, version_made_by) in central_entries(&archive) {
            assert_eq!(
                version_made_by >> 8,
                CREATOR_SYSTEM as u16,
                "creator byte leaked for entry {}",
                name
            );
        }
    }

    #[test]
    fn test_archive_is_byte_reproducible() {
        let build = || {
            let mut zip = ZipBuilder::new();
            zip.add_entry("00000000", &[7u8; 1024]).unwrap();
            zip.add_entry("tmd", b"metadata").unwrap();
            zip.finish().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_entry_contents_survive_compression() {
        let payload = b"some title content bytes".repeat(32);
        let mut zip = ZipBuilder::new();
        zip.add_entry("00000001", &payload).unwrap();
        let archive = zip.finish().unwrap();

        // Local header: fixed 30 bytes + name, then the deflate stream.
        let name_len = "00000001".len();
        let compressed_size =
            u32::from_le_bytes(archive[18..22].try_into().unwrap()) as usize;
        let data_start = 30 + name_len;

        let mut decoder = DeflateDecoder::new(&archive[data_start..data_start + compressed_size]);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, payload);

        let crc = u32::from_le_bytes(archive[14..18].try_into().unwrap());
        assert_eq!(crc, crc32fast::hash(&payload));
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let archive = ZipBuilder::new().finish().unwrap();
        assert_eq!(archive.len(), 22);
        assert!(central_entries(&archive).is_empty());
    }
}
