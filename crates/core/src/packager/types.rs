//! Packaging request and output types.

use serde::Serialize;

/// An incoming packaging request, consumed by one pipeline run.
#[derive(Debug, Clone)]
pub struct TitleRequest {
    /// Opaque title identifier; not validated for format here.
    pub title_id: String,
    /// Raw version token as supplied by the caller.
    pub version_token: String,
}

impl TitleRequest {
    pub fn new(title_id: impl Into<String>, version_token: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            version_token: version_token.into(),
        }
    }
}

/// The output container a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Native installable binary package (`.wad`).
    NativePackage,
    /// Zip of encrypted contents plus the metadata document.
    EncryptedArchive,
    /// Zip of decrypted contents plus metadata and license documents.
    DecryptedArchive,
    /// Handheld-console binary package (`.tad`).
    HandheldPackage,
}

impl OutputKind {
    /// Short identifier used in routes, logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativePackage => "wad",
            Self::EncryptedArchive => "enc",
            Self::DecryptedArchive => "dec",
            Self::HandheldPackage => "tad",
        }
    }

    /// Whether this kind needs the title's license document.
    ///
    /// The encrypted archive packages undecrypted content, which keeps it
    /// retrievable even for titles without a public license.
    pub fn requires_license(&self) -> bool {
        !matches!(self, Self::EncryptedArchive)
    }

    /// Whether this kind binds the certificate chain into the package.
    pub fn requires_cert_chain(&self) -> bool {
        matches!(self, Self::NativePackage | Self::HandheldPackage)
    }

    /// Filename suffix appended to `{title_id}-v{version}`.
    pub fn filename_suffix(&self) -> &'static str {
        match self {
            Self::NativePackage => ".wad",
            Self::EncryptedArchive => "-Encrypted.zip",
            Self::DecryptedArchive => "-Decrypted.zip",
            Self::HandheldPackage => ".tad",
        }
    }

    /// Content type of the produced bytes.
    pub fn content_type(&self) -> PackageContentType {
        match self {
            Self::NativePackage | Self::HandheldPackage => PackageContentType::OctetStream,
            Self::EncryptedArchive | Self::DecryptedArchive => PackageContentType::Zip,
        }
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media type of a packaged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageContentType {
    OctetStream,
    Zip,
}

impl PackageContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::OctetStream => "application/octet-stream",
            Self::Zip => "application/zip",
        }
    }
}

/// The assembled download, produced exactly once per successful request.
#[derive(Debug, Clone)]
pub struct PackagedOutput {
    pub bytes: Vec<u8>,
    pub final_version: u32,
    pub suggested_filename: String,
    pub content_type: PackageContentType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_encrypted_archive_skips_license() {
        assert!(OutputKind::NativePackage.requires_license());
        assert!(OutputKind::DecryptedArchive.requires_license());
        assert!(OutputKind::HandheldPackage.requires_license());
        assert!(!OutputKind::EncryptedArchive.requires_license());
    }

    #[test]
    fn test_cert_chain_only_for_binary_packages() {
        assert!(OutputKind::NativePackage.requires_cert_chain());
        assert!(OutputKind::HandheldPackage.requires_cert_chain());
        assert!(!OutputKind::EncryptedArchive.requires_cert_chain());
        assert!(!OutputKind::DecryptedArchive.requires_cert_chain());
    }

    #[test]
    fn test_filename_suffixes() {
        assert_eq!(OutputKind::NativePackage.filename_suffix(), ".wad");
        assert_eq!(OutputKind::EncryptedArchive.filename_suffix(), "-Encrypted.zip");
        assert_eq!(OutputKind::DecryptedArchive.filename_suffix(), "-Decrypted.zip");
        assert_eq!(OutputKind::HandheldPackage.filename_suffix(), ".tad");
    }

    #[test]
    fn test_content_types() {
        assert_eq!(
            OutputKind::NativePackage.content_type().mime(),
            "application/octet-stream"
        );
        assert_eq!(
            OutputKind::EncryptedArchive.content_type().mime(),
            "application/zip"
        );
    }
}
