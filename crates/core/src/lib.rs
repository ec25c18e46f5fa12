pub mod config;
pub mod packager;
pub mod source;
pub mod testing;
pub mod version;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DownloadConfig,
    SanitizedConfig, ServerConfig, SourceConfig,
};
pub use packager::{
    ArchiveError, OutputKind, PackageContentType, PackageError, PackagedOutput, PackagingEngine,
    TitleRequest, ZipBuilder, CREATOR_SYSTEM,
};
pub use source::{ArtifactSource, ContentRecord, License, NusSource, SourceError, TitleMetadata};
pub use version::ResolvedVersion;
