use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to read the download endpoints cross-origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Distribution network (artifact source) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Base URL of the content distribution network.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Title whose license document carries the retail certificate chain.
    #[serde(default = "default_anchor_title")]
    pub anchor_title: String,
    /// Common key for content decryption, 32 hex digits. Optional; the
    /// decrypted-archive kind is unavailable without it.
    #[serde(default)]
    pub common_key: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            anchor_title: default_anchor_title(),
            common_key: None,
        }
    }
}

fn default_base_url() -> String {
    "http://ccs.cdn.wup.shop.nintendo.net/ccs/download".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_anchor_title() -> String {
    "0000000100000002".to_string()
}

/// Download response mapping configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// HTTP status returned when a title has no publicly retrievable
    /// license. Deployments have historically used 403, 405 and 406.
    #[serde(default = "default_no_license_status")]
    pub no_license_status: u16,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            no_license_status: default_no_license_status(),
        }
    }
}

fn default_no_license_status() -> u16 {
    406
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub source: SanitizedSourceConfig,
    pub download: DownloadConfig,
}

/// Sanitized source config (common key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourceConfig {
    pub base_url: String,
    pub timeout_secs: u32,
    pub anchor_title: String,
    pub common_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            source: SanitizedSourceConfig {
                base_url: config.source.base_url.clone(),
                timeout_secs: config.source.timeout_secs,
                anchor_title: config.source.anchor_title.clone(),
                common_key_configured: config
                    .source
                    .common_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            download: config.download.clone(),
        }
    }
}
