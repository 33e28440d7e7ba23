use std::{fmt, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub virustotal: Option<VirusTotalConfig>,
    pub cloudflare: Option<CloudflareConfig>,
    pub scan: ScanConfig,
    pub moderation: ModerationConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct VirusTotalConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct CloudflareConfig {
    pub api_token: String,
    pub account_id: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub poll_attempts: u32,
    pub poll_delay: Duration,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub logging_chat_id: Option<i64>,
    pub accent_color: AccentColor,
    pub reaction_safe: String,
    pub reaction_unknown: String,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

/// RGB accent used to tint deletion notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccentColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AccentColor {
    pub const DEFAULT: AccentColor = AccentColor {
        r: 0xED,
        g: 0x43,
        b: 0x37,
    };
}

impl FromStr for AccentColor {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ConfigError::Invalid {
                key: "LOGGING_ACCENT_COLOR",
                value: value.to_string(),
            });
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
        match (channel(0..2), channel(2..4), channel(4..6)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self { r, g, b }),
            _ => Err(ConfigError::Invalid {
                key: "LOGGING_ACCENT_COLOR",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for AccentColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("no URL scanner configured; set VIRUSTOTAL_SECRET or CLOUDFLARE_SECRET and CLOUDFLARE_ACCOUNT")]
    NoScanners,
}
