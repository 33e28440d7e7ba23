use std::{env, str::FromStr, time::Duration};

use url::Url;

use super::env::{
    AccentColor, AppConfig, CloudflareConfig, ConfigError, DirectoryConfig, LoggingConfig,
    ModerationConfig, ScanConfig, VirusTotalConfig,
};

pub const DEFAULT_VIRUSTOTAL_URL: &str = "https://www.virustotal.com";
pub const DEFAULT_CLOUDFLARE_URL: &str = "https://api.cloudflare.com/client/v4";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_bot_token =
            var("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let virustotal = match var("VIRUSTOTAL_SECRET") {
            Some(api_key) => Some(VirusTotalConfig {
                api_key,
                base_url: base_url("VIRUSTOTAL_API_URL", var("VIRUSTOTAL_API_URL"))?
                    .unwrap_or_else(|| DEFAULT_VIRUSTOTAL_URL.to_string()),
            }),
            None => None,
        };

        let cloudflare = match (var("CLOUDFLARE_SECRET"), var("CLOUDFLARE_ACCOUNT")) {
            (Some(api_token), Some(account_id)) => Some(CloudflareConfig {
                api_token,
                account_id,
                base_url: base_url("CLOUDFLARE_API_URL", var("CLOUDFLARE_API_URL"))?
                    .unwrap_or_else(|| DEFAULT_CLOUDFLARE_URL.to_string()),
            }),
            (Some(_), None) => return Err(ConfigError::Missing("CLOUDFLARE_ACCOUNT")),
            (None, Some(_)) => return Err(ConfigError::Missing("CLOUDFLARE_SECRET")),
            (None, None) => None,
        };

        if virustotal.is_none() && cloudflare.is_none() {
            return Err(ConfigError::NoScanners);
        }

        let poll_attempts = parse_or("SCAN_POLL_ATTEMPTS", var("SCAN_POLL_ATTEMPTS"), 10u32)?;
        if poll_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "SCAN_POLL_ATTEMPTS",
                value: "0".to_string(),
            });
        }
        let scan = ScanConfig {
            poll_attempts,
            poll_delay: Duration::from_secs(parse_or(
                "SCAN_POLL_DELAY_SECS",
                var("SCAN_POLL_DELAY_SECS"),
                5u64,
            )?),
            request_timeout: Duration::from_secs(parse_or(
                "SCAN_REQUEST_TIMEOUT_SECS",
                var("SCAN_REQUEST_TIMEOUT_SECS"),
                30u64,
            )?),
        };

        let logging_chat_id = var("LOGGING_CHAT_ID")
            .map(|value| {
                value.trim().parse::<i64>().map_err(|_| ConfigError::Invalid {
                    key: "LOGGING_CHAT_ID",
                    value,
                })
            })
            .transpose()?;

        let moderation = ModerationConfig {
            logging_chat_id,
            accent_color: var("LOGGING_ACCENT_COLOR")
                .map(|value| value.parse::<AccentColor>())
                .transpose()?
                .unwrap_or(AccentColor::DEFAULT),
            reaction_safe: var("REACTION_SAFE").unwrap_or_else(|| "👌".to_string()),
            reaction_unknown: var("REACTION_UNKNOWN").unwrap_or_else(|| "🤔".to_string()),
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        let timezone = var("BOT_TIMEZONE").unwrap_or_else(|| "UTC".to_string());

        Ok(Self {
            telegram_bot_token,
            virustotal,
            cloudflare,
            scan,
            moderation,
            directories,
            logging,
            timezone,
        })
    }
}

/// Accepts absolute http(s) URLs only.
fn base_url(key: &'static str, value: Option<String>) -> Result<Option<String>, ConfigError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Some(raw.trim().to_string())),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
