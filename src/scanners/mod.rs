pub mod cloudflare;
pub mod virustotal;

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{config::AppConfig, domain::Verdict};

pub use cloudflare::CloudflareScanner;
pub use virustotal::VirusTotalScanner;

pub type SharedScanner = Arc<dyn UrlScanner>;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{stage} request rejected with status {status}")]
    Rejected {
        stage: &'static str,
        status: StatusCode,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no result after {attempts} poll attempts")]
    Exhausted { attempts: u32 },
}

/// A third-party reputation service that can judge a single URL.
pub trait UrlScanner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs the vendor protocol and reports every failure as an error.
    fn check<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Verdict, ScanError>>;

    /// Like [`UrlScanner::check`], but any failure becomes [`Verdict::Unknown`].
    fn scan<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Verdict> {
        Box::pin(async move {
            match self.check(url).await {
                Ok(verdict) => verdict,
                Err(err) => {
                    tracing::warn!(
                        target: "scanner",
                        scanner = self.name(),
                        url,
                        error = %err,
                        "scan failed; treating url as unknown"
                    );
                    Verdict::Unknown
                }
            }
        })
    }
}

/// Builds one scanner per vendor present in the config.
pub fn build_scanners(http: &Client, config: &AppConfig) -> Vec<SharedScanner> {
    let mut scanners: Vec<SharedScanner> = Vec::new();
    if let Some(vt) = &config.virustotal {
        scanners.push(Arc::new(VirusTotalScanner::new(
            http.clone(),
            vt.clone(),
            config.scan.clone(),
        )));
    }
    if let Some(cf) = &config.cloudflare {
        scanners.push(Arc::new(CloudflareScanner::new(
            http.clone(),
            cf.clone(),
            config.scan.clone(),
        )));
    }
    scanners
}

pub(crate) fn expect_ok(response: &Response, stage: &'static str) -> Result<(), ScanError> {
    let status = response.status();
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(ScanError::Rejected { stage, status })
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ScanError> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl UrlScanner for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn check<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<Verdict, ScanError>> {
            Box::pin(async { Err::<Verdict, _>(ScanError::Exhausted { attempts: 1 }) })
        }
    }

    #[tokio::test]
    async fn errors_become_unknown() {
        assert_eq!(Failing.scan("https://example.com").await, Verdict::Unknown);
    }

    #[test]
    fn builds_only_configured_vendors() {
        let config = AppConfig::from_lookup(|key| match key {
            "TELEGRAM_BOT_TOKEN" => Some("t".to_string()),
            "VIRUSTOTAL_SECRET" => Some("vt".to_string()),
            _ => None,
        })
        .expect("valid config");
        let scanners = build_scanners(&Client::new(), &config);
        let names: Vec<_> = scanners.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["virustotal"]);
    }
}
