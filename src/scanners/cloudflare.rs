use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::{
    config::{CloudflareConfig, ScanConfig},
    domain::Verdict,
};

use super::{expect_ok, read_json, ScanError, UrlScanner};

/// Submit-and-poll client for the Cloudflare URL Scanner v2 API.
///
/// Scans run asynchronously on Cloudflare's side: the result endpoint answers with a non-200
/// status until the report is ready, so it is polled up to `poll_attempts` times with
/// `poll_delay` between attempts.
#[derive(Clone)]
pub struct CloudflareScanner {
    http: Client,
    config: CloudflareConfig,
    scan: ScanConfig,
}

impl CloudflareScanner {
    pub fn new(http: Client, config: CloudflareConfig, scan: ScanConfig) -> Self {
        Self { http, config, scan }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/accounts/{}/urlscanner/v2/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_id,
            path
        )
    }

    async fn submit(&self, url: &str) -> Result<String, ScanError> {
        let response = self
            .http
            .post(self.endpoint("scan"))
            .bearer_auth(&self.config.api_token)
            .json(&ScanRequest { url })
            .timeout(self.scan.request_timeout)
            .send()
            .await?;

        if let Err(err) = expect_ok(&response, "submit") {
            tracing::error!(
                target: "scanner",
                status = response.status().as_u16(),
                "error submitting url to Cloudflare URL scanner"
            );
            return Err(err);
        }

        let submission: ScanSubmission = read_json(response).await?;
        tracing::info!(
            target: "scanner",
            uuid = %submission.uuid,
            "retrieved Cloudflare scan identifier"
        );
        Ok(submission.uuid)
    }

    async fn poll_result(&self, uuid: &str) -> Result<bool, ScanError> {
        let attempts = self.scan.poll_attempts;
        for attempt in 1..=attempts {
            let response = self
                .http
                .get(self.endpoint(&format!("result/{uuid}")))
                .bearer_auth(&self.config.api_token)
                .timeout(self.scan.request_timeout)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::OK {
                let result: ScanResult = read_json(response).await?;
                return Ok(result.verdicts.overall.malicious);
            }

            tracing::info!(
                target: "scanner",
                attempt,
                status = status.as_u16(),
                "Cloudflare scan still processing"
            );
            if attempt < attempts {
                sleep(self.scan.poll_delay).await;
            }
        }

        tracing::error!(
            target: "scanner",
            uuid,
            attempts,
            "Cloudflare scan did not finish in time"
        );
        Err(ScanError::Exhausted { attempts })
    }

    async fn run(&self, url: &str) -> Result<Verdict, ScanError> {
        let uuid = self.submit(url).await?;
        let malicious = self.poll_result(&uuid).await?;
        tracing::info!(target: "scanner", malicious, "Cloudflare returned a verdict");
        Ok(if malicious {
            Verdict::Malicious
        } else {
            Verdict::Clean
        })
    }
}

impl UrlScanner for CloudflareScanner {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    fn check<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Verdict, ScanError>> {
        Box::pin(self.run(url))
    }
}

#[derive(Debug, Serialize)]
struct ScanRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScanSubmission {
    uuid: String,
}

#[derive(Debug, Deserialize)]
struct ScanResult {
    verdicts: Verdicts,
}

#[derive(Debug, Deserialize)]
struct Verdicts {
    overall: OverallVerdict,
}

#[derive(Debug, Deserialize)]
struct OverallVerdict {
    malicious: bool,
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    const RESULT_PATH: &str = "/accounts/acct/urlscanner/v2/result/scan-1";

    fn scanner_for(server: &MockServer, attempts: u32, delay: Duration) -> CloudflareScanner {
        CloudflareScanner::new(
            Client::new(),
            CloudflareConfig {
                api_token: "cf-token".to_string(),
                account_id: "acct".to_string(),
                base_url: server.uri(),
            },
            ScanConfig {
                poll_attempts: attempts,
                poll_delay: delay,
                request_timeout: Duration::from_secs(5),
            },
        )
    }

    async fn mount_submission(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/accounts/acct/urlscanner/v2/scan"))
            .and(header("authorization", "Bearer cf-token"))
            .and(body_json(json!({"url": "https://example.com/"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": "scan-1"})))
            .mount(server)
            .await;
    }

    fn finished(malicious: bool) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "verdicts": {"overall": {"malicious": malicious, "categories": []}}
        }))
    }

    #[tokio::test]
    async fn malicious_result_is_malicious() {
        let server = MockServer::start().await;
        mount_submission(&server).await;
        Mock::given(method("GET"))
            .and(path(RESULT_PATH))
            .and(header("authorization", "Bearer cf-token"))
            .respond_with(finished(true))
            .expect(1)
            .mount(&server)
            .await;

        let scanner = scanner_for(&server, 10, Duration::from_millis(10));
        assert_eq!(scanner.scan("https://example.com/").await, Verdict::Malicious);
    }

    #[tokio::test]
    async fn keeps_polling_while_processing() {
        let server = MockServer::start().await;
        mount_submission(&server).await;
        Mock::given(method("GET"))
            .and(path(RESULT_PATH))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(RESULT_PATH))
            .respond_with(finished(false))
            .expect(1)
            .mount(&server)
            .await;

        let scanner = scanner_for(&server, 10, Duration::from_millis(10));
        assert_eq!(scanner.scan("https://example.com/").await, Verdict::Clean);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        mount_submission(&server).await;
        Mock::given(method("GET"))
            .and(path(RESULT_PATH))
            .respond_with(ResponseTemplate::new(202))
            .expect(3)
            .mount(&server)
            .await;

        let delay = Duration::from_millis(40);
        let scanner = scanner_for(&server, 3, delay);
        let started = Instant::now();
        let err = scanner.check("https://example.com/").await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, ScanError::Exhausted { attempts: 3 }));
        assert!(elapsed >= delay * 2, "expected two waits, took {elapsed:?}");
        server.verify().await;
    }

    #[tokio::test]
    async fn exhausted_polling_is_unknown() {
        let server = MockServer::start().await;
        mount_submission(&server).await;
        Mock::given(method("GET"))
            .and(path(RESULT_PATH))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let scanner = scanner_for(&server, 2, Duration::from_millis(5));
        assert_eq!(scanner.scan("https://example.com/").await, Verdict::Unknown);
    }

    #[tokio::test]
    async fn rejected_submission_never_polls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts/acct/urlscanner/v2/scan"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(finished(true))
            .expect(0)
            .mount(&server)
            .await;

        let scanner = scanner_for(&server, 10, Duration::from_millis(10));
        assert_eq!(scanner.scan("https://example.com/").await, Verdict::Unknown);
        server.verify().await;
    }

    #[tokio::test]
    async fn missing_verdict_field_is_unknown() {
        let server = MockServer::start().await;
        mount_submission(&server).await;
        Mock::given(method("GET"))
            .and(path(RESULT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task": {}})))
            .mount(&server)
            .await;

        let scanner = scanner_for(&server, 10, Duration::from_millis(10));
        let err = scanner.check("https://example.com/").await.unwrap_err();
        assert!(matches!(err, ScanError::Parse(_)));
    }
}
