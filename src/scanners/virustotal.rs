use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::{ScanConfig, VirusTotalConfig},
    domain::Verdict,
};

use super::{expect_ok, read_json, ScanError, UrlScanner};

/// Submit-and-fetch client for the VirusTotal v3 URL API.
///
/// The URL is submitted once and the analysis named in the submission response is read back
/// immediately; there is no polling.
#[derive(Clone)]
pub struct VirusTotalScanner {
    http: Client,
    config: VirusTotalConfig,
    scan: ScanConfig,
}

impl VirusTotalScanner {
    pub fn new(http: Client, config: VirusTotalConfig, scan: ScanConfig) -> Self {
        Self { http, config, scan }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v3/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn submit(&self, url: &str) -> Result<String, ScanError> {
        let response = self
            .http
            .post(self.endpoint("urls"))
            .header("x-apikey", &self.config.api_key)
            .header("accept", "application/json")
            .form(&[("url", url)])
            .timeout(self.scan.request_timeout)
            .send()
            .await?;

        if let Err(err) = expect_ok(&response, "submit") {
            tracing::error!(
                target: "scanner",
                status = response.status().as_u16(),
                "error submitting url to VirusTotal"
            );
            return Err(err);
        }

        let submission: SubmissionResponse = read_json(response).await?;
        tracing::info!(
            target: "scanner",
            id = %submission.data.id,
            "retrieved VirusTotal submission identifier"
        );
        Ok(submission.data.id)
    }

    async fn fetch_analysis(&self, id: &str) -> Result<AnalysisStats, ScanError> {
        let response = self
            .http
            .get(self.endpoint(&format!("analyses/{id}")))
            .header("x-apikey", &self.config.api_key)
            .header("accept", "application/json")
            .timeout(self.scan.request_timeout)
            .send()
            .await?;

        if let Err(err) = expect_ok(&response, "fetch") {
            tracing::error!(
                target: "scanner",
                status = response.status().as_u16(),
                id,
                "error fetching VirusTotal analysis"
            );
            return Err(err);
        }

        let analysis: AnalysisResponse = read_json(response).await?;
        Ok(analysis.data.attributes.stats)
    }

    async fn run(&self, url: &str) -> Result<Verdict, ScanError> {
        let id = self.submit(url).await?;
        let stats = self.fetch_analysis(&id).await?;
        tracing::info!(
            target: "scanner",
            malicious = stats.malicious,
            suspicious = stats.suspicious,
            "VirusTotal returned a verdict"
        );
        Ok(stats.verdict())
    }
}

impl UrlScanner for VirusTotalScanner {
    fn name(&self) -> &'static str {
        "virustotal"
    }

    fn check<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Verdict, ScanError>> {
        Box::pin(self.run(url))
    }
}

#[derive(Debug, Deserialize)]
struct SubmissionResponse {
    data: SubmissionData,
}

#[derive(Debug, Deserialize)]
struct SubmissionData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    data: AnalysisData,
}

#[derive(Debug, Deserialize)]
struct AnalysisData {
    attributes: AnalysisAttributes,
}

#[derive(Debug, Deserialize)]
struct AnalysisAttributes {
    stats: AnalysisStats,
}

#[derive(Debug, Deserialize)]
struct AnalysisStats {
    malicious: u64,
    suspicious: u64,
}

impl AnalysisStats {
    fn verdict(&self) -> Verdict {
        if self.malicious > 0 || self.suspicious > 0 {
            Verdict::Malicious
        } else {
            Verdict::Clean
        }
    }
}
