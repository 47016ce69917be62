//! PDF text extraction via the Azure Document Intelligence REST API.
//!
//! The analyze operation is asynchronous on the service side: a POST returns
//! `202 Accepted` with an `Operation-Location` header, which is then polled
//! until the operation reports `succeeded` or `failed`. Extracted text is the
//! concatenation of every page line, joined with newlines.
//!
//! When `document_analysis.mode = "local"` the remote service is bypassed and
//! PDFs are parsed in-process instead (see [`crate::extract`]), which keeps
//! development and tests independent of an Azure endpoint.
//!
//! # Environment Variables
//!
//! - `AZURE_DOC_INTEL_API_KEY` — required in remote mode.

use anyhow::{bail, Context, Result};
use std::time::Duration;

use crate::config::DocumentAnalysisConfig;
use crate::extract;

/// Extracts text from PDF bytes, remotely or in-process.
pub enum DocumentAnalyzer {
    Remote(RemoteAnalyzer),
    Local,
}

impl DocumentAnalyzer {
    /// Construct per configuration. Remote mode fails here when the endpoint
    /// or API key is absent.
    pub fn new(config: &DocumentAnalysisConfig) -> Result<Self> {
        match config.mode.as_str() {
            "remote" => Ok(DocumentAnalyzer::Remote(RemoteAnalyzer::new(config)?)),
            "local" => Ok(DocumentAnalyzer::Local),
            other => bail!("Unknown document_analysis.mode: '{}'", other),
        }
    }

    /// Extract the text of one PDF.
    pub async fn extract_pdf(&self, pdf_bytes: &[u8]) -> Result<String> {
        match self {
            DocumentAnalyzer::Remote(remote) => remote.analyze(pdf_bytes).await,
            DocumentAnalyzer::Local => Ok(extract::extract_pdf_local(pdf_bytes)?),
        }
    }
}

/// Client for the hosted document-analysis service.
pub struct RemoteAnalyzer {
    endpoint: String,
    model_id: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: u32,
    client: reqwest::Client,
}

impl RemoteAnalyzer {
    fn new(config: &DocumentAnalysisConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_ref()
            .context("document_analysis.endpoint required in remote mode")?
            .trim_end_matches('/')
            .to_string();
        let api_key = std::env::var("AZURE_DOC_INTEL_API_KEY")
            .context("AZURE_DOC_INTEL_API_KEY environment variable not set")?;

        Ok(Self {
            endpoint,
            model_id: config.model_id.clone(),
            api_key,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_polls: config.max_polls,
            client: reqwest::Client::new(),
        })
    }

    /// Submit the document and poll the returned operation to completion.
    async fn analyze(&self, pdf_bytes: &[u8]) -> Result<String> {
        let url = format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version=2023-07-31",
            self.endpoint, self.model_id
        );

        let resp = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/pdf")
            .body(pdf_bytes.to_vec())
            .send()
            .await
            .context("Document analysis request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Document analysis rejected (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        let operation_url = resp
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .context("Document analysis response missing Operation-Location header")?
            .to_string();

        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let poll = self
                .client
                .get(&operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await
                .context("Document analysis poll failed")?;

            if !poll.status().is_success() {
                bail!("Document analysis poll returned HTTP {}", poll.status());
            }

            let body: serde_json::Value = poll.json().await?;
            match body.get("status").and_then(|s| s.as_str()) {
                Some("succeeded") => return Ok(collect_lines(&body)),
                Some("failed") => {
                    let detail = body
                        .pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .unwrap_or("no error detail");
                    bail!("Document analysis failed: {}", detail);
                }
                // notStarted / running: keep polling.
                _ => {}
            }
        }

        bail!(
            "Document analysis did not complete after {} polls",
            self.max_polls
        )
    }
}

/// Join every page line of an analyze result into one newline-separated string.
fn collect_lines(result: &serde_json::Value) -> String {
    let mut text = String::new();
    if let Some(pages) = result
        .pointer("/analyzeResult/pages")
        .and_then(|p| p.as_array())
    {
        for page in pages {
            if let Some(lines) = page.get("lines").and_then(|l| l.as_array()) {
                for line in lines {
                    if let Some(content) = line.get("content").and_then(|c| c.as_str()) {
                        text.push_str(content);
                        text.push('\n');
                    }
                }
            }
        }
    }
    text
}
