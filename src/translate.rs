//! Azure Translator client for non-English answers.
//!
//! # Environment Variables
//!
//! - `AZURE_TRANSLATOR_API_KEY` — required when a translator endpoint is configured.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::config::TranslatorConfig;

pub struct TranslatorClient {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl TranslatorClient {
    /// Construct when an endpoint is configured; `Ok(None)` when translation
    /// is simply not set up.
    pub fn from_config(config: &TranslatorConfig) -> Result<Option<Self>> {
        let endpoint = match &config.endpoint {
            Some(e) => e.trim_end_matches('/').to_string(),
            None => return Ok(None),
        };
        let api_key = std::env::var("AZURE_TRANSLATOR_API_KEY")
            .context("AZURE_TRANSLATOR_API_KEY environment variable not set")?;

        Ok(Some(Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        }))
    }

    /// Translate `text` into `target_language` (a BCP-47 code like `es`).
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let url = format!(
            "{}/translate?api-version=3.0&to={}",
            self.endpoint, target_language
        );

        let resp = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&serde_json::json!([ { "Text": text } ]))
            .send()
            .await
            .context("Translation request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Translation failed (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        #[derive(Deserialize)]
        struct Item {
            translations: Vec<Translation>,
        }
        #[derive(Deserialize)]
        struct Translation {
            text: String,
        }

        let items: Vec<Item> = resp.json().await.context("Malformed translation response")?;
        items
            .into_iter()
            .next()
            .and_then(|item| item.translations.into_iter().next())
            .map(|t| t.text)
            .ok_or_else(|| anyhow::anyhow!("Empty translation response"))
    }
}
