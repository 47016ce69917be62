use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub document_analysis: DocumentAnalysisConfig,
    pub chat: ChatConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Azure AI Search endpoint, e.g. `https://myservice.search.windows.net`.
    pub endpoint: String,
    /// Index name documents are written to and queried from.
    pub index: String,
    #[serde(default = "default_search_api_version")]
    pub api_version: String,
    #[serde(default = "default_top")]
    pub default_top: usize,
}

fn default_search_api_version() -> String {
    "2024-07-01".to_string()
}
fn default_top() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Storage account name. The blob endpoint is derived as
    /// `https://<account>.blob.core.windows.net` unless overridden.
    pub account: String,
    /// Endpoint override for emulators (Azurite) or sovereign clouds.
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentAnalysisConfig {
    /// `remote` calls the document-analysis service; `local` extracts PDF
    /// text in-process (no Azure endpoint needed, useful for development).
    #[serde(default = "default_analysis_mode")]
    pub mode: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for DocumentAnalysisConfig {
    fn default() -> Self {
        Self {
            mode: default_analysis_mode(),
            endpoint: None,
            model_id: default_model_id(),
            poll_interval_secs: default_poll_interval_secs(),
            max_polls: default_max_polls(),
        }
    }
}

fn default_analysis_mode() -> String {
    "remote".to_string()
}
fn default_model_id() -> String {
    "prebuilt-document".to_string()
}
fn default_poll_interval_secs() -> u64 {
    2
}
fn default_max_polls() -> u32 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Azure OpenAI resource endpoint, e.g. `https://myaoai.openai.azure.com`.
    pub endpoint: String,
    /// Chat model deployment name.
    pub deployment: String,
    #[serde(default = "default_chat_api_version")]
    pub api_version: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_chat_api_version() -> String {
    "2024-02-15-preview".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    800
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TranslatorConfig {
    /// Azure Translator endpoint. Absent means answers are never translated
    /// and non-English requests fail with a clear error.
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngestionConfig {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// One blob container to ingest. An empty `files` list means the container
/// is enumerated at run time.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub container: String,
    #[serde(default)]
    pub files: Vec<String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.search.endpoint.trim().is_empty() {
        anyhow::bail!("search.endpoint must not be empty");
    }
    if config.search.index.trim().is_empty() {
        anyhow::bail!("search.index must not be empty");
    }
    if config.search.default_top == 0 {
        anyhow::bail!("search.default_top must be >= 1");
    }

    if config.storage.account.trim().is_empty() {
        anyhow::bail!("storage.account must not be empty");
    }

    match config.document_analysis.mode.as_str() {
        "remote" => {
            if config.document_analysis.endpoint.is_none() {
                anyhow::bail!(
                    "document_analysis.endpoint must be set when mode is 'remote'"
                );
            }
        }
        "local" => {}
        other => anyhow::bail!(
            "Unknown document_analysis.mode: '{}'. Must be remote or local.",
            other
        ),
    }
    if config.document_analysis.max_polls == 0 {
        anyhow::bail!("document_analysis.max_polls must be >= 1");
    }

    if config.chat.endpoint.trim().is_empty() {
        anyhow::bail!("chat.endpoint must not be empty");
    }
    if config.chat.deployment.trim().is_empty() {
        anyhow::bail!("chat.deployment must not be empty");
    }
    if !(0.0..=2.0).contains(&config.chat.temperature) {
        anyhow::bail!("chat.temperature must be in [0.0, 2.0]");
    }
    if config.chat.max_tokens == 0 {
        anyhow::bail!("chat.max_tokens must be >= 1");
    }

    for source in &config.ingestion.sources {
        if source.container.trim().is_empty() {
            anyhow::bail!("ingestion.sources entries must name a container");
        }
    }

    Ok(config)
}

impl StorageConfig {
    /// Blob service base URL without trailing slash.
    pub fn blob_endpoint(&self) -> String {
        match &self.endpoint {
            Some(e) => e.trim_end_matches('/').to_string(),
            None => format!("https://{}.blob.core.windows.net", self.account),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("heiraid.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    const VALID: &str = r#"
[search]
endpoint = "https://unit.search.windows.net"
index = "heiraid-docs"

[storage]
account = "unitstore"

[document_analysis]
mode = "local"

[chat]
endpoint = "https://unit.openai.azure.com"
deployment = "gpt-4o"

[server]
bind = "127.0.0.1:8080"

[[ingestion.sources]]
container = "legal-statutes"
files = ["ocga_sections.txt"]
"#;

    #[test]
    fn valid_config_loads_with_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(&dir, VALID);
        let config = load_config(&path).unwrap();
        assert_eq!(config.search.api_version, "2024-07-01");
        assert_eq!(config.search.default_top, 5);
        assert_eq!(config.document_analysis.model_id, "prebuilt-document");
        assert_eq!(config.ingestion.sources.len(), 1);
        assert_eq!(
            config.storage.blob_endpoint(),
            "https://unitstore.blob.core.windows.net"
        );
    }

    #[test]
    fn remote_mode_requires_endpoint() {
        let dir = tempfile::TempDir::new().unwrap();
        let body = VALID.replace("mode = \"local\"", "mode = \"remote\"");
        let path = write_config(&dir, &body);
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("document_analysis.endpoint"));
    }

    #[test]
    fn unknown_analysis_mode_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let body = VALID.replace("mode = \"local\"", "mode = \"sdk\"");
        let path = write_config(&dir, &body);
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn empty_index_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let body = VALID.replace("index = \"heiraid-docs\"", "index = \"\"");
        let path = write_config(&dir, &body);
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("search.index"));
    }

    #[test]
    fn out_of_range_temperature_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let body = VALID.replace(
            "deployment = \"gpt-4o\"",
            "deployment = \"gpt-4o\"\ntemperature = 3.5",
        );
        let path = write_config(&dir, &body);
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn storage_endpoint_override_wins() {
        let dir = tempfile::TempDir::new().unwrap();
        let body = VALID.replace(
            "account = \"unitstore\"",
            "account = \"unitstore\"\nendpoint = \"http://127.0.0.1:10000/unitstore/\"",
        );
        let path = write_config(&dir, &body);
        let config = load_config(&path).unwrap();
        assert_eq!(
            config.storage.blob_endpoint(),
            "http://127.0.0.1:10000/unitstore"
        );
    }
}
