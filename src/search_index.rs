//! Azure AI Search REST client: index schema, document upsert, and queries.
//!
//! The index schema mirrors the enriched document record: filterable RBAC
//! fields (`allowed_roles`, `owner_id`, `case_id`), searchable content and
//! summary, and a vector field sized for the embedding placeholder so a real
//! embedding provider can be added without a schema migration.
//!
//! # Environment Variables
//!
//! - `AZURE_SEARCH_API_KEY` — required; admin key for schema and upload,
//!   query key suffices for search-only use.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::models::{DocumentRecord, SearchHit, EMBEDDING_DIMS};

/// Fields returned to callers from a search query.
const SELECT_FIELDS: &str = "id,filename,filepath,document_type,legal_category,summary,content";

/// Client bound to one search service and index.
pub struct SearchIndexClient {
    endpoint: String,
    index: String,
    api_version: String,
    api_key: String,
    client: reqwest::Client,
}

/// Outcome of indexing a single document within a batch.
#[derive(Debug, Deserialize)]
pub struct IndexingResult {
    pub key: String,
    pub status: bool,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
}

impl SearchIndexClient {
    /// Construct from configuration. Fails when the API key is absent.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let api_key = std::env::var("AZURE_SEARCH_API_KEY")
            .context("AZURE_SEARCH_API_KEY environment variable not set")?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            api_version: config.api_version.clone(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Create the index, or update it in place if it already exists.
    /// Idempotent; a failure here is fatal for an ingestion run.
    pub async fn ensure_index(&self) -> Result<()> {
        let url = format!(
            "{}/indexes/{}?api-version={}",
            self.endpoint, self.index, self.api_version
        );

        let resp = self
            .client
            .put(&url)
            .header("api-key", &self.api_key)
            .json(&index_schema(&self.index))
            .send()
            .await
            .context("Search index create/update request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Search index create/update failed (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        Ok(())
    }

    /// Upload a batch of documents with merge-or-upload semantics.
    ///
    /// Returns the per-document outcomes; individual failures do not fail
    /// the batch. Re-uploading an id overwrites the earlier record.
    pub async fn upload_documents(
        &self,
        documents: &[DocumentRecord],
    ) -> Result<Vec<IndexingResult>> {
        let actions: Vec<serde_json::Value> = documents
            .iter()
            .map(|doc| {
                let mut value = serde_json::to_value(doc).expect("document serializes");
                value
                    .as_object_mut()
                    .expect("document is a JSON object")
                    .insert(
                        "@search.action".to_string(),
                        serde_json::Value::String("mergeOrUpload".to_string()),
                    );
                value
            })
            .collect();

        let url = format!(
            "{}/indexes/{}/docs/index?api-version={}",
            self.endpoint, self.index, self.api_version
        );

        let resp = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&serde_json::json!({ "value": actions }))
            .send()
            .await
            .context("Document upload request failed")?;

        // 207 carries per-item failures; anything else non-2xx is a batch failure.
        let status = resp.status();
        if !status.is_success() && status.as_u16() != 207 {
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Document upload failed (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        #[derive(Deserialize)]
        struct Batch {
            value: Vec<IndexingResult>,
        }
        let batch: Batch = resp.json().await.context("Malformed indexing response")?;
        Ok(batch.value)
    }

    /// Run a full-text query with an optional OData filter.
    ///
    /// Returns the matching documents and the total match count.
    pub async fn query(
        &self,
        query: &str,
        top: usize,
        filter: Option<&str>,
    ) -> Result<(Vec<SearchHit>, u64)> {
        let mut body = serde_json::json!({
            "search": query,
            "top": top,
            "select": SELECT_FIELDS,
            "count": true,
        });
        if let Some(expr) = filter {
            body["filter"] = serde_json::Value::String(expr.to_string());
        }

        let url = format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, self.index, self.api_version
        );

        let resp = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Search query request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Search query failed (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        let payload: serde_json::Value = resp.json().await?;
        Ok(parse_search_response(&payload))
    }
}

/// Map a search response body into hits plus the total count.
fn parse_search_response(payload: &serde_json::Value) -> (Vec<SearchHit>, u64) {
    let hits: Vec<SearchHit> = payload
        .get("value")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let mut hit: SearchHit = serde_json::from_value(row.clone()).ok()?;
                    hit.score = row
                        .get("@search.score")
                        .and_then(|s| s.as_f64())
                        .unwrap_or(0.0);
                    Some(hit)
                })
                .collect()
        })
        .unwrap_or_default();

    let count = payload
        .get("@odata.count")
        .and_then(|c| c.as_u64())
        .unwrap_or(hits.len() as u64);

    (hits, count)
}

/// The index definition sent on create/update.
fn index_schema(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "fields": [
            { "name": "id", "type": "Edm.String", "key": true, "filterable": true, "sortable": true },
            { "name": "filename", "type": "Edm.String", "searchable": true, "filterable": true, "sortable": true },
            { "name": "filepath", "type": "Edm.String" },
            { "name": "document_type", "type": "Edm.String", "filterable": true },
            { "name": "content", "type": "Edm.String", "searchable": true, "analyzer": "en.microsoft" },
            { "name": "summary", "type": "Edm.String", "searchable": true, "analyzer": "en.microsoft" },
            { "name": "legal_category", "type": "Edm.String", "filterable": true },
            { "name": "tax_redemption_period_days", "type": "Edm.Int32", "filterable": true, "facetable": true },
            { "name": "effective_date", "type": "Edm.DateTimeOffset", "filterable": true, "sortable": true },
            // RBAC fields consulted by the role filter.
            { "name": "owner_id", "type": "Edm.String", "filterable": true, "facetable": true },
            { "name": "case_id", "type": "Edm.String", "filterable": true, "facetable": true },
            { "name": "allowed_roles", "type": "Collection(Edm.String)", "filterable": true },
            // Vector slot for a future embedding provider.
            {
                "name": "content_vector",
                "type": "Collection(Edm.Single)",
                "searchable": true,
                "dimensions": EMBEDDING_DIMS,
                "vectorSearchProfile": "default-vector-profile"
            }
        ],
        "vectorSearch": {
            "algorithms": [
                {
                    "name": "default-hnsw",
                    "kind": "hnsw",
                    "hnswParameters": { "m": 4, "efConstruction": 400, "efSearch": 500, "metric": "cosine" }
                }
            ],
            "profiles": [
                { "name": "default-vector-profile", "algorithm": "default-hnsw" }
            ]
        },
        "suggesters": [
            { "name": "sg", "searchMode": "analyzingInfixOnly", "sourceFields": ["filename"] }
        ],
        "scoringProfiles": [
            {
                "name": "text_relevance",
                "text": { "weights": { "content": 3, "summary": 2, "filename": 1.5 } }
            }
        ],
        "defaultScoringProfile": "text_relevance",
        "corsOptions": { "allowedOrigins": ["*"], "maxAgeInSeconds": 300 }
    })
}
