//! Core data models used throughout HeirAid.
//!
//! These types represent the documents, user contexts, and search results
//! that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Dimensionality of the `content_vector` field in the search index.
///
/// Embedding generation is not wired up; records carry a zero vector of this
/// length so the index schema stays compatible with a future embedding model.
pub const EMBEDDING_DIMS: usize = 1536;

/// Classification assigned by the tagger based on filename and source container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ProbateStandardForm,
    LegalStatute,
    TaxRecord,
    SensitiveHeirFiling,
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::ProbateStandardForm => "probate_standard_form",
            DocumentType::LegalStatute => "legal_statute",
            DocumentType::TaxRecord => "tax_record",
            DocumentType::SensitiveHeirFiling => "sensitive_heir_filing",
            DocumentType::Unknown => "unknown",
        }
    }
}

/// An enriched document record, ready for upload to the search index.
///
/// Created once per source file during ingestion and immutable afterwards;
/// re-ingesting the same file upserts by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Index key, derived from the filename (dots and slashes replaced).
    pub id: String,
    pub filename: String,
    /// Original location: `azblob://<container>/<filename>`.
    pub filepath: String,
    pub document_type: DocumentType,
    pub content: String,
    /// First 500 characters of `content`, with an ellipsis if truncated.
    pub summary: String,
    pub legal_category: String,
    pub tax_redemption_period_days: Option<i32>,
    /// ISO 8601 date, when one could be extracted.
    pub effective_date: Option<String>,
    pub owner_id: Option<String>,
    pub case_id: Option<String>,
    /// Role allow-list consulted by the search filter. Never empty.
    pub allowed_roles: Vec<String>,
    pub content_vector: Vec<f32>,
}

/// The caller's identity as supplied by the external auth collaborator.
///
/// Built per request; never persisted. An empty role set is legitimate and
/// results in a deny-all search filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl UserContext {
    pub fn new(roles: Vec<String>, user_id: Option<String>) -> Self {
        Self { roles, user_id }
    }
}

/// A single document returned from a filtered search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub filename: String,
    pub filepath: String,
    pub document_type: String,
    pub legal_category: String,
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}
