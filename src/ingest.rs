//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow: blob listing → download → text extraction →
//! tagging → batch upload to the search index. Per-file failures are logged
//! and skipped; index schema failure aborts the run before any file work.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::blob::BlobStore;
use crate::config::Config;
use crate::doc_analysis::DocumentAnalyzer;
use crate::extract::{self, ExtractKind};
use crate::models::DocumentRecord;
use crate::search_index::SearchIndexClient;
use crate::tagger;

pub async fn run_ingest(
    config: &Config,
    container_filter: Option<String>,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    if config.ingestion.sources.is_empty() {
        println!("No ingestion sources configured.");
        return Ok(());
    }

    let blobs = BlobStore::new(&config.storage)?;

    // Schema first; nothing else runs if the index can't be created.
    let index = if dry_run {
        None
    } else {
        let index = SearchIndexClient::new(&config.search)?;
        index
            .ensure_index()
            .await
            .context("Pipeline halted: index create/update failed")?;
        info!(index = index.index_name(), "search index ready");
        Some(index)
    };

    let analyzer = if dry_run {
        None
    } else {
        Some(DocumentAnalyzer::new(&config.document_analysis)?)
    };

    let mut files_seen = 0usize;
    let mut files_skipped = 0usize;
    let mut records: Vec<DocumentRecord> = Vec::new();
    let mut remaining = limit;

    'sources: for source in &config.ingestion.sources {
        if let Some(ref only) = container_filter {
            if &source.container != only {
                continue;
            }
        }

        let blob_names = if source.files.is_empty() {
            match blobs.list_blobs(&source.container).await {
                Ok(names) => names,
                Err(e) => {
                    warn!(container = %source.container, error = %e, "container listing failed, skipping");
                    continue;
                }
            }
        } else {
            source.files.clone()
        };

        for blob_name in blob_names {
            if remaining == Some(0) {
                break 'sources;
            }

            files_seen += 1;

            let kind = match extract::classify(&blob_name) {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(container = %source.container, blob = %blob_name, "{}", e);
                    files_skipped += 1;
                    continue;
                }
            };

            if dry_run {
                println!("  would ingest {}/{}", source.container, blob_name);
                if let Some(ref mut n) = remaining {
                    *n -= 1;
                }
                continue;
            }

            let bytes = match blobs.download(&source.container, &blob_name).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(container = %source.container, blob = %blob_name, error = %e, "download failed, skipping");
                    files_skipped += 1;
                    continue;
                }
            };

            let text = match kind {
                ExtractKind::Text => extract::decode_text(&bytes),
                ExtractKind::Pdf => {
                    let analyzer = analyzer.as_ref().expect("analyzer present outside dry-run");
                    match analyzer.extract_pdf(&bytes).await {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(container = %source.container, blob = %blob_name, error = %e, "extraction failed, skipping");
                            files_skipped += 1;
                            continue;
                        }
                    }
                }
            };

            if text.trim().is_empty() {
                warn!(container = %source.container, blob = %blob_name, "no text extracted, skipping");
                files_skipped += 1;
                continue;
            }

            let record = tagger::enrich_and_tag(&blob_name, &text, &source.container);
            info!(
                blob = %blob_name,
                document_type = record.document_type.as_str(),
                roles = ?record.allowed_roles,
                "tagged"
            );
            records.push(record);

            if let Some(ref mut n) = remaining {
                *n -= 1;
            }
        }
    }

    if dry_run {
        println!("ingest (dry-run)");
        println!("  files seen: {}", files_seen);
        println!("  files skipped: {}", files_skipped);
        return Ok(());
    }

    // Single batch at the end; per-item failures don't abort the batch.
    let mut uploaded = 0usize;
    let mut failed = 0usize;
    if records.is_empty() {
        info!("no documents to index");
    } else {
        let index = index.as_ref().expect("index present outside dry-run");
        let results = index.upload_documents(&records).await?;
        for item in &results {
            if item.status {
                uploaded += 1;
            } else {
                failed += 1;
                error!(
                    key = %item.key,
                    error = item.error_message.as_deref().unwrap_or("unknown"),
                    "document upload failed"
                );
            }
        }
    }

    println!("ingest");
    println!("  files seen: {}", files_seen);
    println!("  files skipped: {}", files_skipped);
    println!("  documents indexed: {}", uploaded);
    if failed > 0 {
        println!("  documents failed: {}", failed);
    }
    println!("ok");

    Ok(())
}
