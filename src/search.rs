//! Role-filtered document search.
//!
//! [`SearchService`] is the single retrieval path used by the CLI, the HTTP
//! API, and the chat flow. Every query passes through the role filter; there
//! is no unfiltered entry point.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::filter::build_role_filter;
use crate::models::{SearchHit, UserContext};
use crate::search_index::SearchIndexClient;

/// Retrieval service: builds the role filter and issues the query.
pub struct SearchService {
    index: SearchIndexClient,
    default_top: usize,
}

impl SearchService {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            index: SearchIndexClient::new(&config.search)?,
            default_top: config.search.default_top,
        })
    }

    /// Search documents visible to `user`, at most `top` results.
    pub async fn search_documents(
        &self,
        query: &str,
        top: Option<usize>,
        user: &UserContext,
    ) -> Result<(Vec<SearchHit>, u64)> {
        if query.trim().is_empty() {
            bail!("query must not be empty");
        }

        let filter = build_role_filter(user);
        let filter_expr = filter.to_odata();
        let top = top.unwrap_or(self.default_top);

        self.index.query(query, top, filter_expr.as_deref()).await
    }
}

/// CLI entry point: run a query and print ranked results.
pub async fn run_search(
    config: &Config,
    query: &str,
    top: Option<usize>,
    roles: Vec<String>,
) -> Result<()> {
    let service = SearchService::new(config)?;
    let user = UserContext::new(roles, None);

    let (hits, count) = service.search_documents(query, top, &user).await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, hit.score, hit.filename);
        println!("    type: {} / {}", hit.document_type, hit.legal_category);
        println!("    path: {}", hit.filepath);
        println!(
            "    summary: \"{}\"",
            hit.summary.replace('\n', " ").trim()
        );
        println!("    id: {}", hit.id);
        println!();
    }
    println!("{} total match(es)", count);

    Ok(())
}
