//! # HeirAid
//!
//! Role-aware legal document ingestion and retrieval-augmented generation.
//!
//! HeirAid ingests legal source files (probate forms, statutes, tax records)
//! from Azure Blob Storage, extracts their text, tags each document with a
//! role allow-list, and indexes everything into Azure AI Search. Retrieval is
//! always role-filtered; a chat endpoint grounds a hosted language model on
//! the caller's visible documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────────┐
//! │ Blob Storage │──▶│  Pipeline          │──▶│ Azure AI     │
//! │ (containers) │   │ Extract+Tag(RBAC) │   │ Search index │
//! └──────────────┘   └───────────────────┘   └──────┬───────┘
//!                                                   │ role filter
//!                                  ┌────────────────┤
//!                                  ▼                ▼
//!                             ┌──────────┐    ┌──────────┐
//!                             │   CLI    │    │ HTTP API │
//!                             │(heiraid) │    │ chat/RAG │
//!                             └──────────┘    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! heiraid init                          # create the search index
//! heiraid ingest                        # ingest configured containers
//! heiraid search "year's support" --role public
//! heiraid chat "who can petition?" --role legal_professional
//! heiraid serve api                     # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`blob`] | Blob Storage client (SharedKey REST) |
//! | [`extract`] | Extension dispatch and text decoding |
//! | [`doc_analysis`] | Document-analysis service client |
//! | [`tagger`] | Rule-table document classification and RBAC tagging |
//! | [`filter`] | Role set → search filter expression |
//! | [`search_index`] | Search index schema, upsert, query |
//! | [`search`] | Role-filtered retrieval service |
//! | [`chat`] | Grounded chat (RAG) flow |
//! | [`translate`] | Answer translation |
//! | [`ingest`] | Pipeline orchestration |
//! | [`server`] | HTTP API server |

pub mod blob;
pub mod chat;
pub mod config;
pub mod doc_analysis;
pub mod extract;
pub mod filter;
pub mod ingest;
pub mod models;
pub mod search;
pub mod search_index;
pub mod server;
pub mod tagger;
pub mod translate;
