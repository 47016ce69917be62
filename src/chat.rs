//! Grounded chat: retrieval-augmented generation over the legal index.
//!
//! Answers a question by retrieving the documents visible to the caller,
//! packing their content into the prompt, and asking the hosted chat model.
//! When the caller requests a language other than English, the finished
//! answer goes through the translator.
//!
//! # Environment Variables
//!
//! - `AZURE_OPENAI_API_KEY` — required.

use anyhow::{bail, Context, Result};

use crate::config::{ChatConfig, Config};
use crate::models::{SearchHit, UserContext};
use crate::search::SearchService;
use crate::translate::TranslatorClient;

/// Fixed system prompt for the legal assistant persona.
const SYSTEM_PROMPT: &str = "You are HeirAid, an AI Legal Assistant. Answer questions based on \
the provided legal documents. If the answer is not in the documents, state that. If you are asked \
about sensitive private data (e.g., specific individual's tax bills, forms), you must mention that \
access is restricted and you cannot provide details without explicit access controls for the \
specific case. Ensure you respect user privacy and role-based access rules.";

/// Substituted for the context block when retrieval returns nothing.
const NO_DOCUMENTS_FALLBACK: &str =
    "No specific legal documents found. Provide general legal information if applicable.";

/// A grounded answer plus the documents it was grounded on.
#[derive(Debug)]
pub struct ChatAnswer {
    pub response: String,
    pub source_documents: Vec<SearchHit>,
}

/// Azure OpenAI chat-completions client.
pub struct ChatClient {
    endpoint: String,
    deployment: String,
    api_version: String,
    api_key: String,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
}

impl ChatClient {
    /// Construct from configuration. Fails when the API key is absent.
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let api_key = std::env::var("AZURE_OPENAI_API_KEY")
            .context("AZURE_OPENAI_API_KEY environment variable not set")?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: reqwest::Client::new(),
        })
    }

    /// Send a system + user message pair and return the completion text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        );

        let body = serde_json::json!({
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let resp = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Chat completion request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Chat completion failed (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        let payload: serde_json::Value = resp.json().await?;
        payload
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Chat completion response had no message content"))
    }
}

/// The full RAG flow: retrieve, prompt, complete, optionally translate.
pub struct ChatService {
    search: SearchService,
    chat: ChatClient,
    translator: Option<TranslatorClient>,
}

impl ChatService {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            search: SearchService::new(config)?,
            chat: ChatClient::new(&config.chat)?,
            translator: TranslatorClient::from_config(&config.translator)?,
        })
    }

    /// Answer `message` for `user`, translating when `language` is not `en`.
    pub async fn answer(
        &self,
        message: &str,
        language: &str,
        user: &UserContext,
    ) -> Result<ChatAnswer> {
        if message.trim().is_empty() {
            bail!("message must not be empty");
        }

        let (hits, _count) = self.search.search_documents(message, None, user).await?;

        let prompt = build_user_prompt(&hits, message);
        let mut response = self.chat.complete(SYSTEM_PROMPT, &prompt).await?;

        if language != "en" {
            match &self.translator {
                Some(translator) => {
                    response = translator.translate(&response, language).await?;
                }
                None => bail!(
                    "language '{}' requested but no translator endpoint is configured",
                    language
                ),
            }
        }

        Ok(ChatAnswer {
            response,
            source_documents: hits,
        })
    }
}

/// Concatenate retrieved content into the context block of the user prompt.
fn build_user_prompt(hits: &[SearchHit], question: &str) -> String {
    let context: String = hits
        .iter()
        .map(|hit| hit.content.as_str())
        .filter(|content| !content.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let context = if context.is_empty() {
        NO_DOCUMENTS_FALLBACK
    } else {
        &context
    };

    format!("Context: {}\n\nQuestion: {}", context, question)
}

/// CLI entry point: one-shot question and answer.
pub async fn run_chat(
    config: &Config,
    question: &str,
    language: &str,
    roles: Vec<String>,
) -> Result<()> {
    let service = ChatService::new(config)?;
    let user = UserContext::new(roles, None);

    let answer = service.answer(question, language, &user).await?;

    println!("{}", answer.response);
    if !answer.source_documents.is_empty() {
        println!();
        println!("Sources:");
        for doc in &answer.source_documents {
            println!("  - {} ({})", doc.filename, doc.document_type);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(content: &str) -> SearchHit {
        SearchHit {
            id: "doc".to_string(),
            filename: "doc.txt".to_string(),
            filepath: "azblob://c/doc.txt".to_string(),
            document_type: "unknown".to_string(),
            legal_category: "general".to_string(),
            summary: String::new(),
            content: content.to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn prompt_concatenates_hit_content() {
        let prompt = build_user_prompt(
            &[hit("first document"), hit("second document")],
            "who inherits?",
        );
        assert!(prompt.starts_with("Context: first document\nsecond document"));
        assert!(prompt.ends_with("Question: who inherits?"));
    }

    #[test]
    fn empty_retrieval_substitutes_fallback() {
        let prompt = build_user_prompt(&[], "who inherits?");
        assert!(prompt.contains(NO_DOCUMENTS_FALLBACK));
    }

    #[test]
    fn hits_with_empty_content_also_fall_back() {
        let prompt = build_user_prompt(&[hit(""), hit("")], "who inherits?");
        assert!(prompt.contains(NO_DOCUMENTS_FALLBACK));
    }
}
