//! Azure Blob Storage client.
//!
//! Lists and downloads blobs using the Blob service REST API with SharedKey
//! authentication. Implements marker-based pagination for large containers
//! and supports custom endpoints for the Azurite emulator.
//!
//! Request signing uses pure-Rust primitives (`hmac`, `sha2`, `base64`).
//!
//! # Environment Variables
//!
//! - `AZURE_STORAGE_ACCOUNT_KEY` — required; the account's base64 shared key.
//!
//! # Authentication
//!
//! Every request carries an `Authorization: SharedKey <account>:<signature>`
//! header where the signature is HMAC-SHA256 over the canonicalized request
//! (verb, standard headers, `x-ms-*` headers, canonicalized resource) keyed
//! with the decoded account key.

use anyhow::{bail, Context, Result};
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::StorageConfig;

type HmacSha256 = Hmac<Sha256>;

/// Blob service API version sent with every request.
const API_VERSION: &str = "2021-08-06";

/// Handle to one storage account's blob service.
pub struct BlobStore {
    account: String,
    endpoint: String,
    key: Vec<u8>,
    client: reqwest::Client,
}

impl BlobStore {
    /// Construct from configuration. Fails when the account key is absent
    /// or not valid base64.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let raw_key = std::env::var("AZURE_STORAGE_ACCOUNT_KEY")
            .context("AZURE_STORAGE_ACCOUNT_KEY environment variable not set")?;
        let key = base64::engine::general_purpose::STANDARD
            .decode(raw_key.trim())
            .context("AZURE_STORAGE_ACCOUNT_KEY is not valid base64")?;

        Ok(Self {
            account: config.account.clone(),
            endpoint: config.blob_endpoint(),
            key,
            client: reqwest::Client::new(),
        })
    }

    /// List all blob names in a container, following `NextMarker` pagination.
    pub async fn list_blobs(&self, container: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut params = vec![
                ("comp".to_string(), "list".to_string()),
                ("restype".to_string(), "container".to_string()),
            ];
            if let Some(ref m) = marker {
                params.push(("marker".to_string(), m.clone()));
            }

            let query: String = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, uri_encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            let url = format!("{}/{}?{}", self.endpoint, container, query);

            let resp = self
                .signed_get(&url, container, None, &params)
                .await
                .with_context(|| format!("Failed to list blobs in container '{}'", container))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                bail!(
                    "Blob list failed for container '{}' (HTTP {}): {}",
                    container,
                    status,
                    body.chars().take(500).collect::<String>()
                );
            }

            let xml = resp.text().await?;
            let (batch, next_marker) = parse_list_blobs_response(&xml);
            names.extend(batch);

            match next_marker {
                Some(m) => marker = Some(m),
                None => break,
            }
        }

        Ok(names)
    }

    /// Download one blob's content.
    pub async fn download(&self, container: &str, blob_name: &str) -> Result<Vec<u8>> {
        let encoded = blob_name
            .split('/')
            .map(uri_encode)
            .collect::<Vec<_>>()
            .join("/");
        let url = format!("{}/{}/{}", self.endpoint, container, encoded);

        let resp = self
            .signed_get(&url, container, Some(blob_name), &[])
            .await
            .with_context(|| format!("Failed to get blob '{}/{}'", container, blob_name))?;

        if !resp.status().is_success() {
            bail!(
                "Blob download failed (HTTP {}) for '{}/{}'",
                resp.status(),
                container,
                blob_name
            );
        }

        Ok(resp.bytes().await?.to_vec())
    }

    /// Issue a signed GET. `query_params` must match the URL's query string.
    async fn signed_get(
        &self,
        url: &str,
        container: &str,
        blob_name: Option<&str>,
        query_params: &[(String, String)],
    ) -> Result<reqwest::Response, reqwest::Error> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let authorization =
            self.authorization_header("GET", &date, container, blob_name, query_params);

        self.client
            .get(url)
            .header("Authorization", authorization)
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION)
            .send()
            .await
    }

    /// Build the `SharedKey` authorization header value for a bodyless GET.
    fn authorization_header(
        &self,
        verb: &str,
        date: &str,
        container: &str,
        blob_name: Option<&str>,
        query_params: &[(String, String)],
    ) -> String {
        // x-ms-* headers, lowercased and sorted.
        let canonical_headers = format!("x-ms-date:{}\nx-ms-version:{}\n", date, API_VERSION);
        let canonical_resource =
            canonicalized_resource(&self.account, container, blob_name, query_params);

        // Eleven standard-header slots stay empty for a bodyless GET;
        // Content-Length must be the empty string when zero.
        let string_to_sign = format!(
            "{verb}\n\n\n\n\n\n\n\n\n\n\n\n{canonical_headers}{canonical_resource}"
        );

        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(string_to_sign.as_bytes());
        let signature =
            base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        format!("SharedKey {}:{}", self.account, signature)
    }
}

/// Canonicalized resource: `/account/container[/blob]` plus each query
/// parameter as `\nname:value`, names lowercased and sorted.
fn canonicalized_resource(
    account: &str,
    container: &str,
    blob_name: Option<&str>,
    query_params: &[(String, String)],
) -> String {
    let mut resource = match blob_name {
        Some(blob) => format!("/{}/{}/{}", account, container, blob),
        None => format!("/{}/{}", account, container),
    };

    let mut sorted: Vec<(String, String)> = query_params
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    for (k, v) in sorted {
        resource.push_str(&format!("\n{}:{}", k, v));
    }

    resource
}

/// URI-encode a string per RFC 3986, leaving unreserved characters alone.
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

// ============ XML Parsing (minimal, no extra deps) ============

/// Parse a List Blobs response into blob names and the next pagination marker.
fn parse_list_blobs_response(xml: &str) -> (Vec<String>, Option<String>) {
    let mut names = Vec::new();

    // Parse <Blob> blocks inside <Blobs>.
    let mut remaining = xml;
    while let Some(start) = remaining.find("<Blob>") {
        let block_start = start + "<Blob>".len();
        if let Some(end) = remaining[block_start..].find("</Blob>") {
            let block = &remaining[block_start..block_start + end];
            if let Some(name) = extract_xml_value(block, "Name") {
                if !name.is_empty() {
                    names.push(name);
                }
            }
            remaining = &remaining[block_start + end + "</Blob>".len()..];
        } else {
            break;
        }
    }

    let next_marker = extract_xml_value(xml, "NextMarker").filter(|m| !m.is_empty());
    (names, next_marker)
}

/// Extract the text content of an XML tag (simple, non-nested).
fn extract_xml_value(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    if let Some(start) = xml.find(&open) {
        let value_start = start + open.len();
        if let Some(end) = xml[value_start..].find(&close) {
            return Some(xml[value_start..value_start + end].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blob_names_from_listing() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://acct.blob.core.windows.net/" ContainerName="gpcsf-forms">
  <Blobs>
    <Blob><Name>gpcsf_2.pdf</Name><Properties><Content-Length>1024</Content-Length></Properties></Blob>
    <Blob><Name>gpcsf_3.pdf</Name><Properties><Content-Length>2048</Content-Length></Properties></Blob>
  </Blobs>
  <NextMarker />
</EnumerationResults>"#;
        let (names, marker) = parse_list_blobs_response(xml);
        assert_eq!(names, vec!["gpcsf_2.pdf", "gpcsf_3.pdf"]);
        assert!(marker.is_none());
    }

    #[test]
    fn empty_listing_yields_no_names() {
        let xml = r#"<EnumerationResults><Blobs /></EnumerationResults>"#;
        let (names, marker) = parse_list_blobs_response(xml);
        assert!(names.is_empty());
        assert!(marker.is_none());
    }

    #[test]
    fn next_marker_is_surfaced_for_pagination() {
        let xml = r#"<EnumerationResults>
  <Blobs><Blob><Name>a.txt</Name></Blob></Blobs>
  <NextMarker>2!72!MDAwMDE</NextMarker>
</EnumerationResults>"#;
        let (names, marker) = parse_list_blobs_response(xml);
        assert_eq!(names, vec!["a.txt"]);
        assert_eq!(marker.as_deref(), Some("2!72!MDAwMDE"));
    }

    #[test]
    fn canonicalized_resource_sorts_query_params() {
        let resource = canonicalized_resource(
            "acct",
            "tax-data",
            None,
            &[
                ("restype".to_string(), "container".to_string()),
                ("comp".to_string(), "list".to_string()),
            ],
        );
        assert_eq!(resource, "/acct/tax-data\ncomp:list\nrestype:container");
    }

    #[test]
    fn canonicalized_resource_includes_blob_path() {
        let resource = canonicalized_resource("acct", "legal-statutes", Some("ocga_sections.txt"), &[]);
        assert_eq!(resource, "/acct/legal-statutes/ocga_sections.txt");
    }

    #[test]
    fn uri_encode_leaves_unreserved_untouched() {
        assert_eq!(uri_encode("gpcsf_2.pdf"), "gpcsf_2.pdf");
        assert_eq!(uri_encode("a b/c"), "a%20b%2Fc");
    }
}
