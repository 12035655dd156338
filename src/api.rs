// ABOUTME: Blocking HTTP client for the Granola document API
// ABOUTME: Bearer auth, offset pagination, and fail-fast errors with body previews

use crate::{DocumentSummary, Error, Result, Segment};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde_json::json;
use std::time::Duration;

const PAGE_SIZE: usize = 100;

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(token: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(ApiClient {
            client,
            base_url: base_url.unwrap_or_else(|| "https://api.granola.ai".into()),
            token,
        })
    }

    fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<reqwest::blocking::Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("User-Agent", "granola-relay/0.3 (Rust)")
            .json(&body)
            .send()?;

        Ok(response)
    }

    fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let response = self.post(endpoint, body)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: truncate_str(&message, 100),
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| {
            eprintln!("Failed to parse response from {}: {}", endpoint, e);
            eprintln!("Response body (first 500 chars): {}", truncate_str(&body, 500));
            Error::Parse(e)
        })
    }

    /// List document summaries, oldest pages first as the API returns them,
    /// dropping anything created before `since`. The remote listing order is
    /// preserved within the result.
    pub fn list_documents(&self, since: Option<DateTime<Utc>>) -> Result<Vec<DocumentSummary>> {
        #[derive(serde::Deserialize)]
        struct Page {
            #[serde(default)]
            docs: Vec<DocumentSummary>,
        }

        let mut all = Vec::new();
        let mut offset = 0;

        loop {
            let page: Page = self.post_json(
                "/v2/get-documents",
                json!({
                    "limit": PAGE_SIZE,
                    "offset": offset,
                    "include_last_viewed_panel": true,
                }),
            )?;

            let page_len = page.docs.len();
            for doc in page.docs {
                match since {
                    Some(cutoff) if doc.created_at < cutoff => {}
                    _ => all.push(doc),
                }
            }

            if page_len < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }

        Ok(all)
    }

    /// Fetch the transcript for one document. A 404 means the meeting had no
    /// recorded audio and yields an empty segment list, not an error.
    pub fn get_transcript(&self, doc_id: &str) -> Result<Vec<Segment>> {
        #[derive(serde::Deserialize)]
        struct Transcript {
            #[serde(default)]
            segments: Vec<Segment>,
        }

        let endpoint = "/v1/get-document-transcript";
        let response = self.post(endpoint, json!({ "document_id": doc_id }))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: truncate_str(&message, 100),
            });
        }

        let transcript: Transcript = serde_json::from_str(&response.text()?)?;
        Ok(transcript.segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_short() {
        assert_eq!(truncate_str("hello", 100), "hello");
    }

    #[test]
    fn test_truncate_str_exact() {
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_str_long() {
        let result = truncate_str("hello world", 7);
        assert!(result.starts_with("hello"));
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_str_utf8() {
        // Multi-byte UTF-8 must not split a char
        let text = "Hello 世界 World";
        let result = truncate_str(text, 10);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new("test_token".into(), None).unwrap();
        assert_eq!(client.base_url, "https://api.granola.ai");
        assert_eq!(client.token, "test_token");
    }

    #[test]
    fn test_api_client_custom_base() {
        let client = ApiClient::new("token".into(), Some("https://custom.api".into())).unwrap();
        assert_eq!(client.base_url, "https://custom.api");
    }
}
