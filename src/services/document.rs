//! 문서 서비스 클라이언트 - 유사도 검색
//!
//! `POST {base}/search` `{"query", "top_k"}` → `{"results": [...]}`

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{build_client, RetryPolicy};
use super::{DocumentMatch, DocumentSearch, DOCUMENT_SERVICE};
use crate::error::{GatewayError, Result};

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<DocumentMatch>,
}

/// 문서 서비스 HTTP 클라이언트
#[derive(Debug, Clone)]
pub struct DocumentServiceClient {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl DocumentServiceClient {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `base_url` - 문서 서비스 베이스 URL (예: http://document-service:8001)
    /// * `timeout` - 요청 타임아웃
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
            retry: RetryPolicy::none(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DocumentSearch for DocumentServiceClient {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<DocumentMatch>> {
        let url = format!("{}/search", self.base_url);
        let body = SearchRequest { query, top_k };

        let response = self
            .retry
            .send(DOCUMENT_SERVICE, || self.client.post(&url).json(&body))
            .await?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::upstream(DOCUMENT_SERVICE, format!("invalid response: {}", e)))?;

        tracing::debug!(
            "Document search returned {} matches (top_k={})",
            parsed.results.len(),
            top_k
        );

        Ok(parsed.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client =
            DocumentServiceClient::new("http://localhost:8001/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8001");
    }

    #[test]
    fn test_response_parsing() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"results": [
                {"text": "chunk one", "distance": 12.0, "score": 0.0769},
                {"text": "chunk two", "score": 0.05}
            ]}"#,
        )
        .unwrap();

        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].distance, Some(12.0));
        assert_eq!(parsed.results[1].distance, None);
    }

    #[test]
    fn test_response_without_results() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
