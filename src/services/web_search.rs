//! 웹 검색 서비스 클라이언트
//!
//! `GET {base}/search?q=..&count=..` → `{"query", "results": [...], "searchResultsCount"}`
//!
//! 검색 API는 Rate Limit(429)이 잦으므로 지수 백오프로 재시도합니다.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{build_client, RetryPolicy};
use super::{WebResult, WebSearch, WEB_SEARCH_SERVICE};
use crate::error::{GatewayError, Result};

/// 한 번에 요청 가능한 최대 결과 수 (Bing web search 제한)
pub const MAX_WEB_RESULTS: usize = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<WebResult>,
    #[serde(default, rename = "searchResultsCount")]
    search_results_count: Option<usize>,
}

/// 웹 검색 HTTP 클라이언트
#[derive(Debug, Clone)]
pub struct WebSearchClient {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl WebSearchClient {
    /// 새 클라이언트 생성 (기본 재시도 정책)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
            retry: RetryPolicy::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WebSearch for WebSearchClient {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<WebResult>> {
        let url = format!("{}/search", self.base_url);
        let count = count.clamp(1, MAX_WEB_RESULTS);
        let params = [("q", query.to_string()), ("count", count.to_string())];

        let response = self
            .retry
            .send(WEB_SEARCH_SERVICE, || self.client.get(&url).query(&params))
            .await?;

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            GatewayError::upstream(WEB_SEARCH_SERVICE, format!("invalid response: {}", e))
        })?;

        tracing::debug!(
            "Web search returned {} results (reported {:?})",
            parsed.results.len(),
            parsed.search_results_count
        );

        Ok(parsed.results)
    }
}
