//! LLM 서비스 클라이언트 - 텍스트 생성
//!
//! `POST {base}/generate` `{"query", "context", "max_tokens", "temperature"}`
//! → `{"response", "model", "tokens_generated"}`
//!
//! 프롬프트 구성과 디코딩은 LLM 서비스가 담당합니다.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{build_client, RetryPolicy};
use super::{CompletionRequest, TextCompletion, LLM_SERVICE};
use crate::error::{GatewayError, Result};

/// 응답 본문이 비어있을 때의 답변
pub const EMPTY_RESPONSE_FALLBACK: &str = "I couldn't generate a response.";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    tokens_generated: Option<u64>,
}

/// LLM 서비스 HTTP 클라이언트
#[derive(Debug, Clone)]
pub struct LlmServiceClient {
    base_url: String,
    client: reqwest::Client,
}

impl LlmServiceClient {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `base_url` - LLM 서비스 베이스 URL
    /// * `timeout` - 생성 요청 타임아웃 (모델 추론 시간 포함)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 모델 정보 조회 (`GET /model-info`)
    pub async fn model_info(&self) -> Result<serde_json::Value> {
        let url = format!("{}/model-info", self.base_url);

        let response = RetryPolicy::none()
            .send(LLM_SERVICE, || self.client.get(&url))
            .await?;

        response
            .json()
            .await
            .map_err(|e| GatewayError::upstream(LLM_SERVICE, format!("invalid response: {}", e)))
    }
}

/// 생성 응답에서 답변 추출
fn extract_answer(parsed: GenerateResponse) -> String {
    match parsed.response {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => EMPTY_RESPONSE_FALLBACK.to_string(),
    }
}

#[async_trait]
impl TextCompletion for LlmServiceClient {
    async fn generate(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/generate", self.base_url);

        // 생성 요청은 재시도하지 않음
        let response = RetryPolicy::none()
            .send(LLM_SERVICE, || self.client.post(&url).json(request))
            .await?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::upstream(LLM_SERVICE, format!("invalid response: {}", e)))?;

        tracing::debug!(
            "Generated answer (model={:?}, tokens={:?})",
            parsed.model,
            parsed.tokens_generated
        );

        Ok(extract_answer(parsed))
    }
}
