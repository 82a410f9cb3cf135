//! 외부 서비스 모듈 - 문서 검색 / 웹 검색 / LLM 생성
//!
//! 게이트웨이는 세 백엔드를 트레이트 경계 뒤에서만 사용합니다.
//! - DocumentSearch: 임베딩 + 벡터 DB 유사도 검색 (document-service)
//! - WebSearch: 웹 검색 스니펫 (web-search-service)
//! - TextCompletion: LLM 텍스트 생성 (llm-service)

mod document;
mod health;
mod http;
mod llm;
mod web_search;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

pub use document::DocumentServiceClient;
pub use health::{HealthChecker, HealthReport, ServiceStatus};
pub use http::RetryPolicy;
pub use llm::LlmServiceClient;
pub use web_search::WebSearchClient;

/// 서비스 이름 (로그 / 에러 / 헬스 리포트 키)
pub const DOCUMENT_SERVICE: &str = "document-service";
pub const LLM_SERVICE: &str = "llm-service";
pub const WEB_SEARCH_SERVICE: &str = "web-search-service";

/// 웹 검색 결과에 스코어가 없을 때 사용하는 값
pub const DEFAULT_WEB_SCORE: f32 = 0.5;

// ============================================================================
// Types
// ============================================================================

/// 문서 유사도 검색 결과 (랭크 순)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMatch {
    /// 청크 텍스트
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    /// 유사도 스코어 (높을수록 좋음)
    pub score: f32,
    /// 원시 거리 (백엔드가 제공하는 경우)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// 웹 검색 결과 (랭크 순)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    /// 스니펫 (HTML 포맷일 수 있음)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default = "default_web_score")]
    pub score: f32,
}

fn default_web_score() -> f32 {
    DEFAULT_WEB_SCORE
}

/// null 문자열 필드를 빈 문자열로 처리
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// LLM 생성 요청
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub query: String,
    /// 조립된 컨텍스트 (없으면 빈 문자열)
    pub context: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

// ============================================================================
// Traits
// ============================================================================

/// 문서 유사도 검색 트레이트
#[async_trait]
pub trait DocumentSearch: Send + Sync {
    /// 질의와 유사한 청크 검색
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<DocumentMatch>>;
}

/// 웹 검색 트레이트
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// 웹 검색 스니펫 조회
    async fn search(&self, query: &str, count: usize) -> Result<Vec<WebResult>>;
}

/// 텍스트 생성 트레이트
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// 질의 + 컨텍스트로 답변 생성
    async fn generate(&self, request: &CompletionRequest) -> Result<String>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_match_null_text() {
        let m: DocumentMatch = serde_json::from_str(r#"{"text": null, "score": 0.1}"#).unwrap();
        assert_eq!(m.text, "");
        assert_eq!(m.distance, None);
    }

    #[test]
    fn test_web_result_defaults() {
        let r: WebResult = serde_json::from_str(r#"{"title": "Rust", "content": null}"#).unwrap();
        assert_eq!(r.title, "Rust");
        assert_eq!(r.content, "");
        assert_eq!(r.url, "");
        assert_eq!(r.score, DEFAULT_WEB_SCORE);
    }
}
