//! 게이트웨이 요청/응답 모델
//!
//! POST /query 의 JSON 스키마입니다.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request
// ============================================================================

/// 질의 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// 사용자 질문
    pub query: String,
    /// 문서 검색 사용 여부
    #[serde(default = "default_true")]
    pub use_documents: bool,
    /// 웹 검색 폴백 사용 여부
    #[serde(default)]
    pub use_web_search: bool,
    /// 생성 최대 토큰 (없으면 설정 기본값)
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// 샘플링 온도 (없으면 설정 기본값)
    #[serde(default)]
    pub temperature: Option<f32>,
    /// 문서 검색 결과 수 (없으면 설정 기본값)
    #[serde(default)]
    pub top_k: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl QueryRequest {
    /// 기본 옵션으로 질의 생성 (문서 검색만 사용)
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            use_documents: true,
            use_web_search: false,
            max_tokens: None,
            temperature: None,
            top_k: None,
        }
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.use_web_search = enabled;
        self
    }

    pub fn with_documents(mut self, enabled: bool) -> Self {
        self.use_documents = enabled;
        self
    }
}

// ============================================================================
// Response
// ============================================================================

/// 답변 생성 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMethod {
    /// 인덱싱된 문서 컨텍스트 기반
    Document,
    /// 웹 검색 컨텍스트 기반
    WebSearch,
    /// 컨텍스트 없이 LLM 직접 답변
    Direct,
    /// 컨텍스트 부족 (LLM 호출 안 함)
    InsufficientContext,
}

impl AnswerMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::WebSearch => "web_search",
            Self::Direct => "direct",
            Self::InsufficientContext => "insufficient_context",
        }
    }
}

/// 출처 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Document,
    Web,
}

/// 응답에 포함되는 출처 미리보기
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSnippet {
    /// 미리보기 텍스트 (최대 200자)
    pub text: String,
    /// 백엔드가 보고한 관련도 스코어
    pub score: f32,
    /// 출처 종류
    pub source: SourceKind,
}

/// 질의 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceSnippet>,
    pub method: AnswerMethod,
    /// 신뢰도 (0.0 ~ 1.0)
    pub confidence: f32,
}

// ============================================================================
// Tests
// ============================================================================
