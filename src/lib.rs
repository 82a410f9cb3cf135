//! ragway - RAG 쿼리 라우팅 게이트웨이
//!
//! 질의마다 문서 검색 → 웹 검색 → LLM 직접 답변 순서로 소스를 고르고,
//! 컨텍스트를 조립해 LLM 서비스로 답변을 생성합니다.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod router;
pub mod server;
pub mod services;

// Re-exports
pub use config::{GatewayConfig, RoutingConfig};
pub use error::{GatewayError, Result};
pub use models::{AnswerMethod, QueryRequest, QueryResponse, SourceKind, SourceSnippet};
pub use router::{ConfidenceModel, ContextAssembler, QueryRouter};
pub use services::{
    CompletionRequest, DocumentMatch, DocumentSearch, DocumentServiceClient, HealthChecker,
    HealthReport, LlmServiceClient, ServiceStatus, TextCompletion, WebResult, WebSearch,
    WebSearchClient,
};
