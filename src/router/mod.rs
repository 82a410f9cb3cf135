//! 라우터 모듈 - 소스 선택, 컨텍스트 조립, 신뢰도 스코어링
//!
//! - context: 검색 결과 → LLM 컨텍스트 / 출처 미리보기
//! - confidence: 사용된 컨텍스트 양 → 신뢰도
//! - orchestrator: 문서 → 웹 → 직접 답변 순서의 라우팅

mod confidence;
mod context;
mod orchestrator;

pub use confidence::ConfidenceModel;
pub use context::{
    document_sources, normalize_whitespace, preview, strip_html, web_sources, AssembledContext,
    ContextAssembler, PREVIEW_CHARS,
};
pub use orchestrator::{QueryRouter, INSUFFICIENT_CONTEXT_ANSWER, MAX_TOP_K};
