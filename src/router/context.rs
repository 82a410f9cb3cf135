//! 컨텍스트 조립 - 검색 결과를 LLM 컨텍스트와 출처 미리보기로 변환
//!
//! - 랭크 순으로 최대 `max_passages`개 패시지 사용
//! - 패시지 사이 구분자는 빈 줄 ("\n\n")
//! - 정규화 후 동일한 패시지는 한 번만 사용
//! - 전체 길이는 `max_chars` 문자로 제한

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

use crate::config::RoutingConfig;
use crate::models::{SourceKind, SourceSnippet};
use crate::services::{DocumentMatch, WebResult};

/// 출처 미리보기 최대 길이 (문자 수)
pub const PREVIEW_CHARS: usize = 200;

/// 패시지 구분자
const SEPARATOR: &str = "\n\n";

// ============================================================================
// Types
// ============================================================================

/// 조립된 컨텍스트
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    /// LLM에 전달할 컨텍스트 텍스트
    pub text: String,
    /// 실제 사용된 패시지 수
    pub passages_used: usize,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ============================================================================
// ContextAssembler
// ============================================================================

/// 컨텍스트 조립기
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_passages: usize,
    max_chars: usize,
}

impl ContextAssembler {
    /// 새 조립기 생성
    ///
    /// # Arguments
    /// * `max_passages` - 컨텍스트에 넣을 최대 패시지 수
    /// * `max_chars` - 컨텍스트 최대 길이 (문자 수)
    pub fn new(max_passages: usize, max_chars: usize) -> Self {
        Self {
            max_passages: max_passages.max(1),
            max_chars: max_chars.max(1),
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.context_passages, config.max_context_chars)
    }

    /// 문서 매치로 컨텍스트 조립
    pub fn assemble_documents(&self, matches: &[DocumentMatch]) -> AssembledContext {
        self.assemble(matches.iter().map(|m| normalize_whitespace(&m.text)))
    }

    /// 웹 검색 결과로 컨텍스트 조립
    ///
    /// 각 패시지는 `Title: ...\nContent: ...` 형식입니다.
    pub fn assemble_web(&self, results: &[WebResult]) -> AssembledContext {
        self.assemble(results.iter().map(|r| {
            format!(
                "Title: {}\nContent: {}",
                strip_html(&r.title),
                strip_html(&r.content)
            )
        }))
    }

    /// 패시지 목록을 예산 안에서 결합
    fn assemble<I>(&self, passages: I) -> AssembledContext
    where
        I: IntoIterator<Item = String>,
    {
        let mut parts: Vec<String> = Vec::with_capacity(self.max_passages);
        let mut seen: HashSet<String> = HashSet::new();
        let mut used_chars = 0usize;

        for passage in passages {
            if parts.len() >= self.max_passages {
                break;
            }

            if passage.trim().is_empty() || seen.contains(&passage) {
                continue;
            }

            let separator_len = if parts.is_empty() { 0 } else { SEPARATOR.len() };
            let passage_len = passage.chars().count();

            if used_chars + separator_len + passage_len > self.max_chars {
                // 첫 패시지가 예산을 넘으면 잘라서라도 사용
                if parts.is_empty() {
                    parts.push(passage.chars().take(self.max_chars).collect());
                }
                tracing::debug!(
                    "Context budget reached ({} chars), {} passages used",
                    self.max_chars,
                    parts.len()
                );
                break;
            }

            used_chars += separator_len + passage_len;
            seen.insert(passage.clone());
            parts.push(passage);
        }

        AssembledContext {
            passages_used: parts.len(),
            text: parts.join(SEPARATOR),
        }
    }
}

// ============================================================================
// Sources
// ============================================================================

/// 문서 매치 → 출처 미리보기 (전체, 랭크 순)
pub fn document_sources(matches: &[DocumentMatch]) -> Vec<SourceSnippet> {
    matches
        .iter()
        .map(|m| SourceSnippet {
            text: preview(&normalize_whitespace(&m.text), PREVIEW_CHARS),
            score: m.score,
            source: SourceKind::Document,
        })
        .collect()
}

/// 웹 결과 → 출처 미리보기 (전체, 랭크 순)
pub fn web_sources(results: &[WebResult]) -> Vec<SourceSnippet> {
    results
        .iter()
        .map(|r| SourceSnippet {
            text: preview(&strip_html(&r.content), PREVIEW_CHARS),
            score: r.score,
            source: SourceKind::Web,
        })
        .collect()
}

// ============================================================================
// Helper Functions
// ============================================================================

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// 연속 공백(줄바꿈 포함)을 한 칸으로 정리
pub fn normalize_whitespace(text: &str) -> String {
    whitespace_re().replace_all(text, " ").trim().to_string()
}

/// HTML 스니펫에서 텍스트만 추출 (태그 제거, 엔티티 디코딩)
pub fn strip_html(snippet: &str) -> String {
    if !snippet.contains('<') && !snippet.contains('&') {
        return normalize_whitespace(snippet);
    }

    let fragment = Html::parse_fragment(snippet);
    let text: String = fragment.root_element().text().collect();
    normalize_whitespace(&text)
}

/// 미리보기 텍스트 (UTF-8 안전, 잘린 경우에만 "..." 추가)
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================
