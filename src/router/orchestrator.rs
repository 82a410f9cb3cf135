//! 쿼리 라우터 - 질의별 소스 선택 및 답변 생성
//!
//! 1. 문서 검색 (use_documents) → 결과가 있으면 문서 컨텍스트
//! 2. 컨텍스트가 없고 use_web_search 이면 웹 검색 폴백
//! 3. 여전히 컨텍스트가 없으면 직접 답변 또는 컨텍스트 부족 응답
//!
//! 검색 실패는 경고 후 "결과 없음"으로 처리하고,
//! 생성 실패는 에러로 전파합니다.

use std::sync::Arc;

use crate::config::{GatewayConfig, RoutingConfig};
use crate::error::{GatewayError, Result};
use crate::models::{AnswerMethod, QueryRequest, QueryResponse, SourceSnippet};
use crate::services::{
    CompletionRequest, DocumentSearch, DocumentServiceClient, LlmServiceClient, TextCompletion,
    WebSearch, WebSearchClient,
};

use super::confidence::ConfidenceModel;
use super::context::{document_sources, web_sources, AssembledContext, ContextAssembler};

/// 컨텍스트 부족 시 답변
pub const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "I don't have enough context to answer this question.";

/// 요청 가능한 최대 top_k
pub const MAX_TOP_K: usize = 100;

/// 허용 온도 범위
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

// ============================================================================
// Types
// ============================================================================

/// 기본값이 적용된 요청 파라미터
#[derive(Debug, Clone, PartialEq)]
struct ResolvedParams {
    query: String,
    top_k: usize,
    max_tokens: u32,
    temperature: f32,
}

/// 한 소스에서 가져온 검색 결과
#[derive(Debug, Clone)]
struct Retrieval {
    method: AnswerMethod,
    context: AssembledContext,
    sources: Vec<SourceSnippet>,
}

// ============================================================================
// QueryRouter
// ============================================================================

/// 쿼리 라우터
///
/// 세 백엔드를 트레이트 객체로 보유하며, 워커 간에 `Arc`로 공유됩니다.
pub struct QueryRouter {
    documents: Arc<dyn DocumentSearch>,
    web: Arc<dyn WebSearch>,
    llm: Arc<dyn TextCompletion>,
    config: RoutingConfig,
    assembler: ContextAssembler,
    confidence: ConfidenceModel,
}

impl QueryRouter {
    /// 백엔드 구현체로 라우터 생성
    pub fn new(
        documents: Arc<dyn DocumentSearch>,
        web: Arc<dyn WebSearch>,
        llm: Arc<dyn TextCompletion>,
        config: RoutingConfig,
    ) -> Self {
        let assembler = ContextAssembler::from_config(&config);
        let confidence = ConfidenceModel::new(config.context_passages);

        Self {
            documents,
            web,
            llm,
            config,
            assembler,
            confidence,
        }
    }

    /// 게이트웨이 설정으로 HTTP 백엔드를 연결해 생성
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let documents =
            DocumentServiceClient::new(&config.document_service_url, config.service_timeout)?;
        let web = WebSearchClient::new(&config.web_search_service_url, config.service_timeout)?;
        let llm = LlmServiceClient::new(&config.llm_service_url, config.llm_timeout)?;

        Ok(Self::new(
            Arc::new(documents),
            Arc::new(web),
            Arc::new(llm),
            config.routing.clone(),
        ))
    }

    /// 질의 처리
    ///
    /// # Returns
    /// 답변, 선택된 소스의 전체 출처, 답변 방식, 신뢰도
    pub async fn route(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let params = self.resolve(request)?;

        let mut retrieval = None;

        if request.use_documents {
            retrieval = self.retrieve_documents(&params).await;
        }

        if retrieval.is_none() && request.use_web_search {
            retrieval = self.retrieve_web(&params.query).await;
        }

        let passages = retrieval
            .as_ref()
            .map_or(0, |found| found.context.passages_used);

        let response = match retrieval {
            Some(found) => {
                let answer = self.generate(&params, &found.context.text).await?;
                QueryResponse {
                    answer,
                    confidence: self.confidence.score(passages),
                    method: found.method,
                    sources: found.sources,
                }
            }
            None if self.config.allow_direct_answers => {
                let answer = self.generate(&params, "").await?;
                QueryResponse {
                    answer,
                    sources: Vec::new(),
                    method: AnswerMethod::Direct,
                    confidence: self.confidence.score(0),
                }
            }
            None => QueryResponse {
                answer: INSUFFICIENT_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
                method: AnswerMethod::InsufficientContext,
                confidence: self.confidence.insufficient(),
            },
        };

        tracing::info!(
            method = response.method.as_str(),
            passages,
            sources = response.sources.len(),
            confidence = response.confidence,
            "Query routed"
        );

        Ok(response)
    }

    /// 요청 검증 및 기본값 적용
    fn resolve(&self, request: &QueryRequest) -> Result<ResolvedParams> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Query text is required".to_string(),
            ));
        }

        let top_k = request.top_k.unwrap_or(self.config.default_top_k);
        if top_k == 0 || top_k > MAX_TOP_K {
            return Err(GatewayError::InvalidRequest(format!(
                "top_k must be within 1..={}, got {}",
                MAX_TOP_K, top_k
            )));
        }

        let max_tokens = request.max_tokens.unwrap_or(self.config.default_max_tokens);
        if max_tokens == 0 {
            return Err(GatewayError::InvalidRequest(
                "max_tokens must be at least 1".to_string(),
            ));
        }

        let temperature = request
            .temperature
            .unwrap_or(self.config.default_temperature);
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(GatewayError::InvalidRequest(format!(
                "temperature must be within 0.0..=2.0, got {}",
                temperature
            )));
        }

        Ok(ResolvedParams {
            query: query.to_string(),
            top_k,
            max_tokens,
            temperature,
        })
    }

    /// 문서 검색 (실패 시 None)
    async fn retrieve_documents(&self, params: &ResolvedParams) -> Option<Retrieval> {
        let matches = match self.documents.search(&params.query, params.top_k).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("Document search failed: {}", e);
                return None;
            }
        };

        let total = matches.len();
        let matches: Vec<_> = matches
            .into_iter()
            .filter(|m| m.score >= self.config.min_document_score)
            .collect();

        if matches.len() < total {
            tracing::debug!(
                "Dropped {} document matches below score {}",
                total - matches.len(),
                self.config.min_document_score
            );
        }

        let context = self.assembler.assemble_documents(&matches);
        if context.is_empty() {
            tracing::debug!("Document search produced no usable context");
            return None;
        }

        Some(Retrieval {
            method: AnswerMethod::Document,
            context,
            sources: document_sources(&matches),
        })
    }

    /// 웹 검색 (실패 시 None)
    async fn retrieve_web(&self, query: &str) -> Option<Retrieval> {
        let results = match self.web.search(query, self.config.web_results).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Web search failed: {}", e);
                return None;
            }
        };

        let results: Vec<_> = results
            .into_iter()
            .filter(|r| !r.title.trim().is_empty() || !r.content.trim().is_empty())
            .collect();

        if results.is_empty() {
            tracing::debug!("Web search returned no usable results");
            return None;
        }

        Some(Retrieval {
            method: AnswerMethod::WebSearch,
            context: self.assembler.assemble_web(&results),
            sources: web_sources(&results),
        })
    }

    /// LLM 답변 생성
    async fn generate(&self, params: &ResolvedParams, context: &str) -> Result<String> {
        let request = CompletionRequest {
            query: params.query.clone(),
            context: context.to_string(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        self.llm.generate(&request).await
    }
}

// ============================================================================
// Tests
// ============================================================================
