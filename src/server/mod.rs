//! HTTP 서버 - 게이트웨이 API
//!
//! - `POST /query`: 질의 라우팅
//! - `GET /health`: 하위 서비스 상태
//!
//! 모든 응답에 `x-request-id` 헤더가 붙습니다.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::{from_fn, Next};
use actix_web::{web, App, HttpMessage, HttpResponse, HttpServer};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::models::QueryRequest;
use crate::router::QueryRouter;
use crate::services::HealthChecker;

/// 요청 ID 헤더
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 핸들러 공유 상태
pub struct AppState {
    pub router: Arc<QueryRouter>,
    pub health: HealthChecker,
}

impl AppState {
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            router: Arc::new(QueryRouter::from_config(config)?),
            health: HealthChecker::from_config(config)?,
        })
    }
}

/// 요청별 ID (요청 extensions에 저장)
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

// ============================================================================
// Middleware
// ============================================================================

/// 요청마다 uuid를 발급하고 응답 헤더에 기록
///
/// 핸들러 에러와 추출기 에러(잘못된 JSON 등)로 만들어진 응답에도 적용됩니다.
pub async fn assign_request_id(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> std::result::Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.call(req).await?;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    Ok(response)
}

// ============================================================================
// Handlers
// ============================================================================

async fn query(
    state: web::Data<AppState>,
    request_id: web::ReqData<RequestId>,
    body: web::Json<QueryRequest>,
) -> std::result::Result<HttpResponse, GatewayError> {
    let request_id = request_id.into_inner().0;
    let span = tracing::info_span!("query", request_id = %request_id);

    let response = async {
        tracing::info!(
            web_search = body.use_web_search,
            documents = body.use_documents,
            "Query received: {}",
            crate::router::preview(body.query.trim(), 80)
        );
        state.router.route(&body).await
    }
    .instrument(span)
    .await;

    match response {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            tracing::error!(request_id = %request_id, "Query failed: {}", e);
            Err(e)
        }
    }
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.health.check_all().await)
}

/// 라우트 등록
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/query", web::post().to(query))
        .route("/health", web::get().to(health));
}

/// JSON 본문 파싱 실패를 400 `{"detail"}` 응답으로 변환
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        GatewayError::InvalidRequest(err.to_string()).into()
    })
}

// ============================================================================
// Server
// ============================================================================

/// 게이트웨이 서버 실행 (종료 신호까지 대기)
pub async fn run_server(config: GatewayConfig) -> anyhow::Result<()> {
    let state = web::Data::new(AppState::from_config(&config)?);
    let bind_addr = config.bind_addr();

    tracing::info!("Starting gateway on http://{}", bind_addr);
    tracing::info!("  document-service: {}", config.document_service_url);
    tracing::info!("  llm-service: {}", config.llm_service_url);
    tracing::info!("  web-search-service: {}", config.web_search_service_url);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(from_fn(assign_request_id))
            .app_data(state.clone())
            .app_data(json_config())
            .configure(configure)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::models::{AnswerMethod, QueryResponse};
    use crate::services::{
        CompletionRequest, DocumentMatch, DocumentSearch, TextCompletion, WebResult, WebSearch,
    };
    use actix_web::http::StatusCode;
    use actix_web::test;
    use async_trait::async_trait;

    struct StaticDocuments(Vec<&'static str>);

    #[async_trait]
    impl DocumentSearch for StaticDocuments {
        async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<DocumentMatch>> {
            Ok(self
                .0
                .iter()
                .map(|t| DocumentMatch {
                    text: t.to_string(),
                    score: 0.9,
                    distance: None,
                })
                .collect())
        }
    }

    struct NoWeb;

    #[async_trait]
    impl WebSearch for NoWeb {
        async fn search(&self, _query: &str, _count: usize) -> Result<Vec<WebResult>> {
            Ok(Vec::new())
        }
    }

    struct EchoLlm;

    #[async_trait]
    impl TextCompletion for EchoLlm {
        async fn generate(&self, request: &CompletionRequest) -> Result<String> {
            Ok(format!("echo: {}", request.query))
        }
    }

    struct TimeoutLlm;

    #[async_trait]
    impl TextCompletion for TimeoutLlm {
        async fn generate(&self, _request: &CompletionRequest) -> Result<String> {
            Err(GatewayError::Timeout {
                service: "llm-service".to_string(),
            })
        }
    }

    fn state(docs: Vec<&'static str>, llm: Arc<dyn TextCompletion>) -> web::Data<AppState> {
        let router = QueryRouter::new(
            Arc::new(StaticDocuments(docs)),
            Arc::new(NoWeb),
            llm,
            RoutingConfig::default(),
        );
        web::Data::new(AppState {
            router: Arc::new(router),
            health: HealthChecker::new(Vec::new()).unwrap(),
        })
    }

    #[actix_web::test]
    async fn test_query_endpoint() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(assign_request_id))
                .app_data(state(vec!["context"], Arc::new(EchoLlm)))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(serde_json::json!({"query": "hello"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));

        let body: QueryResponse = test::read_body_json(resp).await;
        assert_eq!(body.answer, "echo: hello");
        assert_eq!(body.method, AnswerMethod::Document);
        assert_eq!(body.sources.len(), 1);
    }

    #[actix_web::test]
    async fn test_blank_query_is_bad_request() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(assign_request_id))
                .app_data(state(vec!["context"], Arc::new(EchoLlm)))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(serde_json::json!({"query": "  "}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().contains("Query text"));
    }

    #[actix_web::test]
    async fn test_malformed_body_is_bad_request() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(assign_request_id))
                .app_data(state(vec![], Arc::new(EchoLlm)))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(serde_json::json!({"question": "missing field"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body.get("detail").is_some());
    }

    #[actix_web::test]
    async fn test_llm_timeout_is_gateway_timeout() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(assign_request_id))
                .app_data(state(vec!["context"], Arc::new(TimeoutLlm)))
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(serde_json::json!({"query": "slow"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[actix_web::test]
    async fn test_health_endpoint() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(assign_request_id))
                .app_data(state(vec![], Arc::new(EchoLlm)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["gateway"], "healthy");
    }
}
