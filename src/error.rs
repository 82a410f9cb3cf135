//! 게이트웨이 에러 타입
//!
//! 라이브러리 계층은 `GatewayError`를 반환하고,
//! 바이너리/CLI는 anyhow로 감싸서 사용합니다.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

/// 게이트웨이 Result 별칭
pub type Result<T> = std::result::Result<T, GatewayError>;

/// 게이트웨이 에러
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 잘못된 요청 (빈 쿼리, 범위 밖 파라미터 등)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// 설정 오류 (환경변수 파싱 실패, 잘못된 URL 등)
    #[error("configuration error: {0}")]
    Config(String),

    /// 업스트림 서비스 호출 실패 (연결 실패, 응답 파싱 실패)
    #[error("{service} request failed: {message}")]
    Upstream { service: String, message: String },

    /// 업스트림 서비스가 성공이 아닌 상태 코드를 반환
    #[error("{service} returned {status}: {body}")]
    UpstreamStatus {
        service: String,
        status: u16,
        body: String,
    },

    /// 업스트림 서비스 타임아웃
    #[error("{service} timed out")]
    Timeout { service: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// reqwest 에러를 서비스 이름과 함께 변환
    pub fn from_reqwest(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                service: service.to_string(),
            }
        } else {
            Self::Upstream {
                service: service.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

/// HTTP 에러 응답 본문
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } | Self::UpstreamStatus { .. } => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail: self.to_string(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
