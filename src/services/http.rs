//! HTTP 공통 유틸 - 클라이언트 생성, 재시도 정책
//!
//! 429(Rate Limit)와 전송 오류는 지수 백오프로 재시도하고,
//! 그 밖의 상태 코드는 즉시 실패로 처리합니다.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};

use crate::error::{GatewayError, Result};

/// 재시도 최대 횟수
const MAX_RETRIES: u32 = 3;
/// 재시도 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 500;

/// HTTP 클라이언트 생성
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("ragway/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// 재시도 없음
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// n번째 시도(0-based) 후의 백오프
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// 요청 전송 (재시도 포함)
    ///
    /// 성공(2xx) 응답만 반환합니다. `make_request`는 매 시도마다 호출됩니다.
    pub(crate) async fn send<F>(&self, service: &str, make_request: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error: Option<GatewayError> = None;

        for attempt in 0..=self.max_retries {
            let backoff = self.backoff(attempt);

            match make_request().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    tracing::warn!(
                        "{} rate limited (429) (attempt {}/{})",
                        service,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(GatewayError::UpstreamStatus {
                        service: service.to_string(),
                        status: 429,
                        body: "rate limit exceeded".to_string(),
                    });
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(GatewayError::UpstreamStatus {
                        service: service.to_string(),
                        status,
                        body,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "{} request failed: {} (attempt {}/{})",
                        service,
                        e,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(GatewayError::from_reqwest(service, e));
                }
            }

            if attempt < self.max_retries {
                tracing::debug!("{} retrying in {:?}", service, backoff);
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GatewayError::upstream(service, format!("failed after {} retries", self.max_retries))
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================
