//! 설정 모듈 - 환경변수 / .env 기반 게이트웨이 설정
//!
//! 모든 값은 기본값을 가지며, 환경변수로 덮어쓸 수 있습니다.
//! 파싱 실패는 시작 시점의 설정 오류로 처리합니다.

mod validate;

use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{GatewayError, Result};

pub use validate::{mask_secret, validate_environment, EnvReport, VarStatus};

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DOCUMENT_SERVICE_URL: &str = "http://document-service:8001";
pub const DEFAULT_LLM_SERVICE_URL: &str = "http://llm-service:8002";
pub const DEFAULT_WEB_SEARCH_SERVICE_URL: &str = "http://web-search-service:8003";

// ============================================================================
// Routing Config
// ============================================================================

/// 라우팅 / 컨텍스트 조립 설정
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    /// 문서 검색 결과 수 (요청에 top_k가 없을 때)
    pub default_top_k: usize,
    /// 웹 검색 결과 수
    pub web_results: usize,
    /// 컨텍스트에 사용할 최대 패시지 수
    pub context_passages: usize,
    /// 컨텍스트 최대 길이 (문자 수)
    pub max_context_chars: usize,
    /// 이 스코어 미만의 문서 매치는 버림
    pub min_document_score: f32,
    /// 컨텍스트가 없을 때 LLM 직접 답변 허용 여부
    pub allow_direct_answers: bool,
    /// 생성 최대 토큰 기본값
    pub default_max_tokens: u32,
    /// 샘플링 온도 기본값
    pub default_temperature: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            web_results: 5,
            context_passages: 3,
            max_context_chars: 12_000,
            min_document_score: 0.0,
            allow_direct_answers: true,
            default_max_tokens: 1024,
            default_temperature: 0.7,
        }
    }
}

// ============================================================================
// Gateway Config
// ============================================================================

/// 게이트웨이 전체 설정
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// 문서 서비스 (유사도 검색) 베이스 URL
    pub document_service_url: String,
    /// LLM 서비스 베이스 URL
    pub llm_service_url: String,
    /// 웹 검색 서비스 베이스 URL
    pub web_search_service_url: String,
    /// LLM 생성 요청 타임아웃
    pub llm_timeout: Duration,
    /// 검색 서비스 요청 타임아웃
    pub service_timeout: Duration,
    pub routing: RoutingConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            document_service_url: DEFAULT_DOCUMENT_SERVICE_URL.to_string(),
            llm_service_url: DEFAULT_LLM_SERVICE_URL.to_string(),
            web_search_service_url: DEFAULT_WEB_SEARCH_SERVICE_URL.to_string(),
            llm_timeout: Duration::from_secs(60),
            service_timeout: Duration::from_secs(30),
            routing: RoutingConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// 환경변수에서 설정 로드
    ///
    /// 현재 디렉토리의 `.env` 파일이 있으면 먼저 읽습니다.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Failed to load .env: {}", e),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 조회 함수로 설정 로드
    ///
    /// 테스트에서 프로세스 환경을 건드리지 않기 위해 분리되어 있습니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let routing_defaults = RoutingConfig::default();

        let routing = RoutingConfig {
            default_top_k: parse_var(&lookup, "DEFAULT_TOP_K", routing_defaults.default_top_k)?,
            web_results: parse_var(&lookup, "WEB_SEARCH_RESULTS", routing_defaults.web_results)?,
            context_passages: parse_var(
                &lookup,
                "CONTEXT_PASSAGES",
                routing_defaults.context_passages,
            )?,
            max_context_chars: parse_var(
                &lookup,
                "MAX_CONTEXT_CHARS",
                routing_defaults.max_context_chars,
            )?,
            min_document_score: parse_var(
                &lookup,
                "MIN_DOCUMENT_SCORE",
                routing_defaults.min_document_score,
            )?,
            allow_direct_answers: parse_var(
                &lookup,
                "ALLOW_DIRECT_ANSWERS",
                routing_defaults.allow_direct_answers,
            )?,
            default_max_tokens: parse_var(
                &lookup,
                "DEFAULT_MAX_TOKENS",
                routing_defaults.default_max_tokens,
            )?,
            default_temperature: parse_var(
                &lookup,
                "DEFAULT_TEMPERATURE",
                routing_defaults.default_temperature,
            )?,
        };

        let config = Self {
            host: lookup("GATEWAY_HOST")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parse_var(&lookup, "GATEWAY_PORT", defaults.port)?,
            document_service_url: service_url(
                &lookup,
                "DOCUMENT_SERVICE_URL",
                DEFAULT_DOCUMENT_SERVICE_URL,
            )?,
            llm_service_url: service_url(&lookup, "LLM_SERVICE_URL", DEFAULT_LLM_SERVICE_URL)?,
            web_search_service_url: service_url(
                &lookup,
                "WEB_SEARCH_SERVICE_URL",
                DEFAULT_WEB_SEARCH_SERVICE_URL,
            )?,
            llm_timeout: Duration::from_secs(parse_var(&lookup, "LLM_TIMEOUT_SECS", 60u64)?),
            service_timeout: Duration::from_secs(parse_var(
                &lookup,
                "SERVICE_TIMEOUT_SECS",
                30u64,
            )?),
            routing,
        };

        config.check()?;
        Ok(config)
    }

    /// 값 범위 검사
    fn check(&self) -> Result<()> {
        let r = &self.routing;
        if r.context_passages == 0 {
            return Err(GatewayError::Config(
                "CONTEXT_PASSAGES must be at least 1".to_string(),
            ));
        }
        if r.default_top_k == 0 {
            return Err(GatewayError::Config(
                "DEFAULT_TOP_K must be at least 1".to_string(),
            ));
        }
        if r.max_context_chars == 0 {
            return Err(GatewayError::Config(
                "MAX_CONTEXT_CHARS must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&r.default_temperature) {
            return Err(GatewayError::Config(format!(
                "DEFAULT_TEMPERATURE must be within 0.0..=2.0, got {}",
                r.default_temperature
            )));
        }
        Ok(())
    }

    /// 바인드 주소 (host:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 환경변수를 파싱 (없거나 빈 값이면 기본값)
fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
            GatewayError::Config(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
        _ => Ok(default),
    }
}

/// 서비스 URL 로드 및 검증 (끝의 '/' 제거)
fn service_url<F>(lookup: &F, key: &str, default: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string());

    let parsed = Url::parse(raw.trim())
        .map_err(|e| GatewayError::Config(format!("{} is not a valid URL '{}': {}", key, raw, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GatewayError::Config(format!(
            "{} must use http or https, got '{}'",
            key,
            parsed.scheme()
        )));
    }

    Ok(raw.trim().trim_end_matches('/').to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = GatewayConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.routing.context_passages, 3);
        assert_eq!(config.llm_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("GATEWAY_PORT", "9000"),
            ("DOCUMENT_SERVICE_URL", "http://localhost:8001/"),
            ("DEFAULT_TOP_K", "8"),
            ("ALLOW_DIRECT_ANSWERS", "false"),
            ("MIN_DOCUMENT_SCORE", "0.25"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.document_service_url, "http://localhost:8001");
        assert_eq!(config.routing.default_top_k, 8);
        assert!(!config.routing.allow_direct_answers);
        assert_eq!(config.routing.min_document_score, 0.25);
    }

    #[test]
    fn test_empty_value_uses_default() {
        let config =
            GatewayConfig::from_lookup(lookup_from(&[("DEFAULT_TOP_K", "  ")])).unwrap();
        assert_eq!(config.routing.default_top_k, 5);
    }

    #[test]
    fn test_invalid_number() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("GATEWAY_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("GATEWAY_PORT"));
    }

    #[test]
    fn test_invalid_url() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("LLM_SERVICE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));

        let err = GatewayConfig::from_lookup(lookup_from(&[(
            "LLM_SERVICE_URL",
            "ftp://llm-service:8002",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_zero_context_passages_rejected() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("CONTEXT_PASSAGES", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("CONTEXT_PASSAGES"));
    }

    #[test]
    fn test_temperature_range() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("DEFAULT_TEMPERATURE", "3.5")]))
            .unwrap_err();
        assert!(err.to_string().contains("DEFAULT_TEMPERATURE"));
    }
}
