//! 헬스 체크 - 하위 서비스 `/health` 동시 점검

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use super::http::build_client;
use crate::config::GatewayConfig;
use crate::error::Result;

use super::{DOCUMENT_SERVICE, LLM_SERVICE, WEB_SEARCH_SERVICE};

/// 헬스 체크 요청 타임아웃
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// 게이트웨이 자신의 키
pub const GATEWAY: &str = "gateway";

/// 서비스 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// `/health`가 200 응답
    Healthy,
    /// 응답은 있으나 200이 아님
    Unhealthy,
    /// 연결 실패 / 타임아웃
    Unreachable,
}

/// 헬스 리포트
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    #[serde(flatten)]
    pub services: BTreeMap<String, ServiceStatus>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    /// 모든 서비스가 healthy 인지
    pub fn all_healthy(&self) -> bool {
        self.services
            .values()
            .all(|status| *status == ServiceStatus::Healthy)
    }
}

/// 하위 서비스 헬스 체커
#[derive(Debug, Clone)]
pub struct HealthChecker {
    client: reqwest::Client,
    /// (서비스 이름, 베이스 URL)
    targets: Vec<(String, String)>,
}

impl HealthChecker {
    /// 임의의 대상 목록으로 생성
    pub fn new(targets: Vec<(String, String)>) -> Result<Self> {
        Ok(Self {
            client: build_client(HEALTH_TIMEOUT)?,
            targets: targets
                .into_iter()
                .map(|(name, url)| (name, url.trim_end_matches('/').to_string()))
                .collect(),
        })
    }

    /// 게이트웨이 설정의 세 서비스로 생성
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Self::new(vec![
            (
                DOCUMENT_SERVICE.to_string(),
                config.document_service_url.clone(),
            ),
            (LLM_SERVICE.to_string(), config.llm_service_url.clone()),
            (
                WEB_SEARCH_SERVICE.to_string(),
                config.web_search_service_url.clone(),
            ),
        ])
    }

    pub fn targets(&self) -> &[(String, String)] {
        &self.targets
    }

    /// 단일 서비스 점검
    async fn probe(&self, name: &str, base_url: &str) -> ServiceStatus {
        let url = format!("{}/health", base_url);

        match self.client.get(&url).send().await {
            Ok(response) if response.status().as_u16() == 200 => ServiceStatus::Healthy,
            Ok(response) => {
                tracing::warn!("{} health check returned {}", name, response.status());
                ServiceStatus::Unhealthy
            }
            Err(e) => {
                tracing::warn!("{} unreachable: {}", name, e);
                ServiceStatus::Unreachable
            }
        }
    }

    /// 모든 서비스 동시 점검
    pub async fn check_all(&self) -> HealthReport {
        let probes = self
            .targets
            .iter()
            .map(|(name, url)| async move { (name.clone(), self.probe(name, url).await) });

        let mut services: BTreeMap<String, ServiceStatus> =
            join_all(probes).await.into_iter().collect();
        services.insert(GATEWAY.to_string(), ServiceStatus::Healthy);

        HealthReport {
            services,
            checked_at: Utc::now(),
        }
    }
}
