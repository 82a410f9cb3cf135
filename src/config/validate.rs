//! 환경 검증 - 배포 전 필수 환경변수 / .env 점검
//!
//! 필수 키가 없거나 플레이스홀더(`your_...`)이면 누락으로 판단합니다.
//! 값은 마스킹해서만 보고합니다.

use std::path::Path;

use serde::Serialize;

/// 필수 환경변수
pub const REQUIRED_VARS: &[&str] = &["BING_API_KEY", "HUGGINGFACE_TOKEN"];

/// 선택 환경변수 (없으면 서비스 기본값 사용)
pub const OPTIONAL_VARS: &[&str] = &[
    "CUDA_VISIBLE_DEVICES",
    "GPU_MEMORY_UTILIZATION",
    "TENSOR_PARALLEL_SIZE",
    "MAX_MODEL_LEN",
    "CHUNK_SIZE",
    "DEFAULT_TOP_K",
];

/// Bing API 키 최소 길이
const MIN_BING_KEY_LEN: usize = 20;

// ============================================================================
// Types
// ============================================================================

/// 환경변수 하나의 점검 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VarStatus {
    /// 설정됨 (표시용 값: 필수 키는 마스킹)
    Set { name: String, display: String },
    /// 미설정 또는 플레이스홀더
    Missing { name: String },
}

impl VarStatus {
    pub fn name(&self) -> &str {
        match self {
            Self::Set { name, .. } | Self::Missing { name } => name,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set { .. })
    }
}

/// 환경 검증 리포트
#[derive(Debug, Clone, Serialize)]
pub struct EnvReport {
    /// .env 파일 존재 여부
    pub env_file_found: bool,
    pub required: Vec<VarStatus>,
    pub optional: Vec<VarStatus>,
    /// 키 형식 경고
    pub warnings: Vec<String>,
}

impl EnvReport {
    /// 누락된 필수 변수 이름
    pub fn missing_required(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|v| !v.is_set())
            .map(|v| v.name())
            .collect()
    }

    /// 기본값을 사용하는 선택 변수 이름
    pub fn defaulted_optional(&self) -> Vec<&str> {
        self.optional
            .iter()
            .filter(|v| !v.is_set())
            .map(|v| v.name())
            .collect()
    }

    /// .env 파일이 있고 필수 변수가 모두 설정되었는지
    pub fn is_valid(&self) -> bool {
        self.env_file_found && self.missing_required().is_empty()
    }
}

// ============================================================================
// Validation
// ============================================================================

/// 환경 검증 실행
///
/// # Arguments
/// * `env_file` - 확인할 .env 파일 경로
/// * `lookup` - 환경변수 조회 함수
pub fn validate_environment<F>(env_file: &Path, lookup: F) -> EnvReport
where
    F: Fn(&str) -> Option<String>,
{
    let env_file_found = env_file.is_file();

    let required = REQUIRED_VARS
        .iter()
        .map(|name| match lookup(name) {
            Some(value) if !value.is_empty() && !value.starts_with("your_") => VarStatus::Set {
                name: name.to_string(),
                display: mask_secret(&value),
            },
            _ => VarStatus::Missing {
                name: name.to_string(),
            },
        })
        .collect();

    let optional = OPTIONAL_VARS
        .iter()
        .map(|name| match lookup(name) {
            Some(value) if !value.is_empty() => VarStatus::Set {
                name: name.to_string(),
                display: value,
            },
            _ => VarStatus::Missing {
                name: name.to_string(),
            },
        })
        .collect();

    let warnings = key_format_warnings(&lookup);

    EnvReport {
        env_file_found,
        required,
        optional,
        warnings,
    }
}

/// 비밀 값 마스킹 (`*` 최대 8개 + `...`)
pub fn mask_secret(value: &str) -> String {
    format!("{}...", "*".repeat(value.chars().count().min(8)))
}

/// API 키 형식 점검
fn key_format_warnings<F>(lookup: &F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut warnings = Vec::new();

    if let Some(key) = lookup("BING_API_KEY") {
        if !key.is_empty() && !key.starts_with("your_") && key.chars().count() < MIN_BING_KEY_LEN
        {
            warnings.push("BING_API_KEY seems too short (should be 32+ characters)".to_string());
        }
    }

    if let Some(token) = lookup("HUGGINGFACE_TOKEN") {
        if !token.is_empty() && !token.starts_with("hf_your") && !token.starts_with("hf_") {
            warnings.push("HUGGINGFACE_TOKEN should start with 'hf_'".to_string());
        }
    }

    warnings
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
    fn test_mask_secret() {
        assert_eq!(mask_secret("abc"), "***...");
        assert_eq!(mask_secret("a-very-long-secret-value"), "********...");
        assert_eq!(mask_secret(""), "...");
    }

    #[test]
    fn test_valid_environment() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "BING_API_KEY=x\n").unwrap();

        let report = validate_environment(
            &env_file,
            lookup_from(&[
                ("BING_API_KEY", "0123456789abcdef0123456789abcdef"),
                ("HUGGINGFACE_TOKEN", "hf_abcdefghijklmnop"),
                ("MAX_MODEL_LEN", "4096"),
            ]),
        );

        assert!(report.env_file_found);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
        assert_eq!(
            report.required[0],
            VarStatus::Set {
                name: "BING_API_KEY".into(),
                display: "********...".into(),
            }
        );
        assert!(report.defaulted_optional().contains(&"CHUNK_SIZE"));
        assert!(!report.defaulted_optional().contains(&"MAX_MODEL_LEN"));
    }

    #[test]
    fn test_missing_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate_environment(
            &dir.path().join(".env"),
            lookup_from(&[
                ("BING_API_KEY", "0123456789abcdef0123456789abcdef"),
                ("HUGGINGFACE_TOKEN", "hf_token"),
            ]),
        );

        assert!(!report.env_file_found);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_placeholder_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "").unwrap();

        let report = validate_environment(
            &env_file,
            lookup_from(&[
                ("BING_API_KEY", "your_bing_api_key_here"),
                ("HUGGINGFACE_TOKEN", "hf_your_token"),
            ]),
        );

        assert_eq!(report.missing_required(), vec!["BING_API_KEY"]);
        assert!(!report.is_valid());
        // 플레이스홀더에는 형식 경고를 내지 않음
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_format_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate_environment(
            &dir.path().join(".env"),
            lookup_from(&[("BING_API_KEY", "short"), ("HUGGINGFACE_TOKEN", "token123")]),
        );

        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("BING_API_KEY"));
        assert!(report.warnings[1].contains("hf_"));
    }
}
