//! CLI 모듈
//!
//! ragway CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{validate_environment, EnvReport, GatewayConfig, VarStatus};
use crate::models::{QueryRequest, QueryResponse};
use crate::router::QueryRouter;
use crate::server::run_server;
use crate::services::{HealthChecker, LlmServiceClient, ServiceStatus};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "ragway")]
#[command(version, about = "RAG 쿼리 라우팅 게이트웨이", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 게이트웨이 HTTP 서버 실행
    Serve {
        /// 바인드 호스트 (기본: GATEWAY_HOST 또는 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// 바인드 포트 (기본: GATEWAY_PORT 또는 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// 질의 한 건을 라우팅하고 결과 출력
    Query {
        /// 질문
        query: String,

        /// 문서 검색 사용 안 함
        #[arg(long)]
        no_documents: bool,

        /// 웹 검색 폴백 사용
        #[arg(short, long)]
        web: bool,

        /// 생성 최대 토큰
        #[arg(long)]
        max_tokens: Option<u32>,

        /// 샘플링 온도 (0.0 ~ 2.0)
        #[arg(short, long)]
        temperature: Option<f32>,

        /// 문서 검색 결과 수
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// 하위 서비스 상태 확인
    Health,

    /// 배포 환경변수 / .env 점검
    Validate {
        /// 확인할 .env 파일
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port).await,
        Commands::Query {
            query,
            no_documents,
            web,
            max_tokens,
            temperature,
            top_k,
        } => {
            let request = QueryRequest {
                query,
                use_documents: !no_documents,
                use_web_search: web,
                max_tokens,
                temperature,
                top_k,
            };
            cmd_query(request).await
        }
        Commands::Health => cmd_health().await,
        Commands::Validate { env_file } => cmd_validate(&env_file),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 서버 실행 명령어 (serve)
async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = GatewayConfig::from_env().context("설정 로드 실패")?;

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    run_server(config).await
}

/// 질의 명령어 (query)
async fn cmd_query(request: QueryRequest) -> Result<()> {
    let config = GatewayConfig::from_env().context("설정 로드 실패")?;
    let router = QueryRouter::from_config(&config).context("라우터 초기화 실패")?;

    println!("[*] 질의 중: \"{}\"", request.query);

    let response = router
        .route(&request)
        .await
        .context("질의 처리 실패")?;

    print_response(&response);
    Ok(())
}

fn print_response(response: &QueryResponse) {
    println!(
        "\n[OK] 답변 (방식: {}, 신뢰도: {:.2})\n",
        response.method.as_str(),
        response.confidence
    );
    println!("{}", response.answer);

    if response.sources.is_empty() {
        return;
    }

    println!("\n출처 ({} 건):", response.sources.len());
    for (i, source) in response.sources.iter().enumerate() {
        println!(
            "  {}. [{:?}] 스코어: {:.3}",
            i + 1,
            source.source,
            source.score
        );
        println!("     {}", truncate_text(&source.text, 120));
    }
}

/// 상태 확인 명령어 (health)
async fn cmd_health() -> Result<()> {
    let config = GatewayConfig::from_env().context("설정 로드 실패")?;
    let checker = HealthChecker::from_config(&config)?;

    println!("ragway v{}", env!("CARGO_PKG_VERSION"));
    println!();

    for (name, url) in checker.targets() {
        println!("[*] {}: {}", name, url);
    }
    println!();

    let report = checker.check_all().await;
    for (name, status) in &report.services {
        match status {
            ServiceStatus::Healthy => println!("[OK] {}: healthy", name),
            ServiceStatus::Unhealthy => println!("[!] {}: unhealthy", name),
            ServiceStatus::Unreachable => println!("[!] {}: unreachable", name),
        }
    }

    // 모델 정보는 LLM 서비스가 살아있을 때만 조회
    if report.services.get(crate::services::LLM_SERVICE) == Some(&ServiceStatus::Healthy) {
        let llm = LlmServiceClient::new(&config.llm_service_url, config.service_timeout)?;
        match llm.model_info().await {
            Ok(info) => {
                println!();
                println!("[OK] 모델 정보:");
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
            Err(e) => println!("[!] 모델 정보 조회 실패: {}", e),
        }
    }

    if !report.all_healthy() {
        bail!("일부 서비스가 정상 상태가 아닙니다");
    }

    Ok(())
}

/// 환경 점검 명령어 (validate)
fn cmd_validate(env_file: &Path) -> Result<()> {
    if env_file.is_file() {
        dotenvy::from_path(env_file)
            .with_context(|| format!(".env 파일 읽기 실패: {}", env_file.display()))?;
    }

    let report = validate_environment(env_file, |key| std::env::var(key).ok());
    print_env_report(env_file, &report);

    if !report.is_valid() {
        bail!("환경 검증 실패");
    }

    println!("\n[OK] 환경 검증 통과");
    Ok(())
}

fn print_env_report(env_file: &Path, report: &EnvReport) {
    if report.env_file_found {
        println!("[OK] .env 파일: {}", env_file.display());
    } else {
        println!("[!] .env 파일을 찾을 수 없습니다: {}", env_file.display());
        println!("    .env.example 을 복사해 값을 채워주세요");
    }

    println!("\n필수 변수:");
    for var in &report.required {
        println!("  {}", format_var(var));
    }

    println!("\n선택 변수:");
    for var in &report.optional {
        println!("  {}", format_var(var));
    }

    for warning in &report.warnings {
        println!("[!] {}", warning);
    }
}

fn format_var(var: &VarStatus) -> String {
    match var {
        VarStatus::Set { name, display } => format!("[OK] {} = {}", name, display),
        VarStatus::Missing { name } => format!("[!] {} (미설정)", name),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전, 한 줄로 정리)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    crate::router::preview(cleaned.trim(), max_chars)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate_text("안녕하세요 세계", 5), "안녕하세요...");
    }

    #[test]
    fn test_query_args() {
        let cli = Cli::try_parse_from([
            "ragway",
            "query",
            "what is rust",
            "--web",
            "--no-documents",
            "-k",
            "7",
            "--temperature",
            "0.2",
        ])
        .unwrap();

        match cli.command {
            Commands::Query {
                query,
                no_documents,
                web,
                max_tokens,
                temperature,
                top_k,
            } => {
                assert_eq!(query, "what is rust");
                assert!(no_documents);
                assert!(web);
                assert_eq!(max_tokens, None);
                assert_eq!(temperature, Some(0.2));
                assert_eq!(top_k, Some(7));
            }
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_validate_default_env_file() {
        let cli = Cli::try_parse_from(["ragway", "validate"]).unwrap();
        match cli.command {
            Commands::Validate { env_file } => assert_eq!(env_file, PathBuf::from(".env")),
            _ => panic!("expected validate command"),
        }
    }

    #[test]
    fn test_format_var() {
        let set = VarStatus::Set {
            name: "BING_API_KEY".into(),
            display: "********...".into(),
        };
        assert_eq!(format_var(&set), "[OK] BING_API_KEY = ********...");

        let missing = VarStatus::Missing {
            name: "HUGGINGFACE_TOKEN".into(),
        };
        assert_eq!(format_var(&missing), "[!] HUGGINGFACE_TOKEN (미설정)");
    }
}
