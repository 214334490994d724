//! # perfmon-app
//!
//! CUCM PerfMon 익스포터 바이너리 진입점.
//! DI 컨테이너 역할, 라이프사이클 관리, 감독 루프와 메트릭 엔드포인트 오케스트레이션.

mod lifecycle;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use perfmon_core::config::AppConfig;
use perfmon_core::config_manager::{ConfigManager, ConfigOverrides, DEFAULT_CONFIG_FILE};
use perfmon_core::models::status::ClientStatus;
use perfmon_network::{RateGovernor, SoapHttpClient};
use perfmon_session::{SessionCoordinator, Supervisor, SupervisorConfig};
use perfmon_web::{AppState, PrometheusExporter, WebServer};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::lifecycle::LifecycleManager;

/// CUCM PerfMon 익스포터
///
/// PerfMon SOAP API를 주기적으로 수집해 Prometheus 메트릭으로 노출한다
#[derive(Parser, Debug)]
#[command(name = "cucm-perfmon-exporter")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (YAML 또는 JSON)
    #[arg(long = "config.file", default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    /// 적용된 설정을 출력하고 종료
    #[arg(long = "config.show")]
    config_show: bool,

    /// CUCM 주소 (IP 또는 DNS 이름)
    #[arg(long = "api.address")]
    api_address: Option<String>,

    /// API 사용자
    #[arg(long = "api.user")]
    api_user: Option<String>,

    /// API 비밀번호
    #[arg(long = "api.pwd")]
    api_password: Option<String>,

    /// 로그 파일 경로
    #[arg(long = "log.file")]
    log_file: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long = "log.level")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_address: self.api_address.clone(),
            api_user: self.api_user.clone(),
            api_password: self.api_password.clone(),
            log_file: self.log_file.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ConfigManager::load(&args.config_file, args.overrides()) {
        Ok(manager) => manager.get(),
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.config_show {
        print!("{}", config.render());
        return ExitCode::SUCCESS;
    }

    let _log_guard = logging::init_logging(&config.log);
    info!(
        "{} v{} 시작 (설정: {})",
        perfmon_core::PROGRAM_NAME,
        env!("CARGO_PKG_VERSION"),
        args.config_file.display()
    );

    match run(config).await {
        Ok(()) => {
            info!("정상 종료");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("비정상 종료: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// 컴포넌트 조립 후 감독 루프를 전면에서 실행
async fn run(config: AppConfig) -> Result<()> {
    let status = Arc::new(ClientStatus::new());
    let governor = Arc::new(RateGovernor::new());
    let transport = Arc::new(
        SoapHttpClient::new(&config.api, governor, status.clone())
            .context("PerfMon 클라이언트 생성 실패")?,
    );
    info!("PerfMon 엔드포인트: {}", transport.endpoint());

    let exporter = Arc::new(PrometheusExporter::new(config.metrics.process_collector));
    let coordinator = SessionCoordinator::new(
        transport,
        exporter.clone(),
        status.clone(),
        config.metrics.clone(),
        &config.monitor.hosts,
    );
    let mut supervisor = Supervisor::new(SupervisorConfig::from(&config.monitor), coordinator);

    let lifecycle = Arc::new(LifecycleManager::new());

    // OS 시그널
    let signal_lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        signal_lifecycle.wait_for_signal().await;
    });

    // /stop 요청 → 종료 신호
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let stop_lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        if stop_rx.recv().await.is_some() {
            info!("/stop 요청 수신");
            stop_lifecycle.shutdown();
        }
    });

    let state = AppState::new(exporter, status)
        .with_config_text(config.render())
        .with_stop(config.web.allow_stop, stop_tx);
    let web_server = WebServer::new(config.web.clone(), state);
    let web_rx = lifecycle.subscribe();
    let web_lifecycle = lifecycle.clone();
    let web_handle = tokio::spawn(async move {
        let result = web_server.run(web_rx).await;
        if let Err(e) = &result {
            error!("메트릭 엔드포인트 실패: {}", e);
            web_lifecycle.shutdown();
        }
        result
    });

    let supervised = supervisor.run(lifecycle.subscribe()).await;
    lifecycle.shutdown();

    let served = web_handle.await.context("메트릭 엔드포인트 태스크 실패")?;
    supervised.context("수집 중단")?;
    served.context("메트릭 엔드포인트 실행 실패")?;
    Ok(())
}
