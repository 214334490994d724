//! # perfmon-web
//!
//! Prometheus 익스포터와 메트릭 HTTP 엔드포인트.
//! Axum 기반.
//!
//! ## 엔드포인트
//! - `/metrics` Prometheus 텍스트 노출 포맷
//! - `/status` 클라이언트 상태 카운터
//! - `/config` 적용된 설정
//! - `/version` 프로그램 버전
//! - `/stop` 수집 중지 (설정에서 허용한 경우)

pub mod error;
pub mod exporter;
pub mod handlers;
pub mod routes;

use axum::Router;
use perfmon_core::config::WebConfig;
use perfmon_core::models::status::ClientStatus;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use exporter::PrometheusExporter;

/// 웹 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 메트릭 익스포터
    pub exporter: Arc<PrometheusExporter>,
    /// 클라이언트 상태 카운터
    pub status: Arc<ClientStatus>,
    /// 렌더링된 설정 (`/config`)
    pub config_text: Arc<String>,
    /// `/stop` 허용 여부
    pub allow_stop: bool,
    /// 중지 요청 송신 채널
    pub stop_tx: Option<mpsc::Sender<()>>,
}

impl AppState {
    pub fn new(exporter: Arc<PrometheusExporter>, status: Arc<ClientStatus>) -> Self {
        Self {
            exporter,
            status,
            config_text: Arc::new(String::new()),
            allow_stop: false,
            stop_tx: None,
        }
    }

    /// `/config`에 보여줄 설정 텍스트
    pub fn with_config_text(mut self, text: impl Into<String>) -> Self {
        self.config_text = Arc::new(text.into());
        self
    }

    /// `/stop` 요청을 전달할 채널. `allow`가 false면 요청을 거부한다.
    pub fn with_stop(mut self, allow: bool, stop_tx: mpsc::Sender<()>) -> Self {
        self.allow_stop = allow;
        self.stop_tx = Some(stop_tx);
        self
    }

    /// 중지 요청을 받을 수 있는지 여부
    pub fn stop_allowed(&self) -> bool {
        self.allow_stop && self.stop_tx.is_some()
    }
}

/// 라우터 구성 (테스트에서 직접 사용)
pub fn router(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 메트릭 HTTP 서버
pub struct WebServer {
    config: WebConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(config: WebConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// 서버 실행
    ///
    /// 바인드 실패는 에러로 반환한다. 종료 신호 후에는 진행 중 요청을
    /// `shutdown_grace_secs`까지만 기다린다.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), io::Error> {
        let addr = format!("{}:{}", self.config.listen_address, self.config.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            io::Error::new(e.kind(), format!("메트릭 엔드포인트 바인드 실패 {}: {}", addr, e))
        })?;
        info!("메트릭 엔드포인트 시작: http://{}", addr);

        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        let mut graceful_rx = shutdown_rx.clone();
        let serve = axum::serve(listener, router(self.state)).with_graceful_shutdown(async move {
            wait_for_shutdown(&mut graceful_rx).await;
            info!("메트릭 엔드포인트 종료 신호 수신");
        });
        let mut server = tokio::spawn(async move { serve.await });

        tokio::select! {
            result = &mut server => return join_result(result),
            _ = wait_for_shutdown(&mut shutdown_rx) => {}
        }

        match tokio::time::timeout(grace, &mut server).await {
            Ok(result) => {
                info!("메트릭 엔드포인트 종료");
                join_result(result)
            }
            Err(_) => {
                warn!("종료 대기 시간 {:?} 초과, 연결 강제 종료", grace);
                server.abort();
                Ok(())
            }
        }
    }
}

async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
}

fn join_result(
    result: Result<Result<(), io::Error>, tokio::task::JoinError>,
) -> Result<(), io::Error> {
    result.map_err(|e| io::Error::other(e.to_string()))?
}
