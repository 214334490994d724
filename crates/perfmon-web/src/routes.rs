//! 라우트 정의.

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::AppState;

/// 전체 라우트 생성
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::info::index))
        // Prometheus 스크레이프
        .route("/metrics", get(handlers::metrics::get_metrics))
        // 진단
        .route("/status", get(handlers::info::get_status))
        .route("/config", get(handlers::info::get_config))
        .route("/version", get(handlers::info::get_version))
        // 제어
        .route(
            "/stop",
            get(handlers::control::stop).post(handlers::control::stop),
        )
}
