//! 상태/설정/버전 조회 핸들러.

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use perfmon_core::PROGRAM_NAME;
use serde::Serialize;

use crate::AppState;

/// 버전 정보
#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
}

/// GET / - 엔드포인트 목록
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let mut links = vec![
        ("/metrics", "Metrics"),
        ("/status", "Status"),
        ("/config", "Configuration"),
        ("/version", "Version"),
    ];
    if state.stop_allowed() {
        links.push(("/stop", "Stop"));
    }

    let items: String = links
        .iter()
        .map(|(href, label)| format!("<li><a href=\"{}\">{}</a></li>", href, label))
        .collect();
    Html(format!(
        "<html><head><title>{name}</title></head><body><h1>{name}</h1><ul>{items}</ul></body></html>",
        name = PROGRAM_NAME,
        items = items
    ))
}

/// GET /status - 클라이언트 상태 카운터
pub async fn get_status(State(state): State<AppState>) -> String {
    state.status.snapshot().to_string()
}

/// GET /config - 적용된 설정 (비밀번호 가림)
pub async fn get_config(State(state): State<AppState>) -> String {
    state.config_text.as_ref().clone()
}

/// GET /version
pub async fn get_version() -> Json<VersionInfo> {
    Json(VersionInfo {
        name: PROGRAM_NAME,
        version: env!("CARGO_PKG_VERSION"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    })
}
