//! 메트릭 노출 핸들러.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::ApiError;
use crate::AppState;

/// GET /metrics - Prometheus 텍스트 노출 포맷
pub async fn get_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.exporter.render()?;
    Ok(([(header::CONTENT_TYPE, state.exporter.content_type())], body))
}
