//! 프로세스 제어 핸들러.

use axum::extract::State;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

/// GET|POST /stop - 수집 중지 요청
pub async fn stop(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    let Some(stop_tx) = state.stop_tx.as_ref().filter(|_| state.allow_stop) else {
        warn!("허용되지 않은 중지 요청");
        return Err(ApiError::Forbidden("Not allowed stop".to_string()));
    };

    info!("HTTP 중지 요청 수신");
    // 이미 요청이 대기 중이면 무시
    let _ = stop_tx.try_send(());
    Ok("Stop processing")
}
