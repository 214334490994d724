//! 클라이언트 상태 카운터.
//!
//! 트랜스포트와 세션 코디네이터가 갱신하고, HTTP `/status`가 읽는다.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// 공유 클라이언트 상태 (lock-free)
#[derive(Debug, Default)]
pub struct ClientStatus {
    /// 시도한 요청 수
    requests: AtomicU64,
    /// 성공 응답 수
    responses: AtomicU64,
    /// 전송 실패 + HTTP 에러 응답 수
    response_errors: AtomicU64,
    /// 세션 열림 여부
    session_open: AtomicBool,
    /// 마지막 수집 성공 시각 (Unix 밀리초, 0이면 없음)
    last_collect_ms: AtomicI64,
}

impl ClientStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response(&self) {
        self.responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.response_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_session_open(&self, open: bool) {
        self.session_open.store(open, Ordering::Relaxed);
    }

    pub fn is_session_open(&self) -> bool {
        self.session_open.load(Ordering::Relaxed)
    }

    /// 수집 성공 시각 기록
    pub fn mark_collected(&self, at: DateTime<Utc>) {
        self.last_collect_ms
            .store(at.timestamp_millis(), Ordering::Relaxed);
    }

    /// 현재 값 스냅샷
    pub fn snapshot(&self) -> StatusSnapshot {
        let last_ms = self.last_collect_ms.load(Ordering::Relaxed);
        StatusSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            responses: self.responses.load(Ordering::Relaxed),
            response_errors: self.response_errors.load(Ordering::Relaxed),
            session_open: self.is_session_open(),
            last_collect: if last_ms == 0 {
                None
            } else {
                Utc.timestamp_millis_opt(last_ms).single()
            },
        }
    }
}

/// 상태 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub requests: u64,
    pub responses: u64,
    pub response_errors: u64,
    pub session_open: bool,
    pub last_collect: Option<DateTime<Utc>>,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Client status")?;
        writeln!(f, "\tRequests:     {}", self.requests)?;
        writeln!(f, "\tResponses:    {}", self.responses)?;
        writeln!(f, "\tError:        {}", self.response_errors)?;
        writeln!(f, "\tConnected:    {}", self.session_open)?;
        match &self.last_collect {
            Some(at) => writeln!(f, "\tLast collect: {}", at.to_rfc3339()),
            None => writeln!(f, "\tLast collect: -"),
        }
    }
}
