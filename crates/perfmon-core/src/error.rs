//! 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 에러를 `CoreError`로 변환해 반환한다.
//! 프로세스 종료 여부는 바이너리만 결정하며, 하위 레이어는 [`ErrorClass`]로
//! 치명/일시/부분 실패를 구분해 위로 전달한다.

use thiserror::Error;

/// 에러 처리 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 재시도 금지, 프로세스 종료 (401, 원격 rate limit)
    Fatal,
    /// 세션을 닫고 쿨다운 후 재연결
    Transient,
    /// 호스트/카운터 단위 실패 집계 (로그 후 계속)
    Partial,
    /// 개별 샘플 폐기 (잘못된 경로 등)
    Ignorable,
}

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 인증 실패 (HTTP 401)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 원격 API의 요청 한도 위반 (RateControl 폴트)
    #[error("원격 요청 한도 위반: {0}")]
    RateLimit(String),

    /// 네트워크 에러 (연결 실패, 타임아웃, 본문 읽기 실패)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 원격 SOAP 폴트 (HTTP 상태 > 299)
    #[error("원격 에러 (HTTP {status}): {fault_code} {fault_string}")]
    Remote {
        /// HTTP 상태 코드
        status: u16,
        /// SOAP faultcode
        fault_code: String,
        /// SOAP faultstring
        fault_string: String,
    },

    /// 응답 디코딩 실패
    #[error("응답 디코딩 실패: {0}")]
    Decode(String),

    /// 열린 세션 없음
    #[error("열린 PerfMon 세션이 없습니다")]
    NoSession,

    /// `server\group\counter` 형식이 아닌 카운터 경로
    #[error("잘못된 카운터 경로: {0}")]
    MalformedCounterPath(String),

    /// 여러 대상 중 일부 실패
    #[error("{operation}: {failed}건 실패")]
    PartialFailure {
        /// 작업 이름
        operation: String,
        /// 실패 건수
        failed: usize,
    },

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 에러 처리 분류 반환
    pub fn class(&self) -> ErrorClass {
        match self {
            CoreError::Auth(_) | CoreError::RateLimit(_) => ErrorClass::Fatal,
            CoreError::PartialFailure { .. } => ErrorClass::Partial,
            CoreError::MalformedCounterPath(_) => ErrorClass::Ignorable,
            _ => ErrorClass::Transient,
        }
    }

    /// 재시도하면 안 되는 치명적 에러인지 여부
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_and_rate_limit_are_fatal() {
        assert!(CoreError::Auth("401".into()).is_fatal());
        assert!(CoreError::RateLimit("RateControl".into()).is_fatal());
    }

    #[test]
    fn transport_errors_are_transient() {
        assert_eq!(
            CoreError::Network("timeout".into()).class(),
            ErrorClass::Transient
        );
        let remote = CoreError::Remote {
            status: 500,
            fault_code: "soapenv:Server".into(),
            fault_string: "boom".into(),
        };
        assert_eq!(remote.class(), ErrorClass::Transient);
        assert!(!remote.is_fatal());
    }

    #[test]
    fn partial_and_ignorable_classes() {
        let partial = CoreError::PartialFailure {
            operation: "register_counters".into(),
            failed: 2,
        };
        assert_eq!(partial.class(), ErrorClass::Partial);
        assert_eq!(
            CoreError::MalformedCounterPath("bad".into()).class(),
            ErrorClass::Ignorable
        );
    }

    #[test]
    fn auth_message_mentions_authentication() {
        let err = CoreError::Auth("HTTP 401".into());
        assert!(err.to_string().contains("인증"));
    }
}
