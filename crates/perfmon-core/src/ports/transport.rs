//! PerfMon 트랜스포트 포트.
//!
//! 구현: `perfmon-network` crate (reqwest, SOAP 봉투, 요청 속도 조절)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::operation::SoapOperation;

/// SOAP-over-HTTPS 트랜스포트
#[async_trait]
pub trait PerfmonTransport: Send + Sync {
    /// 오퍼레이션 본문(inner XML)을 봉투에 담아 전송하고 응답 Body 내부 XML을 반환한다.
    ///
    /// 401과 원격 rate limit 폴트는 치명 에러(`CoreError::Auth`, `CoreError::RateLimit`)로 반환한다.
    async fn send(&self, operation: SoapOperation, body: &str) -> Result<String, CoreError>;

    /// 요청 속도 조절 창 초기화 (새 세션을 열 때 호출)
    fn reset_pacing(&self);
}
