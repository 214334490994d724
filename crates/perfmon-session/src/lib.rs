//! # perfmon-session
//!
//! PerfMon 수집 세션 엔진.
//!
//! - [`protocol`]: 오퍼레이션 요청 본문과 응답 디코딩
//! - [`registry`]: 호스트별 카운터 탐색과 설명 조회
//! - [`coordinator`]: 세션 상태 머신 (열기, 등록, 수집, 닫기)
//! - [`processor`]: 원시 값 → 레벨/이벤트 시계열 변환
//! - [`supervisor`]: 주기 수집, 재연결, 종료 처리

pub mod coordinator;
pub mod processor;
pub mod protocol;
pub mod registry;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::SessionCoordinator;
pub use processor::{ProcessReport, SampleProcessor};
pub use registry::HostCounterRegistry;
pub use supervisor::{Supervisor, SupervisorConfig};
