//! PerfMon 도메인 모델.
//!
//! 모니터링 호스트, 카운터 그룹, 세션, 샘플, 노출 시계열, 클라이언트 상태를 정의한다.

pub mod host;
pub mod metric;
pub mod operation;
pub mod sample;
pub mod session;
pub mod status;
