//! # perfmon-network
//!
//! PerfMon SOAP 서비스 네트워크 어댑터.
//! `PerfmonTransport` 포트를 reqwest 기반 HTTPS 클라이언트로 구현하고,
//! 원격 API의 비공개 요청 한도를 넘지 않도록 요청 간격을 조절한다.

pub mod http_client;
pub mod rate_governor;
pub mod soap;

pub use http_client::SoapHttpClient;
pub use rate_governor::{Clock, ManualClock, RateGovernor, SystemClock};
