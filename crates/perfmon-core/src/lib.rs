//! # perfmon-core
//!
//! CUCM PerfMon 익스포터의 도메인 모델, 카운터 카탈로그, 포트(trait), 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`catalog`]: 지원 카운터 카탈로그 (허용 그룹, 기본 활성화, 이벤트 판별)
//! - [`models`]: 호스트/카운터 그룹/세션/샘플/상태 도메인 구조체
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror) 및 에러 분류
//! - [`config`]: 애플리케이션 설정 구조체와 유효성 검증
//! - [`config_manager`]: 설정 파일/환경변수/CLI 오버라이드 병합 로드

pub mod catalog;
pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;

/// 원격 API에 보내는 User-Agent 및 `/version`에 쓰이는 프로그램 이름
pub const PROGRAM_NAME: &str = "cucm-perfmon-exporter";

#[cfg(test)]
mod tests {
    use crate::catalog;
    use crate::config::AppConfig;

    #[test]
    fn config_defaults() {
        let config = AppConfig::default_config();
        assert_eq!(config.web.port, 9717);
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.monitor.interval_secs, 30);
        assert!(!config.api.ignore_certificate);
        assert!(!config.web.allow_stop);
    }

    #[test]
    fn default_enabled_counters_are_catalogued() {
        let config = AppConfig::default_config();
        let enabled: Vec<&str> = catalog::all()
            .iter()
            .filter(|spec| catalog::enabled(&config.metrics, spec.name))
            .map(|spec| spec.name)
            .collect();
        assert_eq!(enabled.len(), 10);
        assert!(enabled.contains(&"CallsActive"));
        assert!(enabled.contains(&"PhoneSessionsFailed"));
    }
}
