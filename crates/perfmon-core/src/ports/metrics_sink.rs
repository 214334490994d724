//! 메트릭 싱크 포트.
//!
//! 구현: `perfmon-web` crate (prometheus)

use crate::models::metric::SeriesDescriptor;

/// 수집 값이 흘러가는 시계열 저장소
pub trait MetricsSink: Send + Sync {
    /// 시계열 패밀리를 (재)생성한다. 레벨 시계열은 호스트마다 0으로 초기화한다.
    fn initialize(&self, series: &[SeriesDescriptor], hosts: &[String]);

    /// 레벨 카운터 현재 값 설정
    fn set_level(&self, counter: &str, host: &str, value: f64);

    /// 이벤트 카운터 증가 (delta >= 0)
    fn add_event(&self, counter: &str, host: &str, delta: f64);

    /// 모든 시계열 제거
    fn reset(&self);
}
