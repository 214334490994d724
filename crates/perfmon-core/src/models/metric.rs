//! 노출 시계열 정의.

use serde::{Deserialize, Serialize};

use crate::catalog::{self, CounterSpec};

/// 시계열 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// 마지막 관측값으로 덮어쓰는 게이지
    Level,
    /// 원시 값 차이를 더하는 단조 증가 카운터
    Event,
}

impl MetricKind {
    /// 카운터 이름으로 종류 결정
    pub fn of(counter: &str) -> Self {
        if catalog::is_event_counter(counter) {
            MetricKind::Event
        } else {
            MetricKind::Level
        }
    }
}

/// 메트릭 싱크에 등록할 시계열 패밀리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDescriptor {
    /// PerfMon 카운터 이름
    pub counter: String,
    /// 노출 메트릭 이름
    pub metric_name: String,
    /// 도움말 (원격 설명 또는 대체 문구)
    pub help: String,
    pub kind: MetricKind,
}

impl SeriesDescriptor {
    pub fn from_spec(spec: &CounterSpec, help: impl Into<String>) -> Self {
        Self {
            counter: spec.name.to_string(),
            metric_name: spec.metric_name.to_string(),
            help: help.into(),
            kind: MetricKind::of(spec.name),
        }
    }
}
