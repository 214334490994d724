//! 샘플 처리기.
//!
//! 수집된 원시 값을 레벨(게이지)과 이벤트(누적 카운터) 시계열로 나눠
//! 메트릭 싱크에 전달한다. 이벤트 카운터는 (서버, 카운터)별 직전 원시 값을
//! 기준으로 차이만 더한다.

use perfmon_core::catalog;
use perfmon_core::config::MetricsConfig;
use perfmon_core::models::metric::MetricKind;
use perfmon_core::models::sample::{CounterPath, Sample};
use perfmon_core::ports::metrics_sink::MetricsSink;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// 한 배치 처리 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// 갱신한 레벨 시계열 수
    pub level_updates: usize,
    /// 증가시킨 이벤트 시계열 수
    pub event_updates: usize,
    /// 경로 형식이 잘못되어 버린 샘플 수
    pub malformed: usize,
    /// 비활성 카운터라 무시한 샘플 수
    pub ignored: usize,
    /// 원시 값이 줄어 버린 이벤트 샘플 수
    pub regressions: usize,
    /// 값이 유한한 숫자가 아니라 버린 샘플 수 (NaN, 무한대)
    pub non_finite: usize,
}

/// 샘플 처리기
pub struct SampleProcessor {
    metrics: MetricsConfig,
    sink: Arc<dyn MetricsSink>,
    /// (서버, 카운터) → 직전 원시 값
    baselines: HashMap<(String, String), f64>,
}

impl SampleProcessor {
    pub fn new(metrics: MetricsConfig, sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            metrics,
            sink,
            baselines: HashMap::new(),
        }
    }

    /// 배치 처리. 개별 샘플 문제는 건너뛰고 집계만 한다.
    pub fn process(&mut self, samples: &[Sample]) -> ProcessReport {
        let mut report = ProcessReport::default();

        for sample in samples {
            let path = match CounterPath::parse(&sample.name) {
                Ok(path) => path,
                Err(e) => {
                    debug!("샘플 폐기: {}", e);
                    report.malformed += 1;
                    continue;
                }
            };

            if !catalog::enabled(&self.metrics, &path.counter) {
                trace!(host = %path.server, counter = %path.counter, "비활성 카운터 무시");
                report.ignored += 1;
                continue;
            }

            if !sample.value.is_finite() {
                warn!(
                    host = %path.server,
                    counter = %path.counter,
                    value = sample.value,
                    "유한하지 않은 샘플 값, 폐기"
                );
                report.non_finite += 1;
                continue;
            }

            match MetricKind::of(&path.counter) {
                MetricKind::Level => {
                    self.sink.set_level(&path.counter, &path.server, sample.value);
                    report.level_updates += 1;
                }
                MetricKind::Event => {
                    let key = (path.server.clone(), path.counter.clone());
                    let last = self.baselines.get(&key).copied().unwrap_or(0.0);
                    let delta = sample.value - last;
                    if delta < 0.0 {
                        // 기준값은 그대로 둔다. 원격 리셋 뒤에는 누적값이 덜 잡힌다.
                        warn!(
                            host = %path.server,
                            counter = %path.counter,
                            last,
                            value = sample.value,
                            "이벤트 카운터 값 감소, 샘플 폐기"
                        );
                        report.regressions += 1;
                        continue;
                    }
                    self.sink.add_event(&path.counter, &path.server, delta);
                    self.baselines.insert(key, sample.value);
                    report.event_updates += 1;
                }
            }
        }

        report
    }

    /// 이벤트 기준값 조회
    pub fn baseline(&self, server: &str, counter: &str) -> Option<f64> {
        self.baselines
            .get(&(server.to_string(), counter.to_string()))
            .copied()
    }

    /// 모든 기준값 초기화 (세션 종료 시)
    pub fn reset(&mut self) {
        self.baselines.clear();
    }
}
