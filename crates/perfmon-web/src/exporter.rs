//! Prometheus 익스포터: `MetricsSink` 포트 구현.
//!
//! 활성 카운터마다 `server` 라벨을 가진 패밀리 하나를 전용 레지스트리에 등록한다.
//! 레벨 카운터는 `GaugeVec`, 이벤트 카운터는 `CounterVec`.

use parking_lot::Mutex;
use perfmon_core::models::metric::{MetricKind, SeriesDescriptor};
use perfmon_core::ports::metrics_sink::MetricsSink;
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::ApiError;

/// 시계열 라벨
const SERVER_LABEL: &str = "server";

#[derive(Default)]
struct Families {
    levels: HashMap<String, GaugeVec>,
    events: HashMap<String, CounterVec>,
}

/// Prometheus 익스포터
pub struct PrometheusExporter {
    registry: Registry,
    families: Mutex<Families>,
}

impl PrometheusExporter {
    /// 새 익스포터. `process_collector`가 true면 프로세스 메트릭도 노출한다 (Linux).
    pub fn new(process_collector: bool) -> Self {
        let registry = Registry::new();
        if process_collector {
            register_process_collector(&registry);
        }
        Self {
            registry,
            families: Mutex::new(Families::default()),
        }
    }

    /// 텍스트 노출 포맷 Content-Type
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    /// 현재 값을 텍스트 노출 포맷으로 렌더링
    pub fn render(&self) -> Result<String, ApiError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| ApiError::Internal(format!("메트릭 인코딩 실패: {}", e)))?;
        String::from_utf8(buffer).map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// 등록된 카운터 패밀리 수
    pub fn family_count(&self) -> usize {
        let families = self.families.lock();
        families.levels.len() + families.events.len()
    }

    fn unregister_all(&self, families: &mut Families) {
        for (_, vec) in families.levels.drain() {
            if let Err(e) = self.registry.unregister(Box::new(vec)) {
                warn!("게이지 해제 실패: {}", e);
            }
        }
        for (_, vec) in families.events.drain() {
            if let Err(e) = self.registry.unregister(Box::new(vec)) {
                warn!("카운터 해제 실패: {}", e);
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn register_process_collector(registry: &Registry) {
    let collector = prometheus::process_collector::ProcessCollector::for_self();
    if let Err(e) = registry.register(Box::new(collector)) {
        warn!("프로세스 메트릭 등록 실패: {}", e);
    }
}

#[cfg(not(target_os = "linux"))]
fn register_process_collector(_registry: &Registry) {
    debug!("프로세스 메트릭은 Linux에서만 지원");
}

fn opts(series: &SeriesDescriptor) -> Opts {
    let help = if series.help.trim().is_empty() {
        series.counter.clone()
    } else {
        series.help.clone()
    };
    Opts::new(series.metric_name.clone(), help)
}

impl MetricsSink for PrometheusExporter {
    fn initialize(&self, series: &[SeriesDescriptor], hosts: &[String]) {
        let mut families = self.families.lock();
        self.unregister_all(&mut families);

        for descriptor in series {
            let registered = match descriptor.kind {
                MetricKind::Level => GaugeVec::new(opts(descriptor), &[SERVER_LABEL])
                    .and_then(|vec| {
                        self.registry.register(Box::new(vec.clone()))?;
                        for host in hosts {
                            vec.with_label_values(&[host.as_str()]).set(0.0);
                        }
                        families.levels.insert(descriptor.counter.clone(), vec);
                        Ok(())
                    }),
                MetricKind::Event => CounterVec::new(opts(descriptor), &[SERVER_LABEL])
                    .and_then(|vec| {
                        self.registry.register(Box::new(vec.clone()))?;
                        families.events.insert(descriptor.counter.clone(), vec);
                        Ok(())
                    }),
            };
            if let Err(e) = registered {
                warn!(metric = %descriptor.metric_name, "메트릭 등록 실패: {}", e);
            }
        }

        info!(
            levels = families.levels.len(),
            events = families.events.len(),
            "메트릭 패밀리 등록"
        );
    }

    fn set_level(&self, counter: &str, host: &str, value: f64) {
        match self.families.lock().levels.get(counter) {
            Some(vec) => vec.with_label_values(&[host]).set(value),
            None => debug!(counter, "등록되지 않은 게이지"),
        }
    }

    fn add_event(&self, counter: &str, host: &str, delta: f64) {
        // CounterVec::inc_by는 음수나 NaN이면 패닉
        if !delta.is_finite() || delta < 0.0 {
            debug!(counter, host, delta, "증가분 무시");
            return;
        }
        match self.families.lock().events.get(counter) {
            Some(vec) => vec.with_label_values(&[host]).inc_by(delta),
            None => debug!(counter, "등록되지 않은 카운터"),
        }
    }

    fn reset(&self) {
        let mut families = self.families.lock();
        self.unregister_all(&mut families);
        debug!("메트릭 패밀리 전체 해제");
    }
}
