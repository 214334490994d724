//! 세션 코디네이터.
//!
//! 원격 수집 세션의 상태 머신 (Closed → Open → Closed).
//! 세션 핸들, 호스트 레지스트리, 샘플 처리기를 소유하며
//! 감독 루프만 `&mut self`로 호출하므로 원격 호출은 항상 순차적이다.

use chrono::Utc;
use perfmon_core::catalog;
use perfmon_core::config::MetricsConfig;
use perfmon_core::error::CoreError;
use perfmon_core::models::host::placeholder_description;
use perfmon_core::models::metric::SeriesDescriptor;
use perfmon_core::models::operation::SoapOperation;
use perfmon_core::models::session::Session;
use perfmon_core::models::status::ClientStatus;
use perfmon_core::ports::metrics_sink::MetricsSink;
use perfmon_core::ports::transport::PerfmonTransport;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::processor::{ProcessReport, SampleProcessor};
use crate::protocol;
use crate::registry::HostCounterRegistry;

/// 세션 코디네이터
pub struct SessionCoordinator {
    transport: Arc<dyn PerfmonTransport>,
    sink: Arc<dyn MetricsSink>,
    status: Arc<ClientStatus>,
    metrics: MetricsConfig,
    session: Session,
    hosts: Vec<HostCounterRegistry>,
    processor: SampleProcessor,
}

impl SessionCoordinator {
    pub fn new(
        transport: Arc<dyn PerfmonTransport>,
        sink: Arc<dyn MetricsSink>,
        status: Arc<ClientStatus>,
        metrics: MetricsConfig,
        hosts: &[String],
    ) -> Self {
        let processor = SampleProcessor::new(metrics.clone(), sink.clone());
        Self {
            transport,
            sink,
            status,
            metrics,
            session: Session::default(),
            hosts: hosts.iter().map(HostCounterRegistry::new).collect(),
            processor,
        }
    }

    /// 열린 세션 여부
    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// 현재 세션 핸들
    pub fn session_handle(&self) -> Option<&str> {
        self.session.handle()
    }

    /// 호스트 레지스트리 목록
    pub fn hosts(&self) -> &[HostCounterRegistry] {
        &self.hosts
    }

    /// 탐색된 카운터가 하나라도 있는지 여부
    pub fn has_counters(&self) -> bool {
        self.hosts.iter().any(|h| h.host().has_counters())
    }

    /// 모든 호스트의 카운터 탐색 + 설명 조회
    ///
    /// 호스트별 실패는 모아서 `PartialFailure`로 반환한다. 치명 에러는 즉시 반환.
    pub async fn list_all_counters(&mut self) -> Result<(), CoreError> {
        let mut failed = 0;
        for registry in self.hosts.iter_mut() {
            let result = match registry
                .discover(self.transport.as_ref(), &self.metrics)
                .await
            {
                Ok(()) => registry.resolve_descriptions(self.transport.as_ref()).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(host = %registry.name(), "카운터 목록 조회 실패: {}", e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(CoreError::PartialFailure {
                operation: "카운터 목록 조회".to_string(),
                failed,
            });
        }
        Ok(())
    }

    /// 세션 열기. 실패하면 상태를 바꾸지 않는다.
    pub async fn open_session(&mut self) -> Result<(), CoreError> {
        let body = self
            .transport
            .send(SoapOperation::OpenSession, &protocol::open_session_request())
            .await?;
        let handle = protocol::parse_open_session(&body)?;

        self.session.open(handle);
        self.transport.reset_pacing();
        self.status.set_session_open(true);
        info!(session = ?self.session.handle(), "PerfMon 세션 열림");
        Ok(())
    }

    /// 모든 호스트의 카운터를 세션에 등록. 세션이 닫혀 있으면 아무것도 하지 않는다.
    pub async fn register_counters(&mut self) -> Result<(), CoreError> {
        let Some(handle) = self.session.handle().map(str::to_string) else {
            debug!("세션이 닫혀 있어 카운터 등록 생략");
            return Ok(());
        };

        let mut failed = 0;
        for registry in &self.hosts {
            let paths = registry.counter_paths();
            if paths.is_empty() {
                debug!(host = %registry.name(), "등록할 카운터 없음");
                continue;
            }

            match self
                .transport
                .send(
                    SoapOperation::AddCounter,
                    &protocol::add_counter_request(&handle, &paths),
                )
                .await
            {
                Ok(_) => debug!(host = %registry.name(), counters = paths.len(), "카운터 등록"),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(host = %registry.name(), session = %handle, "카운터 등록 실패: {}", e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(CoreError::PartialFailure {
                operation: "카운터 등록".to_string(),
                failed,
            });
        }
        info!(session = %handle, "모든 호스트 카운터 등록 완료");
        Ok(())
    }

    /// 활성 카운터마다 시계열을 (재)생성한다
    ///
    /// 도움말은 호스트 중 처음 찾은 설명, 없으면 대체 문구.
    pub fn initialize_metrics(&self) {
        let series: Vec<SeriesDescriptor> = catalog::all()
            .iter()
            .filter(|spec| catalog::enabled(&self.metrics, spec.name))
            .map(|spec| {
                let help = self
                    .hosts
                    .iter()
                    .find_map(|h| h.description_of(spec.name))
                    .map(str::to_string)
                    .unwrap_or_else(|| placeholder_description(spec.name));
                SeriesDescriptor::from_spec(spec, help)
            })
            .collect();
        let hosts: Vec<String> = self.hosts.iter().map(|h| h.name().to_string()).collect();

        self.sink.initialize(&series, &hosts);
        info!(series = series.len(), hosts = hosts.len(), "메트릭 초기화");
    }

    /// 한 번 수집. 세션이 닫혀 있으면 원격 호출 없이 `NoSession`.
    pub async fn collect_once(&mut self) -> Result<ProcessReport, CoreError> {
        let Some(handle) = self.session.handle().map(str::to_string) else {
            return Err(CoreError::NoSession);
        };

        let body = self
            .transport
            .send(
                SoapOperation::CollectSessionData,
                &protocol::collect_request(&handle),
            )
            .await?;
        let samples = protocol::parse_collect(&body)?;

        let report = self.processor.process(&samples);
        self.status.mark_collected(Utc::now());
        debug!(
            session = %handle,
            samples = samples.len(),
            levels = report.level_updates,
            events = report.event_updates,
            malformed = report.malformed,
            regressions = report.regressions,
            non_finite = report.non_finite,
            "수집 완료"
        );
        Ok(report)
    }

    /// 세션 닫기 (best-effort). 원격 에러는 로그만 남긴다.
    pub async fn close_session(&mut self) {
        let Some(handle) = self.session.handle().map(str::to_string) else {
            return;
        };

        if let Err(e) = self
            .transport
            .send(
                SoapOperation::CloseSession,
                &protocol::close_session_request(&handle),
            )
            .await
        {
            warn!(session = %handle, "세션 닫기 실패: {}", e);
        }

        self.session.clear();
        self.processor.reset();
        self.sink.reset();
        self.status.set_session_open(false);
        info!(session = %handle, "PerfMon 세션 닫힘");
    }
}
