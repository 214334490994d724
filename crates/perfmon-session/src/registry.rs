//! 호스트별 카운터 레지스트리.
//!
//! 원격 카운터 카탈로그에서 허용 그룹 + 지원 + 활성 카운터만 골라 보관하고,
//! 카운터별 설명을 채운다.

use perfmon_core::catalog;
use perfmon_core::config::MetricsConfig;
use perfmon_core::error::CoreError;
use perfmon_core::models::host::{counter_path, CounterGroup, MonitoredHost};
use perfmon_core::models::operation::SoapOperation;
use perfmon_core::ports::transport::PerfmonTransport;
use tracing::{debug, info, warn};

use crate::protocol;

/// 한 클러스터 노드의 카운터 목록
#[derive(Debug, Clone)]
pub struct HostCounterRegistry {
    host: MonitoredHost,
}

impl HostCounterRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            host: MonitoredHost::new(name),
        }
    }

    pub fn name(&self) -> &str {
        self.host.name()
    }

    pub fn host(&self) -> &MonitoredHost {
        &self.host
    }

    /// 원격 카탈로그에서 카운터 탐색. 이미 카운터가 있으면 아무것도 하지 않는다.
    pub async fn discover(
        &mut self,
        transport: &dyn PerfmonTransport,
        metrics: &MetricsConfig,
    ) -> Result<(), CoreError> {
        if self.host.has_counters() {
            debug!(host = %self.name(), "카운터 목록 이미 있음");
            return Ok(());
        }

        let body = transport
            .send(
                SoapOperation::ListCounter,
                &protocol::list_counter_request(self.name()),
            )
            .await?;
        let listed = protocol::parse_list_counter(&body)?;

        self.host.groups = listed
            .into_iter()
            .filter(|group| catalog::is_allowed_group(&group.name))
            .filter_map(|mut group| {
                group.counters.retain(|c| {
                    catalog::is_supported(&c.name) && catalog::enabled(metrics, &c.name)
                });
                (!group.counters.is_empty()).then_some(group)
            })
            .collect();

        info!(
            host = %self.name(),
            groups = self.host.groups.len(),
            counters = self.host.counter_count(),
            "카운터 탐색 완료"
        );
        Ok(())
    }

    /// 카운터 설명 조회
    ///
    /// 멀티 인스턴스 그룹은 건너뛴다. 개별 실패는 세어 두었다가
    /// `PartialFailure`로 한 번에 반환하고, 치명 에러는 즉시 반환한다.
    pub async fn resolve_descriptions(
        &mut self,
        transport: &dyn PerfmonTransport,
    ) -> Result<(), CoreError> {
        let host = self.host.name().to_string();
        let mut failed = 0;

        for group in self.host.groups.iter_mut() {
            if group.multi_instance {
                warn!(host = %host, group = %group.name, "멀티 인스턴스 그룹은 지원하지 않음");
                continue;
            }

            for counter in group.counters.iter_mut() {
                let path = counter_path(&host, &group.name, &counter.name);
                let result = match transport
                    .send(
                        SoapOperation::QueryCounterDescription,
                        &protocol::counter_description_request(&path),
                    )
                    .await
                {
                    Ok(body) => protocol::parse_counter_description(&body),
                    Err(e) => Err(e),
                };

                match result {
                    Ok(description) => counter.description = description,
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(host = %host, counter = %path, "설명 조회 실패: {}", e);
                        failed += 1;
                    }
                }
            }
        }

        if failed > 0 {
            return Err(CoreError::PartialFailure {
                operation: format!("{} 카운터 설명 조회", host),
                failed,
            });
        }
        Ok(())
    }

    /// 카운터 경로 `\\<host>\<group>\<counter>`
    pub fn path_for(&self, group: &CounterGroup, counter: &str) -> String {
        counter_path(self.name(), &group.name, counter)
    }

    /// 세션에 등록할 전체 카운터 경로
    pub fn counter_paths(&self) -> Vec<String> {
        self.host
            .groups
            .iter()
            .flat_map(|group| {
                group
                    .counters
                    .iter()
                    .map(move |c| self.path_for(group, &c.name))
            })
            .collect()
    }

    /// 조회된 설명 (비어 있으면 None)
    pub fn description_of(&self, counter: &str) -> Option<&str> {
        self.host
            .find_counter(counter)
            .filter(|c| c.has_description())
            .map(|c| c.description.as_str())
    }
}
