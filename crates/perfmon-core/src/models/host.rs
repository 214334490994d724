//! 모니터링 호스트와 카운터 그룹 모델.

use serde::{Deserialize, Serialize};

/// 설명 조회에 실패한 카운터에 쓰는 대체 설명
pub fn placeholder_description(counter: &str) -> String {
    format!("Description for {} not exists", counter)
}

/// PerfMon 카운터 경로 `\\host\group\counter`
pub fn counter_path(host: &str, group: &str, counter: &str) -> String {
    format!("\\\\{}\\{}\\{}", host, group, counter)
}

/// 개별 카운터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterDetail {
    /// 카운터 이름 (예: "CallsActive")
    pub name: String,
    /// 원격에서 조회한 설명 (조회 전에는 빈 문자열)
    #[serde(default)]
    pub description: String,
}

impl CounterDetail {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    /// 설명이 채워졌는지 여부
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// PerfMon 카운터 그룹 (오브젝트)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterGroup {
    /// 그룹 이름 (예: "Cisco CallManager")
    pub name: String,
    /// 멀티 인스턴스 그룹 여부 (지원하지 않으며 감지만 한다)
    pub multi_instance: bool,
    /// 등록 대상 카운터
    pub counters: Vec<CounterDetail>,
}

/// 모니터링 대상 호스트 (클러스터 노드)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredHost {
    /// 호스트 이름 (식별자, 생성 후 불변)
    name: String,
    /// 탐색된 카운터 그룹
    pub groups: Vec<CounterGroup>,
}

impl MonitoredHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 탐색된 카운터가 하나라도 있는지 여부
    pub fn has_counters(&self) -> bool {
        self.groups.iter().any(|g| !g.counters.is_empty())
    }

    /// 탐색된 카운터 수
    pub fn counter_count(&self) -> usize {
        self.groups.iter().map(|g| g.counters.len()).sum()
    }

    /// 이름으로 카운터 조회 (첫 번째 일치 그룹)
    pub fn find_counter(&self, counter: &str) -> Option<&CounterDetail> {
        self.groups
            .iter()
            .flat_map(|g| g.counters.iter())
            .find(|c| c.name == counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_format() {
        assert_eq!(
            counter_path("cucm1", "Cisco CallManager", "CallsActive"),
            r"\\cucm1\Cisco CallManager\CallsActive"
        );
    }

    #[test]
    fn host_counter_helpers() {
        let mut host = MonitoredHost::new("cucm1");
        assert!(!host.has_counters());

        host.groups.push(CounterGroup {
            name: "Cisco CallManager".to_string(),
            multi_instance: false,
            counters: vec![CounterDetail::new("CallsActive"), CounterDetail::new("CallsCompleted")],
        });
        assert!(host.has_counters());
        assert_eq!(host.counter_count(), 2);
        assert!(host.find_counter("CallsCompleted").is_some());
        assert!(host.find_counter("CallsAttempted").is_none());
    }

    #[test]
    fn placeholder_text() {
        assert_eq!(
            placeholder_description("CallsActive"),
            "Description for CallsActive not exists"
        );
    }
}
