//! 테스트용 가짜 트랜스포트와 기록용 메트릭 싱크.

use async_trait::async_trait;
use parking_lot::Mutex;
use perfmon_core::error::CoreError;
use perfmon_core::models::metric::SeriesDescriptor;
use perfmon_core::models::operation::SoapOperation;
use perfmon_core::ports::metrics_sink::MetricsSink;
use perfmon_core::ports::transport::PerfmonTransport;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

type Responder = Box<dyn Fn(&str) -> Result<String, CoreError> + Send + Sync>;

/// 오퍼레이션별로 응답을 지정하는 트랜스포트
///
/// `push`로 넣은 일회성 응답이 `respond_with` 기본 응답보다 먼저 쓰인다.
#[derive(Default)]
pub struct FakeTransport {
    queued: Mutex<HashMap<SoapOperation, VecDeque<Result<String, CoreError>>>>,
    responders: Mutex<HashMap<SoapOperation, Responder>>,
    calls: Mutex<Vec<(SoapOperation, String)>>,
    pacing_resets: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 항상 같은 본문으로 응답
    pub fn respond(&self, operation: SoapOperation, body: impl Into<String>) {
        let body = body.into();
        self.respond_with(operation, move |_| Ok(body.clone()));
    }

    /// 요청 본문에 따라 응답
    pub fn respond_with<F>(&self, operation: SoapOperation, f: F)
    where
        F: Fn(&str) -> Result<String, CoreError> + Send + Sync + 'static,
    {
        self.responders.lock().insert(operation, Box::new(f));
    }

    /// 일회성 응답 추가
    pub fn push(&self, operation: SoapOperation, reply: Result<String, CoreError>) {
        self.queued
            .lock()
            .entry(operation)
            .or_default()
            .push_back(reply);
    }

    /// 전체 호출 기록
    pub fn calls(&self) -> Vec<(SoapOperation, String)> {
        self.calls.lock().clone()
    }

    /// 특정 오퍼레이션 호출 수
    pub fn count(&self, operation: SoapOperation) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    pub fn pacing_resets(&self) -> usize {
        self.pacing_resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PerfmonTransport for FakeTransport {
    async fn send(&self, operation: SoapOperation, body: &str) -> Result<String, CoreError> {
        self.calls.lock().push((operation, body.to_string()));
        if let Some(reply) = self
            .queued
            .lock()
            .get_mut(&operation)
            .and_then(|q| q.pop_front())
        {
            return reply;
        }
        match self.responders.lock().get(&operation) {
            Some(f) => f(body),
            None => Err(CoreError::Network(format!("{} 응답 없음", operation))),
        }
    }

    fn reset_pacing(&self) {
        self.pacing_resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// 싱크 호출 기록
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Initialize(Vec<SeriesDescriptor>, Vec<String>),
    Level(String, String, f64),
    Event(String, String, f64),
    Reset,
}

/// 호출을 그대로 기록하는 메트릭 싱크
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    /// 특정 이벤트 시계열에 더해진 값들
    pub fn event_deltas(&self, counter: &str, host: &str) -> Vec<f64> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SinkCall::Event(c, h, delta) if c == counter && h == host => Some(*delta),
                _ => None,
            })
            .collect()
    }

    pub fn resets(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, SinkCall::Reset))
            .count()
    }

    /// 마지막 초기화 호출의 시계열 목록
    pub fn last_series(&self) -> Option<Vec<SeriesDescriptor>> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            SinkCall::Initialize(series, _) => Some(series.clone()),
            _ => None,
        })
    }
}

impl MetricsSink for RecordingSink {
    fn initialize(&self, series: &[SeriesDescriptor], hosts: &[String]) {
        self.calls
            .lock()
            .push(SinkCall::Initialize(series.to_vec(), hosts.to_vec()));
    }

    fn set_level(&self, counter: &str, host: &str, value: f64) {
        self.calls
            .lock()
            .push(SinkCall::Level(counter.into(), host.into(), value));
    }

    fn add_event(&self, counter: &str, host: &str, delta: f64) {
        self.calls
            .lock()
            .push(SinkCall::Event(counter.into(), host.into(), delta));
    }

    fn reset(&self) {
        self.calls.lock().push(SinkCall::Reset);
    }
}

// ============================================================
// 응답 본문
// ============================================================

pub fn open_session_body(handle: &str) -> String {
    format!(
        "<ns1:perfmonOpenSessionResponse xmlns:ns1=\"http://schemas.cisco.com/ast/soap\"><ns1:perfmonOpenSessionReturn>{}</ns1:perfmonOpenSessionReturn></ns1:perfmonOpenSessionResponse>",
        handle
    )
}

/// (그룹, 멀티 인스턴스, 카운터들)
pub fn list_counter_body(groups: &[(&str, bool, &[&str])]) -> String {
    let mut out = String::from("<ns1:perfmonListCounterResponse xmlns:ns1=\"http://schemas.cisco.com/ast/soap\">");
    for (name, multi, counters) in groups {
        out.push_str(&format!(
            "<ns1:perfmonListCounterReturn><ns1:Name>{}</ns1:Name><ns1:MultiInstance>{}</ns1:MultiInstance><ns1:ArrayOfCounter>",
            name, multi
        ));
        for counter in counters.iter() {
            out.push_str(&format!("<ns1:item><ns1:Name>{}</ns1:Name></ns1:item>", counter));
        }
        out.push_str("</ns1:ArrayOfCounter></ns1:perfmonListCounterReturn>");
    }
    out.push_str("</ns1:perfmonListCounterResponse>");
    out
}

pub fn description_body(text: &str) -> String {
    format!(
        "<ns1:perfmonQueryCounterDescriptionResponse><ns1:perfmonQueryCounterDescriptionReturn>{}</ns1:perfmonQueryCounterDescriptionReturn></ns1:perfmonQueryCounterDescriptionResponse>",
        text
    )
}

/// (계층 이름, 값)
pub fn collect_body(samples: &[(&str, f64)]) -> String {
    let mut out = String::from("<ns1:perfmonCollectSessionDataResponse>");
    for (name, value) in samples {
        out.push_str(&format!(
            "<ns1:perfmonCollectSessionDataReturn><ns1:Name>{}</ns1:Name><ns1:Value>{}</ns1:Value><ns1:CStatus>1</ns1:CStatus></ns1:perfmonCollectSessionDataReturn>",
            name, value
        ));
    }
    out.push_str("</ns1:perfmonCollectSessionDataResponse>");
    out
}
