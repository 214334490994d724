//! PerfMon 오퍼레이션 페이로드.
//!
//! 요청 본문(봉투 안쪽 XML) 생성과 응답 Body 디코딩.
//! 응답 요소 이름은 네임스페이스 접두사와 무관하게 로컬 이름으로 비교한다.

use perfmon_core::error::CoreError;
use perfmon_core::models::host::{CounterDetail, CounterGroup};
use perfmon_core::models::sample::Sample;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

// ============================================================
// 요청
// ============================================================

/// `perfmonOpenSession`
pub fn open_session_request() -> String {
    "<soap:perfmonOpenSession/>".to_string()
}

/// `perfmonAddCounter`: 세션에 카운터 경로 일괄 추가
pub fn add_counter_request(handle: &str, paths: &[String]) -> String {
    let mut counters = String::new();
    for path in paths {
        counters.push_str("<soap:Counter><soap:Name>");
        counters.push_str(&escape(path.as_str()));
        counters.push_str("</soap:Name></soap:Counter>");
    }
    format!(
        "<soap:perfmonAddCounter><soap:SessionHandle>{}</soap:SessionHandle><soap:ArrayOfCounter>{}</soap:ArrayOfCounter></soap:perfmonAddCounter>",
        escape(handle),
        counters
    )
}

/// `perfmonCollectSessionData`
pub fn collect_request(handle: &str) -> String {
    format!(
        "<soap:perfmonCollectSessionData><soap:SessionHandle>{}</soap:SessionHandle></soap:perfmonCollectSessionData>",
        escape(handle)
    )
}

/// `perfmonCloseSession`
pub fn close_session_request(handle: &str) -> String {
    format!(
        "<soap:perfmonCloseSession><soap:SessionHandle>{}</soap:SessionHandle></soap:perfmonCloseSession>",
        escape(handle)
    )
}

/// `perfmonListCounter`: 호스트의 전체 카운터 카탈로그
pub fn list_counter_request(host: &str) -> String {
    format!(
        "<soap:perfmonListCounter>\r\n<soap:Host>{}</soap:Host>\r\n</soap:perfmonListCounter>",
        escape(host)
    )
}

/// `perfmonQueryCounterDescription`
pub fn counter_description_request(path: &str) -> String {
    format!(
        "<soap:perfmonQueryCounterDescription>\r\n<soap:Counter>{}</soap:Counter>\r\n</soap:perfmonQueryCounterDescription>",
        escape(path)
    )
}

// ============================================================
// 응답
// ============================================================

/// 디코딩된 XML 요소 (로컬 이름, 텍스트, 자식)
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        if self.name == name {
            out.push(self);
            return;
        }
        for child in &self.children {
            child.collect_named(name, out);
        }
    }
}

fn decode_error(operation: &str, detail: impl std::fmt::Display) -> CoreError {
    CoreError::Decode(format!("{} 응답 해석 실패: {}", operation, detail))
}

/// Body 내부 XML을 요소 트리로 읽는다 (최상위 요소 목록)
fn parse_elements(operation: &str, xml: &str) -> Result<Vec<Element>, CoreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut roots = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Element {
                name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                ..Default::default()
            }),
            Ok(Event::Empty(e)) => {
                let element = Element {
                    name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                    ..Default::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| decode_error(operation, "짝이 없는 닫는 태그"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(current) = stack.last_mut() {
                    let text = t.unescape().map_err(|e| decode_error(operation, e))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(decode_error(operation, e)),
        }
    }

    if !stack.is_empty() {
        return Err(decode_error(operation, "닫히지 않은 요소"));
    }
    Ok(roots)
}

fn find_all<'a>(roots: &'a [Element], name: &str) -> Vec<&'a Element> {
    let mut out = Vec::new();
    for root in roots {
        root.collect_named(name, &mut out);
    }
    out
}

/// `perfmonOpenSession` 응답에서 세션 핸들 추출. 빈 핸들은 에러.
pub fn parse_open_session(body: &str) -> Result<String, CoreError> {
    const OP: &str = "perfmonOpenSession";
    let roots = parse_elements(OP, body)?;
    let handle = find_all(&roots, "perfmonOpenSessionReturn")
        .first()
        .map(|e| e.text.trim().to_string())
        .unwrap_or_default();
    if handle.is_empty() {
        return Err(decode_error(OP, "세션 핸들이 비어 있습니다"));
    }
    Ok(handle)
}

/// `perfmonListCounter` 응답을 그룹 목록으로 변환 (필터링 전 원본)
pub fn parse_list_counter(body: &str) -> Result<Vec<CounterGroup>, CoreError> {
    let roots = parse_elements("perfmonListCounter", body)?;
    let groups = find_all(&roots, "perfmonListCounterReturn")
        .into_iter()
        .map(|ret| {
            let counters = ret
                .child("ArrayOfCounter")
                .map(|array| {
                    array
                        .children
                        .iter()
                        .filter(|item| item.name == "item")
                        .filter_map(|item| item.child_text("Name"))
                        .filter(|name| !name.is_empty())
                        .map(CounterDetail::new)
                        .collect()
                })
                .unwrap_or_default();
            CounterGroup {
                name: ret.child_text("Name").unwrap_or_default().to_string(),
                multi_instance: ret
                    .child_text("MultiInstance")
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
                counters,
            }
        })
        .collect();
    Ok(groups)
}

/// `perfmonQueryCounterDescription` 응답의 설명 문자열 (없으면 빈 문자열)
pub fn parse_counter_description(body: &str) -> Result<String, CoreError> {
    let roots = parse_elements("perfmonQueryCounterDescription", body)?;
    Ok(find_all(&roots, "perfmonQueryCounterDescriptionReturn")
        .first()
        .map(|e| e.text.trim().to_string())
        .unwrap_or_default())
}

/// `perfmonCollectSessionData` 응답의 샘플 배치
///
/// 숫자가 아닌 값이 하나라도 있으면 배치 전체를 디코딩 에러로 본다.
pub fn parse_collect(body: &str) -> Result<Vec<Sample>, CoreError> {
    const OP: &str = "perfmonCollectSessionData";
    let roots = parse_elements(OP, body)?;
    find_all(&roots, "perfmonCollectSessionDataReturn")
        .into_iter()
        .map(|ret| {
            let name = ret.child_text("Name").unwrap_or_default();
            let raw = ret.child_text("Value").unwrap_or_default();
            let value: f64 = raw
                .parse()
                .map_err(|_| decode_error(OP, format!("{}의 값 {:?}", name, raw)))?;
            Ok(Sample {
                name: name.to_string(),
                value,
                status: ret.child_text("CStatus").unwrap_or_default().to_string(),
            })
        })
        .collect()
}
