//! SOAP 봉투 / Body 추출 / 폴트 디코딩.

use perfmon_core::error::CoreError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

/// 원격 rate limit 위반을 나타내는 폴트 문자열 표식
pub const RATE_CONTROL_SENTINEL: &str = "RateControl";

/// 한도 초과 시 faultstring 문구
const RATE_EXCEEDED_MESSAGE: &str = "Exceeded allowed rate";

const ENVELOPE_HEAD: &str = "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\" xmlns:soap=\"http://schemas.cisco.com/ast/soap\">\r\n<soapenv:Header/>\r\n<soapenv:Body>\r\n";
const ENVELOPE_TAIL: &str = "\r\n</soapenv:Body>\r\n</soapenv:Envelope>";

/// 오퍼레이션 본문을 SOAP 봉투로 감싼다
pub fn envelope(inner: &str) -> String {
    let mut out = String::with_capacity(ENVELOPE_HEAD.len() + inner.len() + ENVELOPE_TAIL.len());
    out.push_str(ENVELOPE_HEAD);
    out.push_str(inner);
    out.push_str(ENVELOPE_TAIL);
    out
}

/// SOAP 폴트
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Fault {
    #[serde(rename = "faultcode", default)]
    pub code: String,
    #[serde(rename = "faultstring", default)]
    pub message: String,
}

fn missing_body() -> CoreError {
    CoreError::Decode("응답에 <soapenv:Body> 요소가 없습니다".to_string())
}

/// 응답 봉투에서 `Envelope` 바로 아래 `Body` 요소의 내부 XML만 잘라낸다
/// (네임스페이스 접두사 무관). 주석, CDATA, 페이로드 안의 `Body`는 무시한다.
pub fn extract_body(xml: &str) -> Result<&str, CoreError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut in_envelope = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let is_body = e.local_name().as_ref() == b"Body";
                match depth {
                    1 => in_envelope = e.local_name().as_ref() == b"Envelope",
                    2 if in_envelope && is_body => {
                        let end = e.to_end().into_owned();
                        let span = reader.read_to_end(end.name()).map_err(|_| missing_body())?;
                        return Ok(&xml[span.start as usize..span.end as usize]);
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if depth == 1 && in_envelope && e.local_name().as_ref() == b"Body" {
                    return Ok("");
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) | Err(_) => return Err(missing_body()),
            Ok(_) => {}
        }
    }
}

/// 에러 응답에서 폴트를 읽는다. 형식이 맞지 않으면 None.
pub fn parse_fault(xml: &str) -> Option<Fault> {
    let body = extract_body(xml).unwrap_or(xml).trim();
    quick_xml::de::from_str::<Fault>(body).ok()
}

/// 응답 본문이 원격 rate limit 위반을 나타내는지 여부
pub fn is_rate_control(text: &str) -> bool {
    text.contains(RATE_CONTROL_SENTINEL) || text.contains(RATE_EXCEEDED_MESSAGE)
}
