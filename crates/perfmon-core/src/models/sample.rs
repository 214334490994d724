//! 수집 샘플 모델.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// `perfmonCollectSessionData` 응답의 개별 값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 계층 이름 `\\server\group\counter`
    pub name: String,
    /// 원시 값
    pub value: f64,
    /// 원격 CStatus (보관만 한다)
    #[serde(default)]
    pub status: String,
}

impl Sample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            status: String::new(),
        }
    }
}

/// 분해된 카운터 경로
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterPath {
    pub server: String,
    pub group: String,
    pub counter: String,
}

impl CounterPath {
    /// 앞뒤 역슬래시를 제거하고 정확히 세 부분으로 나눈다
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        let parts: Vec<&str> = name.trim_matches('\\').split('\\').collect();
        match parts.as_slice() {
            [server, group, counter] => Ok(Self {
                server: (*server).to_string(),
                group: (*group).to_string(),
                counter: (*counter).to_string(),
            }),
            _ => Err(CoreError::MalformedCounterPath(name.to_string())),
        }
    }
}

impl fmt::Display for CounterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\\\{}\\{}\\{}", self.server, self.group, self.counter)
    }
}
