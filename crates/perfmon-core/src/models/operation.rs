//! PerfMon SOAP 오퍼레이션.

use std::fmt;

/// 원격 PerfMon 서비스 오퍼레이션
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoapOperation {
    OpenSession,
    AddCounter,
    CollectSessionData,
    CloseSession,
    ListCounter,
    QueryCounterDescription,
}

impl SoapOperation {
    /// SOAP 요소 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            SoapOperation::OpenSession => "perfmonOpenSession",
            SoapOperation::AddCounter => "perfmonAddCounter",
            SoapOperation::CollectSessionData => "perfmonCollectSessionData",
            SoapOperation::CloseSession => "perfmonCloseSession",
            SoapOperation::ListCounter => "perfmonListCounter",
            SoapOperation::QueryCounterDescription => "perfmonQueryCounterDescription",
        }
    }
}

impl fmt::Display for SoapOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
