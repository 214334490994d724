//! 애플리케이션 설정 구조체.
//!
//! 원격 PerfMon API 접속 정보, 폴링 주기, 카운터 활성화 플래그, 메트릭 엔드포인트,
//! 로깅 설정을 정의한다. `config` crate를 통해 파일/환경변수에서 로드한다
//! ([`crate::config_manager`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog;
use crate::error::CoreError;

/// 원격 PerfMon 서비스 포트
pub const PERFMON_PORT: u16 = 8443;

/// 원격 PerfMon 서비스 경로
pub const PERFMON_SERVICE_PATH: &str = "/perfmonservice2/services/PerfmonService?wsdl";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 원격 API 접속 설정
    #[serde(default)]
    pub api: ApiConfig,
    /// 모니터링 대상/주기 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 카운터 활성화 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 메트릭 HTTP 엔드포인트 설정
    #[serde(default)]
    pub web: WebConfig,
    /// 로깅 설정
    #[serde(default)]
    pub log: LogConfig,
}

// ============================================================
// 값 범위
// ============================================================

/// 숫자 설정값의 기본값과 허용 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub default: u64,
    pub min: u64,
    pub max: u64,
}

impl Limits {
    /// 범위 안에 있는지 여부 (양 끝 포함)
    pub fn contains(&self, value: u64) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, field: &str, value: u64) -> Result<(), CoreError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(CoreError::Validation {
                field: field.to_string(),
                message: format!("{}은(는) {}..={} 범위여야 합니다", value, self.min, self.max),
            })
        }
    }
}

/// 메트릭 엔드포인트 포트
pub const PORT_LIMITS: Limits = Limits {
    default: 9717,
    min: 1024,
    max: 65535,
};

/// 원격 요청 타임아웃 (초)
pub const API_TIMEOUT_LIMITS: Limits = Limits {
    default: 15,
    min: 1,
    max: 30,
};

/// 수집 주기 (초)
pub const INTERVAL_LIMITS: Limits = Limits {
    default: 30,
    min: 5,
    max: 120,
};

// ============================================================
// 원격 API 설정
// ============================================================

/// 원격 PerfMon API 접속 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// CUCM 서버 FQDN 또는 IP 주소
    #[serde(default)]
    pub address: String,
    /// PerfMon 조회 권한이 있는 사용자
    #[serde(default)]
    pub user: String,
    /// 사용자 비밀번호
    #[serde(default)]
    pub password: String,
    /// TLS 인증서 검증 생략 여부
    #[serde(default)]
    pub ignore_certificate: bool,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            user: String::new(),
            password: String::new(),
            ignore_certificate: false,
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// PerfMon SOAP 서비스 URL
    pub fn endpoint_url(&self) -> String {
        format!(
            "https://{}:{}{}",
            self.address, PERFMON_PORT, PERFMON_SERVICE_PATH
        )
    }
}

// ============================================================
// 모니터링 설정
// ============================================================

/// 모니터링 대상 및 주기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// PerfMon 카운터를 조회할 클러스터 노드 이름
    #[serde(default)]
    pub hosts: Vec<String>,
    /// 수집 주기 (초)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// 세션이 끊긴 뒤 재연결 전 대기 (초)
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    /// 세션이 닫혀 있을 때 다음 라운드까지 대기 (초)
    #[serde(default = "default_closed_retry_secs")]
    pub closed_retry_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            interval_secs: default_interval_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            closed_retry_secs: default_closed_retry_secs(),
        }
    }
}

// ============================================================
// 카운터 활성화 설정
// ============================================================

/// 카운터 활성화 설정
///
/// `counters`에 없는 카운터는 카탈로그 기본값을 따른다.
/// 키는 대소문자를 구분하지 않는다 (설정 로더가 키를 소문자로 바꾼다).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// 카운터 이름 → 활성화 여부
    #[serde(default)]
    pub counters: BTreeMap<String, bool>,
    /// 프로세스 메트릭(CPU, 메모리, fd) 노출 여부
    #[serde(default = "default_true")]
    pub process_collector: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            counters: BTreeMap::new(),
            process_collector: true,
        }
    }
}

impl MetricsConfig {
    /// 설정에 명시된 활성화 값 (대소문자 무시)
    pub fn counter_override(&self, name: &str) -> Option<bool> {
        if let Some(value) = self.counters.get(name) {
            return Some(*value);
        }
        self.counters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }

    fn validate(&self) -> Result<(), CoreError> {
        for key in self.counters.keys() {
            if catalog::lookup_ignore_case(key).is_none() {
                return Err(CoreError::Validation {
                    field: format!("metrics.counters.{}", key),
                    message: "지원하지 않는 카운터".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================
// 메트릭 엔드포인트 설정
// ============================================================

/// 메트릭 HTTP 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// 리슨 포트 (기본: 9717)
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 리슨 주소
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// `/stop` 엔드포인트 허용 여부
    #[serde(default)]
    pub allow_stop: bool,
    /// 종료 시 진행 중 요청을 기다리는 최대 시간 (초)
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            listen_address: default_listen_address(),
            allow_stop: false,
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

// ============================================================
// 로깅 설정
// ============================================================

/// 로깅 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 파일 경로 (None이면 파일 로깅 비활성화)
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// JSON 포맷 출력
    #[serde(default)]
    pub json_format: bool,
    /// 파일 회전 주기: "hourly", "daily", "never"
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
    /// 콘솔 출력 끄기 (파일로만 기록)
    #[serde(default)]
    pub quiet: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            json_format: false,
            rotation: default_log_rotation(),
            quiet: false,
        }
    }
}

impl LogConfig {
    fn validate(&self) -> Result<(), CoreError> {
        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(CoreError::Validation {
                field: "log.level".to_string(),
                message: format!("알 수 없는 로그 레벨 {}", self.level),
            });
        }
        if !matches!(self.rotation.as_str(), "hourly" | "daily" | "never") {
            return Err(CoreError::Validation {
                field: "log.rotation".to_string(),
                message: format!("알 수 없는 회전 주기 {}", self.rotation),
            });
        }
        if self.quiet && self.file.is_none() {
            return Err(CoreError::Validation {
                field: "log.quiet".to_string(),
                message: "quiet 모드에는 log.file 지정이 필요합니다".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환 (접속 정보는 비어 있어 검증을 통과하지 못한다)
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig::default(),
            monitor: MonitorConfig::default(),
            metrics: MetricsConfig::default(),
            web: WebConfig::default(),
            log: LogConfig::default(),
        }
    }

    /// 전체 설정 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if !is_valid_server_address(&self.api.address) {
            return Err(CoreError::Validation {
                field: "api.address".to_string(),
                message: "유효한 FQDN 또는 IP 주소가 아닙니다".to_string(),
            });
        }
        if self.api.user.is_empty() {
            return Err(CoreError::Validation {
                field: "api.user".to_string(),
                message: "API 사용자가 지정되지 않았습니다".to_string(),
            });
        }
        if self.api.password.is_empty() {
            return Err(CoreError::Validation {
                field: "api.password".to_string(),
                message: "API 비밀번호가 지정되지 않았습니다".to_string(),
            });
        }
        API_TIMEOUT_LIMITS.check("api.timeout_secs", self.api.timeout_secs)?;
        INTERVAL_LIMITS.check("monitor.interval_secs", self.monitor.interval_secs)?;
        PORT_LIMITS.check("web.port", u64::from(self.web.port))?;

        if self.monitor.hosts.is_empty() {
            return Err(CoreError::Validation {
                field: "monitor.hosts".to_string(),
                message: "모니터링 대상 호스트가 하나 이상 필요합니다".to_string(),
            });
        }
        if let Some(host) = self.monitor.hosts.iter().find(|h| h.trim().is_empty()) {
            return Err(CoreError::Validation {
                field: "monitor.hosts".to_string(),
                message: format!("빈 호스트 이름: {:?}", host),
            });
        }

        self.metrics.validate()?;
        self.log.validate()
    }

    /// 원격 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// 수집 주기
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.interval_secs)
    }

    /// 사람이 읽는 설정 요약 (`--config.show`, `/config`). 비밀번호는 가린다.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "API:                  [{}]", self.api.endpoint_url());
        let _ = writeln!(out, "Ignore Certificate:   [{}]", self.api.ignore_certificate);
        let _ = writeln!(out, "User:                 [{}]", self.api.user);
        let _ = writeln!(out, "Password:             [{}]", mask(&self.api.password));
        let _ = writeln!(out, "Servers:              [{}]", self.monitor.hosts.join(", "));
        let _ = writeln!(
            out,
            "Listen:               [{}:{}]",
            self.web.listen_address, self.web.port
        );
        let _ = writeln!(out, "Timeout:              [{}]", self.api.timeout_secs);
        let _ = writeln!(out, "Sleep time:           [{}]", self.monitor.interval_secs);
        let _ = writeln!(out, "Allow stop:           [{}]", self.web.allow_stop);

        let _ = writeln!(out, "Metrics:");
        let width = catalog::all()
            .iter()
            .map(|spec| spec.name.len())
            .max()
            .unwrap_or(0);
        for spec in catalog::all() {
            let _ = writeln!(
                out,
                "\t- {:<width$} [{}]",
                format!("{}:", spec.name),
                catalog::enabled(&self.metrics, spec.name),
                width = width + 1
            );
        }
        let _ = writeln!(
            out,
            "\t- {:<width$} [{}]",
            "ProcessCollector:",
            self.metrics.process_collector,
            width = width + 1
        );

        let _ = writeln!(out, "Log:");
        let _ = writeln!(out, "\t- Level       [{}]", self.log.level);
        let _ = writeln!(
            out,
            "\t- File        [{}]",
            self.log
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        );
        let _ = writeln!(out, "\t- JSON format [{}]", self.log.json_format);
        let _ = writeln!(out, "\t- Rotation    [{}]", self.log.rotation);
        let _ = writeln!(out, "\t- Quiet       [{}]", self.log.quiet);
        out
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "********"
    }
}

/// IP 주소 또는 DNS 이름 형식인지 확인
pub fn is_valid_server_address(address: &str) -> bool {
    if address.parse::<IpAddr>().is_ok() {
        return true;
    }
    let name = address.strip_suffix('.').unwrap_or(address);
    if name.is_empty() || name.len() > 253 {
        return false;
    }
    // 숫자와 점만으로 된 이름은 잘못된 IPv4로 본다
    if name.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return false;
    }
    name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}
fn default_api_timeout_secs() -> u64 {
    API_TIMEOUT_LIMITS.default
}
fn default_interval_secs() -> u64 {
    INTERVAL_LIMITS.default
}
fn default_reconnect_delay_secs() -> u64 {
    10
}
fn default_closed_retry_secs() -> u64 {
    60
}
fn default_web_port() -> u16 {
    9717
}
fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}
fn default_shutdown_grace_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_rotation() -> String {
    "daily".to_string()
}
