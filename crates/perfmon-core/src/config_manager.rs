//! 설정 로드.
//!
//! 설정 파일(YAML/JSON, 확장자로 판별) → 환경변수(`PERFMON__섹션__키`) →
//! CLI 오버라이드 순으로 병합한 뒤 검증한다.

use crate::config::AppConfig;
use crate::error::CoreError;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 기본 설정 파일 이름
pub const DEFAULT_CONFIG_FILE: &str = "server.yml";

/// 환경변수 접두사
const ENV_PREFIX: &str = "PERFMON";

/// CLI에서 넘어오는 설정 오버라이드. 비어 있지 않은 값만 적용한다.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_address: Option<String>,
    pub api_user: Option<String>,
    pub api_password: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    /// 설정에 오버라이드 적용
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(address) = non_empty(&self.api_address) {
            config.api.address = address.to_string();
        }
        if let Some(user) = non_empty(&self.api_user) {
            config.api.user = user.to_string();
        }
        if let Some(password) = non_empty(&self.api_password) {
            config.api.password = password.to_string();
        }
        if let Some(file) = &self.log_file {
            if !file.as_os_str().is_empty() {
                config.log.file = Some(file.clone());
            }
        }
        if let Some(level) = non_empty(&self.log_level) {
            config.log.level = level.to_string();
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// 설정 관리자
///
/// 로드된 설정을 보관하고 파일에서 다시 읽을 수 있다.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 현재 설정 (스레드 안전)
    config: Arc<RwLock<AppConfig>>,
    /// 설정 파일 경로
    config_path: PathBuf,
    /// 로드 시 적용한 CLI 오버라이드 (reload에도 재적용)
    overrides: ConfigOverrides,
}

impl ConfigManager {
    /// 설정 파일을 로드하고 검증한다
    pub fn load(config_path: impl Into<PathBuf>, overrides: ConfigOverrides) -> Result<Self, CoreError> {
        let config_path = config_path.into();
        let config = Self::load_from_file(&config_path, &overrides)?;
        info!("설정 로드 완료: {}", config_path.display());
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
            overrides,
        })
    }

    /// 현재 설정 반환 (복제본)
    pub fn get(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// 설정 파일 경로 반환
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 설정 다시 로드. 검증에 실패하면 기존 설정을 유지한다.
    pub fn reload(&self) -> Result<(), CoreError> {
        let config = Self::load_from_file(&self.config_path, &self.overrides)?;
        *self.config.write() = config;
        info!("설정 다시 로드 완료");
        Ok(())
    }

    /// 파일 + 환경변수 + 오버라이드 병합 후 검증
    pub fn load_from_file(path: &Path, overrides: &ConfigOverrides) -> Result<AppConfig, CoreError> {
        if !path.exists() {
            return Err(CoreError::Config(format!(
                "설정 파일을 찾을 수 없습니다: {}",
                path.display()
            )));
        }

        let mut config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("monitor.hosts"),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| {
                CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
            })?;

        overrides.apply(&mut config);
        config.validate()?;
        debug!(hosts = config.monitor.hosts.len(), "설정 검증 통과");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    const YAML: &str = r#"
api:
  address: 10.1.1.10
  user: perfmon
  password: secret
  ignore_certificate: true
monitor:
  hosts:
    - cucm-pub
    - cucm-sub1
  interval_secs: 60
metrics:
  counters:
    VideoCallsActive: true
    CallsActive: false
web:
  port: 9800
  allow_stop: true
"#;

    #[test]
    fn load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "server.yml", YAML);

        let manager = ConfigManager::load(&path, ConfigOverrides::default()).unwrap();
        let config = manager.get();
        assert_eq!(config.api.address, "10.1.1.10");
        assert!(config.api.ignore_certificate);
        assert_eq!(config.monitor.hosts, vec!["cucm-pub", "cucm-sub1"]);
        assert_eq!(config.monitor.interval_secs, 60);
        assert_eq!(config.web.port, 9800);
        assert!(config.web.allow_stop);
        assert_eq!(config.api.timeout_secs, 15);
        assert!(crate::catalog::enabled(&config.metrics, "VideoCallsActive"));
        assert!(!crate::catalog::enabled(&config.metrics, "CallsActive"));
        assert!(crate::catalog::enabled(&config.metrics, "CallsCompleted"));
    }

    #[test]
    fn load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "server.json",
            r#"{"api":{"address":"cucm.example.com","user":"u","password":"p"},
                "monitor":{"hosts":["cucm"]}}"#,
        );

        let config = ConfigManager::load(&path, ConfigOverrides::default())
            .unwrap()
            .get();
        assert_eq!(config.api.address, "cucm.example.com");
        assert_eq!(config.web.port, 9717);
    }

    #[test]
    fn cli_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "server.yml", YAML);
        let overrides = ConfigOverrides {
            api_address: Some("cucm-override.example.com".to_string()),
            api_user: Some(String::new()),
            api_password: Some("other".to_string()),
            log_file: Some(PathBuf::from("/var/log/exporter.log")),
            log_level: None,
        };

        let config = ConfigManager::load(&path, overrides).unwrap().get();
        assert_eq!(config.api.address, "cucm-override.example.com");
        assert_eq!(config.api.user, "perfmon");
        assert_eq!(config.api.password, "other");
        assert_eq!(config.log.file, Some(PathBuf::from("/var/log/exporter.log")));
    }

    #[test]
    fn missing_credentials_filled_by_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "server.yml", "monitor:\n  hosts: [cucm]\n");

        let err = ConfigManager::load(&path, ConfigOverrides::default()).unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });

        let overrides = ConfigOverrides {
            api_address: Some("10.0.0.5".to_string()),
            api_user: Some("admin".to_string()),
            api_password: Some("pwd".to_string()),
            ..Default::default()
        };
        assert!(ConfigManager::load(&path, overrides).is_ok());
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigManager::load(dir.path().join("absent.yml"), ConfigOverrides::default())
            .unwrap_err();
        assert_matches!(err, CoreError::Config(_));
    }

    #[test]
    fn invalid_range_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "server.yml",
            "api: {address: cucm, user: u, password: p, timeout_secs: 99}\nmonitor: {hosts: [cucm]}\n",
        );
        let err = ConfigManager::load(&path, ConfigOverrides::default()).unwrap_err();
        assert_matches!(err, CoreError::Validation { field, .. } if field == "api.timeout_secs");
    }

    #[test]
    fn reload_keeps_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "server.yml", YAML);
        let overrides = ConfigOverrides {
            api_password: Some("from-cli".to_string()),
            ..Default::default()
        };
        let manager = ConfigManager::load(&path, overrides).unwrap();

        write_file(&dir, "server.yml", &YAML.replace("interval_secs: 60", "interval_secs: 90"));
        manager.reload().unwrap();
        let config = manager.get();
        assert_eq!(config.monitor.interval_secs, 90);
        assert_eq!(config.api.password, "from-cli");
    }
}
