//! 로깅 초기화.
//!
//! 콘솔 + (선택) 롤링 파일. `RUST_LOG`가 있으면 설정 레벨보다 우선한다.

use perfmon_core::config::LogConfig;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 기본 로그 파일 이름
const DEFAULT_FILE_NAME: &str = "cucm-perfmon-exporter.log";

/// 로깅 초기화. 파일 출력을 쓰면 프로그램이 끝날 때까지 guard를 들고 있어야 한다.
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let console_layer: Option<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>> =
        if config.quiet {
            None
        } else if config.json_format {
            Some(Box::new(fmt::layer().json()))
        } else {
            Some(Box::new(fmt::layer()))
        };

    let (file_layer, guard): (
        Option<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>>,
        Option<WorkerGuard>,
    ) = match config.file.as_deref().map(|path| file_appender(path, &config.rotation)) {
        Some(Ok(appender)) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json_format {
                Box::new(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
            } else {
                Box::new(fmt::layer().with_ansi(false).with_writer(non_blocking))
            };
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("로그 파일을 열 수 없습니다, 콘솔만 사용: {}", e);
            (None, None)
        }
        None => (None, None),
    };

    if let Err(e) = registry.with(console_layer).with(file_layer).try_init() {
        eprintln!("로깅 초기화 실패: {}", e);
    }

    guard
}

fn file_appender(
    path: &Path,
    rotation: &str,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let (dir, prefix) = split_log_path(path);
    RollingFileAppender::builder()
        .rotation(parse_rotation(rotation))
        .filename_prefix(prefix)
        .build(dir)
}

/// 로그 파일 경로 → (디렉터리, 파일 이름 접두사)
fn split_log_path(path: &Path) -> (PathBuf, String) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    (dir, prefix)
}

fn parse_rotation(rotation: &str) -> Rotation {
    match rotation.to_ascii_lowercase().as_str() {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}
