//! 모니터링 감독 루프.
//!
//! 시작 시 카운터 탐색 → 세션 열기 → 카운터 등록 → 메트릭 초기화 후
//! 주기적으로 수집한다. 일시 에러는 세션을 닫고 쿨다운 후 재연결하며,
//! 치명 에러는 세션을 닫고 루프를 끝낸다.

use perfmon_core::config::MonitorConfig;
use perfmon_core::error::CoreError;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::coordinator::SessionCoordinator;

/// 라운드 사이 최소 대기
const MIN_ROUND_DELAY: Duration = Duration::from_secs(1);

/// 감독 루프 설정
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// 수집 주기
    pub poll_interval: Duration,
    /// 세션이 끊긴 뒤 재연결 전 대기
    pub reconnect_delay: Duration,
    /// 세션이 닫혀 있을 때 다음 라운드까지 대기
    pub closed_retry_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(10),
            closed_retry_delay: Duration::from_secs(60),
        }
    }
}

impl From<&MonitorConfig> for SupervisorConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.interval_secs),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            closed_retry_delay: Duration::from_secs(config.closed_retry_secs),
        }
    }
}

/// 모니터링 감독자
pub struct Supervisor {
    config: SupervisorConfig,
    coordinator: SessionCoordinator,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, coordinator: SessionCoordinator) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    /// 종료 신호를 받거나 치명 에러가 날 때까지 실행
    pub async fn run(&mut self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), CoreError> {
        info!(
            "감독 루프 시작: 수집={}s, 재연결={}s, 닫힘 재시도={}s",
            self.config.poll_interval.as_secs(),
            self.config.reconnect_delay.as_secs(),
            self.config.closed_retry_delay.as_secs()
        );

        if let Err(e) = self.startup().await {
            error!("기동 실패: {}", e);
            self.coordinator.close_session().await;
            return Err(e);
        }

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            let round_start = Instant::now();

            if let Err(e) = self.round(&mut shutdown_rx).await {
                error!("치명 에러로 감독 루프 종료: {}", e);
                self.coordinator.close_session().await;
                return Err(e);
            }

            let wait = if self.coordinator.is_open() {
                self.config
                    .poll_interval
                    .saturating_sub(round_start.elapsed())
                    .max(MIN_ROUND_DELAY)
            } else {
                self.config.closed_retry_delay
            };
            debug!("다음 라운드까지 {:?} 대기", wait);
            if pause(wait, &mut shutdown_rx).await {
                break;
            }
        }

        info!("종료 신호 수신, 세션 닫는 중");
        self.coordinator.close_session().await;
        Ok(())
    }

    /// 카운터 탐색 후 첫 세션 연결. 실패하면 기동 중단.
    async fn startup(&mut self) -> Result<(), CoreError> {
        match self.coordinator.list_all_counters().await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!("카운터 정보 일부 조회 실패: {}", e),
        }

        if !self.coordinator.has_counters() {
            return Err(CoreError::Config(
                "모니터링할 카운터를 하나도 찾지 못했습니다".to_string(),
            ));
        }

        self.connect().await
    }

    /// 세션 열기 + 카운터 등록 + 메트릭 초기화
    async fn connect(&mut self) -> Result<(), CoreError> {
        self.coordinator.open_session().await?;
        match self.coordinator.register_counters().await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!("카운터 등록 일부 실패: {}", e),
        }
        self.coordinator.initialize_metrics();
        Ok(())
    }

    /// 한 라운드. 치명 에러만 반환한다.
    async fn round(&mut self, shutdown_rx: &mut watch::Receiver<bool>) -> Result<(), CoreError> {
        if !self.coordinator.is_open() {
            info!("세션 없음, {:?} 후 재연결", self.config.reconnect_delay);
            if pause(self.config.reconnect_delay, shutdown_rx).await {
                return Ok(());
            }
            return match self.connect().await {
                Err(e) if e.is_fatal() => Err(e),
                Err(e) => {
                    warn!("재연결 실패: {}", e);
                    self.coordinator.close_session().await;
                    Ok(())
                }
                Ok(()) => Ok(()),
            };
        }

        match self.coordinator.collect_once().await {
            Ok(_) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("수집 실패, 세션 닫음: {}", e);
                self.coordinator.close_session().await;
                Ok(())
            }
        }
    }
}

/// 지정 시간 대기. 종료 신호가 오면 true.
async fn pause(duration: Duration, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
    let closed = tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        changed = shutdown_rx.changed() => changed.is_err(),
    };
    closed || *shutdown_rx.borrow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        collect_body, description_body, list_counter_body, open_session_body, FakeTransport,
        RecordingSink,
    };
    use assert_matches::assert_matches;
    use perfmon_core::config::MetricsConfig;
    use perfmon_core::models::operation::SoapOperation;
    use perfmon_core::models::status::ClientStatus;
    use std::sync::Arc;

    fn supervisor(transport: Arc<FakeTransport>) -> Supervisor {
        let coordinator = SessionCoordinator::new(
            transport,
            Arc::new(RecordingSink::default()),
            Arc::new(ClientStatus::new()),
            MetricsConfig::default(),
            &["cucm1".to_string()],
        );
        Supervisor::new(SupervisorConfig::default(), coordinator)
    }

    fn healthy_transport() -> Arc<FakeTransport> {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(
            SoapOperation::ListCounter,
            list_counter_body(&[("Cisco CallManager", false, &["CallsActive"])]),
        );
        transport.respond(SoapOperation::QueryCounterDescription, description_body("d"));
        transport.respond(SoapOperation::OpenSession, open_session_body("{S}"));
        transport.respond(SoapOperation::AddCounter, "");
        transport.respond(
            SoapOperation::CollectSessionData,
            collect_body(&[(r"\\cucm1\Cisco CallManager\CallsActive", 1.0)]),
        );
        transport.respond(SoapOperation::CloseSession, "");
        transport
    }

    #[test]
    fn config_from_monitor_section() {
        let monitor = MonitorConfig {
            interval_secs: 45,
            ..Default::default()
        };
        let config = SupervisorConfig::from(&monitor);
        assert_eq!(config.poll_interval, Duration::from_secs(45));
        assert_eq!(config.reconnect_delay, Duration::from_secs(10));
        assert_eq!(config.closed_retry_delay, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_discovery_aborts_startup() {
        let transport = Arc::new(FakeTransport::new());
        transport.push(SoapOperation::ListCounter, Err(CoreError::Auth("HTTP 401".into())));
        let (_tx, rx) = watch::channel(false);

        let err = supervisor(transport.clone()).run(rx).await.unwrap_err();
        assert_matches!(err, CoreError::Auth(_));
        assert_eq!(transport.count(SoapOperation::OpenSession), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn no_counters_aborts_startup() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond(SoapOperation::ListCounter, list_counter_body(&[]));
        let (_tx, rx) = watch::channel(false);

        let err = supervisor(transport.clone()).run(rx).await.unwrap_err();
        assert_matches!(err, CoreError::Config(_));
        assert_eq!(transport.count(SoapOperation::OpenSession), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_first_open_aborts_startup() {
        let transport = healthy_transport();
        transport.push(
            SoapOperation::OpenSession,
            Err(CoreError::Network("refused".into())),
        );
        let (_tx, rx) = watch::channel(false);

        let err = supervisor(transport.clone()).run(rx).await.unwrap_err();
        assert_matches!(err, CoreError::Network(_));
        assert_eq!(transport.count(SoapOperation::CollectSessionData), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_first_registration_closes_opened_session() {
        let transport = healthy_transport();
        transport.push(SoapOperation::AddCounter, Err(CoreError::Auth("HTTP 401".into())));
        let (_tx, rx) = watch::channel(false);
        let mut supervisor = supervisor(transport.clone());

        let err = supervisor.run(rx).await.unwrap_err();
        assert_matches!(err, CoreError::Auth(_));
        assert!(!supervisor.coordinator().is_open());
        assert_eq!(transport.count(SoapOperation::OpenSession), 1);
        assert_eq!(transport.count(SoapOperation::CloseSession), 1);
        assert_eq!(transport.count(SoapOperation::CollectSessionData), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn collects_every_interval_until_shutdown() {
        let transport = healthy_transport();
        let (tx, rx) = watch::channel(false);
        let mut supervisor = supervisor(transport.clone());
        let handle = tokio::spawn(async move { supervisor.run(rx).await });

        tokio::time::sleep(Duration::from_secs(95)).await;
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        // t = 0, 30, 60, 90
        assert_eq!(transport.count(SoapOperation::CollectSessionData), 4);
        assert_eq!(transport.count(SoapOperation::OpenSession), 1);
        assert_eq!(transport.count(SoapOperation::CloseSession), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_collect_failure_reconnects() {
        let transport = healthy_transport();
        transport.push(
            SoapOperation::CollectSessionData,
            Err(CoreError::Network("timeout".into())),
        );
        let (tx, rx) = watch::channel(false);
        let mut supervisor = supervisor(transport.clone());
        let handle = tokio::spawn(async move { supervisor.run(rx).await });

        // 0s 실패 → 60s 대기 → 10s 쿨다운 후 70s 재연결 → 90s 수집
        tokio::time::sleep(Duration::from_secs(105)).await;
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(transport.count(SoapOperation::OpenSession), 2);
        assert_eq!(transport.count(SoapOperation::AddCounter), 2);
        assert_eq!(transport.count(SoapOperation::CollectSessionData), 2);
        assert_eq!(transport.count(SoapOperation::CloseSession), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_collect_failure_ends_loop() {
        let transport = healthy_transport();
        transport.push(
            SoapOperation::CollectSessionData,
            Err(CoreError::RateLimit("RateControl".into())),
        );
        let (_tx, rx) = watch::channel(false);
        let mut supervisor = supervisor(transport.clone());

        let err = supervisor.run(rx).await.unwrap_err();
        assert_matches!(err, CoreError::RateLimit(_));
        assert!(!supervisor.coordinator().is_open());
        assert_eq!(transport.count(SoapOperation::CloseSession), 1);
        assert_eq!(transport.count(SoapOperation::OpenSession), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_sleep() {
        let transport = healthy_transport();
        let (tx, rx) = watch::channel(false);
        let mut supervisor = supervisor(transport.clone());
        let handle = tokio::spawn(async move { supervisor.run(rx).await });

        tokio::time::sleep(Duration::from_secs(5)).await;
        let sent_at = Instant::now();
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        assert!(sent_at.elapsed() < Duration::from_secs(1));
        assert_eq!(transport.count(SoapOperation::CollectSessionData), 1);
        assert_eq!(transport.count(SoapOperation::CloseSession), 1);
    }
}
