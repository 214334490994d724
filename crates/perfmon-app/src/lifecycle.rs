//! 라이프사이클 관리.
//!
//! 종료 신호 팬아웃. OS 시그널과 `/stop` 요청이 같은 채널로 모인다.

use tokio::sync::watch;
use tracing::{error, info};

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호 발송. 여러 번 호출해도 된다.
    pub fn shutdown(&self) {
        if *self.shutdown_rx.borrow() {
            return;
        }
        info!("종료 신호 발송");
        let _ = self.shutdown_tx.send(true);
    }

    /// 종료 신호가 이미 발송됐는지 여부
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// OS 시그널 대기 (SIGINT, SIGTERM). 핸들러 등록에 실패하면 신호 없이 반환한다.
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let handlers = signal(SignalKind::interrupt())
                .and_then(|sigint| signal(SignalKind::terminate()).map(|sigterm| (sigint, sigterm)));
            let (mut sigint, mut sigterm) = match handlers {
                Ok(handlers) => handlers,
                Err(e) => {
                    error!("시그널 핸들러 등록 실패: {}", e);
                    return;
                }
            };

            tokio::select! {
                _ = sigint.recv() => {
                    info!("SIGINT 수신");
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM 수신");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Ctrl+C 핸들러 등록 실패: {}", e);
                return;
            }
            info!("Ctrl+C 수신");
        }

        self.shutdown();
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_creation() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        assert!(!*rx.borrow());
        assert!(!lm.is_shutting_down());
    }

    #[test]
    fn shutdown_signal() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        lm.shutdown();
        assert!(*rx.borrow());
        assert!(lm.is_shutting_down());
    }

    #[tokio::test]
    async fn subscribers_wake_on_shutdown() {
        let lm = LifecycleManager::new();
        let mut rx = lm.subscribe();
        let waiter = tokio::spawn(async move {
            rx.changed().await.unwrap();
            *rx.borrow()
        });

        lm.shutdown();
        lm.shutdown();
        assert!(waiter.await.unwrap());
    }
}
