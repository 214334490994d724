//! 요청 속도 조절기.
//!
//! PerfMon API는 분당 요청 수를 넘으면 `RateControl` 폴트로 세션을 거부한다.
//! 모든 원격 요청 직전에 [`RateGovernor::delay`]를 호출해 필요한 대기 시간을 얻는다.
//!
//! 규칙 (창 안의 요청 수 `n`, 창 시작 후 경과 `t`):
//! - `n < 50`: `t > 1.5s * n`이면 창을 새로 시작하고 1ms, 아니면 1.2s
//! - `n >= 50`: `60.2s - t`만큼 대기 (`t > 60s`면 1ms) 후 창을 새로 시작
//!
//! 어느 경우든 호출 뒤 요청 수가 1 증가한다.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 창 안에서 허용하는 요청 수
pub const REQUEST_LIMIT: u32 = 50;

/// 기본 요청 간격
pub const STANDARD_DELAY: Duration = Duration::from_millis(1_200);

/// 창 재시작 판단에 쓰는 요청당 간격
pub const TEST_DELAY: Duration = Duration::from_millis(1_500);

/// 한도 도달 시 창 시작부터 기다리는 시간
pub const BASE_WAIT: Duration = Duration::from_millis(60_200);

/// 창 전체 길이
pub const FULL_WINDOW: Duration = Duration::from_secs(60);

/// 사실상 대기 없음
pub const MIN_DELAY: Duration = Duration::from_millis(1);

/// 시간 소스
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// 단조 시스템 시계
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 수동 시계 (테스트, 시뮬레이션)
///
/// `auto_advance`가 0이 아니면 `now()`를 읽을 때마다 그만큼 시간이 흐른다.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
    auto_advance: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::with_auto_advance(Duration::ZERO)
    }

    pub fn with_auto_advance(step: Duration) -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            auto_advance: step,
        }
    }

    /// 시간 진행
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    /// 생성 이후 흐른 시간
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let mut offset = self.offset.lock();
        let now = self.base + *offset;
        *offset += self.auto_advance;
        now
    }
}

/// 요청 회계 창
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub start: Instant,
    pub requests: u32,
}

/// 요청 속도 조절기. 모든 원격 요청이 하나의 인스턴스를 공유한다.
pub struct RateGovernor {
    clock: Arc<dyn Clock>,
    window: Mutex<RateWindow>,
}

impl RateGovernor {
    /// 시스템 시계로 생성
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 지정한 시계로 생성
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let start = clock.now();
        Self {
            clock,
            window: Mutex::new(RateWindow { start, requests: 0 }),
        }
    }

    /// 다음 요청 전에 기다릴 시간을 계산하고 요청 수를 1 늘린다
    pub fn delay(&self) -> Duration {
        let now = self.clock.now();
        let mut window = self.window.lock();
        let elapsed = now.saturating_duration_since(window.start);

        let wait = if window.requests < REQUEST_LIMIT {
            if elapsed > TEST_DELAY * window.requests {
                *window = RateWindow {
                    start: now,
                    requests: 0,
                };
                MIN_DELAY
            } else {
                STANDARD_DELAY
            }
        } else {
            let wait = if elapsed > FULL_WINDOW {
                MIN_DELAY
            } else {
                BASE_WAIT.saturating_sub(elapsed)
            };
            *window = RateWindow {
                start: now,
                requests: 0,
            };
            wait
        };

        window.requests += 1;
        wait
    }

    /// 창 초기화 (새 세션을 열 때)
    pub fn reset(&self) {
        let now = self.clock.now();
        *self.window.lock() = RateWindow {
            start: now,
            requests: 0,
        };
    }

    /// 현재 창 상태
    pub fn snapshot(&self) -> RateWindow {
        *self.window.lock()
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn governor() -> (Arc<ManualClock>, RateGovernor) {
        let clock = Arc::new(ManualClock::new());
        let governor = RateGovernor::with_clock(clock.clone());
        (clock, governor)
    }

    #[test]
    fn first_request_after_idle_is_immediate() {
        let (clock, governor) = governor();
        clock.advance(Duration::from_millis(10));
        assert_eq!(governor.delay(), MIN_DELAY);
        assert_eq!(governor.snapshot().requests, 1);
    }

    #[test]
    fn back_to_back_requests_are_paced() {
        let (clock, governor) = governor();
        clock.advance(Duration::from_millis(10));
        assert_eq!(governor.delay(), MIN_DELAY);
        assert_eq!(governor.delay(), STANDARD_DELAY);
        assert_eq!(governor.delay(), STANDARD_DELAY);
        assert_eq!(governor.snapshot().requests, 3);
    }

    #[test]
    fn slow_requests_restart_window() {
        let (clock, governor) = governor();
        clock.advance(Duration::from_millis(10));
        governor.delay();
        clock.advance(Duration::from_secs(2));
        assert_eq!(governor.delay(), MIN_DELAY);
        assert_eq!(governor.snapshot().requests, 1);
    }

    #[test]
    fn full_window_waits_for_remainder() {
        let (clock, governor) = governor();
        clock.advance(Duration::from_millis(10));
        assert_eq!(governor.delay(), MIN_DELAY);
        for _ in 1..REQUEST_LIMIT {
            clock.advance(STANDARD_DELAY);
            assert_eq!(governor.delay(), STANDARD_DELAY);
        }
        assert_eq!(governor.snapshot().requests, REQUEST_LIMIT);

        // 49 * 1.2s = 58.8s 경과 → 60.2s - 58.8s
        assert_eq!(governor.delay(), Duration::from_millis(1_400));
        assert_eq!(governor.snapshot().requests, 1);
    }

    #[test]
    fn full_window_after_a_minute_is_immediate() {
        let (clock, governor) = governor();
        clock.advance(Duration::from_millis(10));
        governor.delay();
        for _ in 1..REQUEST_LIMIT {
            governor.delay();
        }
        clock.advance(Duration::from_secs(61));
        assert_eq!(governor.delay(), MIN_DELAY);
        assert_eq!(governor.snapshot().requests, 1);
    }

    #[test]
    fn reset_zeroes_window() {
        let (clock, governor) = governor();
        clock.advance(Duration::from_millis(10));
        governor.delay();
        governor.delay();
        governor.reset();
        let window = governor.snapshot();
        assert_eq!(window.requests, 0);
        assert_eq!(window.start, clock.now());
    }

    #[test]
    fn auto_advancing_clock_never_paces() {
        let clock = Arc::new(ManualClock::with_auto_advance(Duration::from_secs(10)));
        let governor = RateGovernor::with_clock(clock);
        for _ in 0..200 {
            assert_eq!(governor.delay(), MIN_DELAY);
        }
    }

    proptest! {
        /// 호출 사이 처리 시간이 임의여도 창 안 요청 수는 한도를 넘지 않고,
        /// 한도에 도달한 창의 다음 요청은 창 시작 후 60초 이전에 나가지 않는다.
        #[test]
        fn governed_requests_stay_under_limit(gaps in prop::collection::vec(0u64..4_000, 1..400)) {
            let (clock, governor) = governor();
            clock.advance(Duration::from_millis(1));

            for gap in gaps {
                clock.advance(Duration::from_millis(gap));
                let before = governor.snapshot();
                let wait = governor.delay();
                let after = governor.snapshot();

                prop_assert!(wait <= BASE_WAIT);
                prop_assert!(after.requests >= 1);
                prop_assert!(after.requests <= REQUEST_LIMIT);

                let sent_at = clock.now() + wait;
                if before.requests >= REQUEST_LIMIT {
                    prop_assert!(sent_at.duration_since(before.start) >= FULL_WINDOW);
                }
                if after.requests > 1 {
                    prop_assert_eq!(after.start, before.start);
                }

                // 호출자는 대기한 뒤 요청을 보낸다
                clock.advance(wait);
            }
        }
    }
}
