use serde::Serialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
enum Inner {
    Closed { consecutive_failures: u32 },
    Open { until: Instant },
    HalfOpen,
}

/// Guards whole dispatch cycles. `failure_threshold` consecutive failed cycles open the
/// circuit for `cooldown`; afterwards exactly one trial cycle decides whether it closes or
/// opens again.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            inner: Mutex::new(Inner::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    pub async fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now()).await
    }

    pub async fn try_acquire_at(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock().await;
        match *inner {
            Inner::Closed { .. } => true,
            Inner::Open { until } if now >= until => {
                info!("Circuit half-open, allowing a trial cycle");
                *inner = Inner::HalfOpen;
                true
            }
            Inner::Open { .. } => false,
            // The trial cycle is still running.
            Inner::HalfOpen => false,
        }
    }

    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        if matches!(*inner, Inner::HalfOpen) {
            info!("Circuit closed after a successful trial cycle");
        }
        *inner = Inner::Closed {
            consecutive_failures: 0,
        };
    }

    pub async fn record_failure(&self) {
        self.record_failure_at(Instant::now()).await
    }

    pub async fn record_failure_at(&self, now: Instant) {
        let mut inner = self.inner.lock().await;
        match *inner {
            Inner::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures + 1;
                if failures >= self.failure_threshold {
                    warn!(
                        failures,
                        cooldown_ms = self.cooldown.as_millis() as u64,
                        "Circuit opened"
                    );
                    *inner = Inner::Open {
                        until: now + self.cooldown,
                    };
                } else {
                    *inner = Inner::Closed {
                        consecutive_failures: failures,
                    };
                }
            }
            Inner::HalfOpen => {
                warn!(
                    cooldown_ms = self.cooldown.as_millis() as u64,
                    "Trial cycle failed, circuit re-opened"
                );
                *inner = Inner::Open {
                    until: now + self.cooldown,
                };
            }
            Inner::Open { .. } => {}
        }
    }

    pub async fn state(&self) -> CircuitState {
        match *self.inner.lock().await {
            Inner::Closed { .. } => CircuitState::Closed,
            Inner::Open { .. } => CircuitState::Open,
            Inner::HalfOpen => CircuitState::HalfOpen,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30))
    }
}

#[cfg(test)]
mod circuit_breaker_tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn before_each() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_secs(10))
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_open_after_consecutive_failures(before_each: CircuitBreaker) {
        let breaker = before_each;
        let now = Instant::now();
        breaker.record_failure_at(now).await;
        breaker.record_failure_at(now).await;
        assert!(breaker.try_acquire_at(now).await);

        breaker.record_failure_at(now).await;

        assert_eq!(breaker.state().await, CircuitState::Open);
        assert!(!breaker.try_acquire_at(now + Duration::from_secs(9)).await);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reset_the_count_on_success(before_each: CircuitBreaker) {
        let breaker = before_each;
        let now = Instant::now();
        breaker.record_failure_at(now).await;
        breaker.record_failure_at(now).await;
        breaker.record_success().await;
        breaker.record_failure_at(now).await;
        breaker.record_failure_at(now).await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_allow_a_single_trial_after_the_cooldown(before_each: CircuitBreaker) {
        let breaker = before_each;
        let now = Instant::now();
        for _ in 0..3 {
            breaker.record_failure_at(now).await;
        }
        let later = now + Duration::from_secs(10);

        assert!(breaker.try_acquire_at(later).await);
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);
        assert!(!breaker.try_acquire_at(later).await);

        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reopen_when_the_trial_fails(before_each: CircuitBreaker) {
        let breaker = before_each;
        let now = Instant::now();
        for _ in 0..3 {
            breaker.record_failure_at(now).await;
        }
        let later = now + Duration::from_secs(10);
        assert!(breaker.try_acquire_at(later).await);

        breaker.record_failure_at(later).await;

        assert_eq!(breaker.state().await, CircuitState::Open);
        assert!(!breaker.try_acquire_at(later + Duration::from_secs(5)).await);
        assert!(breaker.try_acquire_at(later + Duration::from_secs(10)).await);
    }
}
