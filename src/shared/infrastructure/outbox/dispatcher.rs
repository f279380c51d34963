// Polling outbox dispatcher.
//
// Purpose
// - Move pending outbox messages to in-process subscribers, at least once.
//
// Responsibilities
// - One cycle: ask the circuit breaker, claim a batch (oldest first), publish every message
//   in isolation, mark successes processed.
// - Retryable publish failures (handler errors, undecodable payloads, timeouts) are retried
//   inside the cycle with exponential backoff. Exhausted or non-retryable failures bump the message's failure counter; past
//   `dead_letter_after` counted failures the message is dead-lettered, otherwise it is
//   picked up again next cycle.
// - Dispatch-path errors never propagate; they are logged and reflected in the report.
//
// Cycles run with a fixed delay between the end of one and the start of the next.

use crate::shared::infrastructure::event_bus::EventPublisher;
use crate::shared::infrastructure::outbox::circuit_breaker::CircuitBreaker;
use crate::shared::infrastructure::outbox::config::{DeliveryMode, OutboxConfig};
use crate::shared::infrastructure::outbox::retry::RetryPolicy;
use crate::shared::infrastructure::outbox::{OutboxMessage, OutboxStore};
use chrono::Utc;
use futures_util::{StreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub claimed: usize,
    pub processed: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    CircuitOpen,
    ClaimFailed,
    Completed(CycleReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageOutcome {
    Processed,
    Failed,
    DeadLettered,
}

struct PublishFailure {
    retryable: bool,
    reason: String,
}

pub struct OutboxDispatcher<TStore, TPublisher>
where
    TStore: OutboxStore + ?Sized,
    TPublisher: EventPublisher + ?Sized,
{
    store: Arc<TStore>,
    publisher: Arc<TPublisher>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    batch_size: usize,
    polling_interval: Duration,
    publish_timeout: Duration,
    delivery_mode: DeliveryMode,
    dead_letter_after: u32,
}

impl<TStore, TPublisher> OutboxDispatcher<TStore, TPublisher>
where
    TStore: OutboxStore + ?Sized,
    TPublisher: EventPublisher + ?Sized,
{
    pub fn new(store: Arc<TStore>, publisher: Arc<TPublisher>, config: &OutboxConfig) -> Self {
        Self {
            store,
            publisher,
            breaker: Arc::new(CircuitBreaker::new(
                config.breaker_failure_threshold,
                config.breaker_cooldown,
            )),
            retry: RetryPolicy::new(
                config.max_retry_attempts,
                config.retry_delay,
                config.max_retry_delay,
            ),
            batch_size: config.batch_size.max(1),
            polling_interval: config.polling_interval,
            publish_timeout: config.publish_timeout,
            delivery_mode: config.delivery_mode,
            dead_letter_after: config.dead_letter_after,
        }
    }

    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        self.breaker.clone()
    }

    /// Runs cycles until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            polling_interval_ms = self.polling_interval.as_millis() as u64,
            batch_size = self.batch_size,
            delivery_mode = ?self.delivery_mode,
            "Outbox dispatcher started"
        );
        while !*shutdown.borrow() {
            self.run_cycle().await;
            tokio::select! {
                _ = sleep(self.polling_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Outbox dispatcher stopped");
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        if !self.breaker.try_acquire().await {
            warn!("Circuit open, skipping outbox cycle");
            return CycleOutcome::CircuitOpen;
        }

        let batch = match self.store.fetch_pending(self.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, "Failed to claim outbox batch");
                self.breaker.record_failure().await;
                return CycleOutcome::ClaimFailed;
            }
        };

        let claimed = batch.len();
        if claimed == 0 {
            self.breaker.record_success().await;
            return CycleOutcome::Completed(CycleReport::default());
        }
        debug!(claimed, "Claimed outbox batch");

        let outcomes: Vec<MessageOutcome> = match self.delivery_mode {
            DeliveryMode::Concurrent => {
                stream::iter(batch)
                    .map(|message| self.process(message))
                    .buffer_unordered(claimed)
                    .collect()
                    .await
            }
            DeliveryMode::Sequential => {
                let mut outcomes = Vec::with_capacity(claimed);
                for message in batch {
                    outcomes.push(self.process(message).await);
                }
                outcomes
            }
        };

        let mut report = CycleReport {
            claimed,
            ..CycleReport::default()
        };
        for outcome in outcomes {
            match outcome {
                MessageOutcome::Processed => report.processed += 1,
                MessageOutcome::Failed => report.failed += 1,
                MessageOutcome::DeadLettered => report.dead_lettered += 1,
            }
        }

        if report.processed == 0 {
            self.breaker.record_failure().await;
        } else {
            self.breaker.record_success().await;
        }

        info!(
            claimed = report.claimed,
            processed = report.processed,
            failed = report.failed,
            dead_lettered = report.dead_lettered,
            "Outbox cycle completed"
        );
        CycleOutcome::Completed(report)
    }

    async fn process(&self, message: OutboxMessage) -> MessageOutcome {
        match self.publish_with_retry(&message).await {
            Ok(()) => match self.store.mark_processed(message.id, Utc::now()).await {
                Ok(()) => {
                    debug!(message_id = %message.id, event_type = %message.event_type, "Outbox message processed");
                    MessageOutcome::Processed
                }
                Err(e) => {
                    // Published but still pending: it will be delivered again next cycle.
                    error!(message_id = %message.id, error = %e, "Failed to mark outbox message processed");
                    MessageOutcome::Failed
                }
            },
            Err(failure) => self.handle_failure(&message, &failure.reason).await,
        }
    }

    async fn publish_once(&self, message: &OutboxMessage) -> Result<(), PublishFailure> {
        let publish = self
            .publisher
            .publish_serialized(&message.event_type, &message.data);
        match timeout(self.publish_timeout, publish).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PublishFailure {
                retryable: e.is_retryable(),
                reason: e.to_string(),
            }),
            Err(_) => Err(PublishFailure {
                retryable: true,
                reason: format!(
                    "publish timed out after {}ms",
                    self.publish_timeout.as_millis()
                ),
            }),
        }
    }

    async fn publish_with_retry(&self, message: &OutboxMessage) -> Result<(), PublishFailure> {
        let mut attempt = 1;
        loop {
            match self.publish_once(message).await {
                Ok(()) => return Ok(()),
                Err(failure) if failure.retryable && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        message_id = %message.id,
                        event_type = %message.event_type,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure.reason,
                        "Publish failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure),
            }
        }
    }

    async fn handle_failure(&self, message: &OutboxMessage, reason: &str) -> MessageOutcome {
        let attempts = match self.store.record_failure(message.id, reason).await {
            Ok(attempts) => attempts,
            Err(e) => {
                error!(message_id = %message.id, error = %e, "Failed to record outbox failure");
                return MessageOutcome::Failed;
            }
        };

        if self.dead_letter_after > 0 && attempts >= self.dead_letter_after {
            return match self.store.dead_letter(message.id, Utc::now()).await {
                Ok(()) => {
                    error!(
                        message_id = %message.id,
                        event_type = %message.event_type,
                        attempts,
                        error = %reason,
                        "Outbox message dead-lettered"
                    );
                    MessageOutcome::DeadLettered
                }
                Err(e) => {
                    error!(message_id = %message.id, error = %e, "Failed to dead-letter outbox message");
                    MessageOutcome::Failed
                }
            };
        }

        error!(
            message_id = %message.id,
            event_type = %message.event_type,
            attempts,
            error = %reason,
            "Publish failed, message left pending for the next cycle"
        );
        MessageOutcome::Failed
    }
}
