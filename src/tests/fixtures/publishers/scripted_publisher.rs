// EventPublisher double that fails a scripted number of times, optionally stalls, and
// records every delivery it accepted.

use crate::shared::infrastructure::event_bus::{EventPublisher, PublishError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub struct ScriptedPublisher {
    failures_left: AtomicUsize,
    calls: AtomicUsize,
    delay: Option<Duration>,
    delivered: Mutex<Vec<(String, String)>>,
}

impl ScriptedPublisher {
    pub fn succeeding() -> Self {
        Self::failing_times(0)
    }

    pub fn always_failing() -> Self {
        Self::failing_times(usize::MAX)
    }

    pub fn failing_times(n: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(n),
            calls: AtomicUsize::new(0),
            delay: None,
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn delivered(&self) -> Vec<(String, String)> {
        self.delivered.lock().await.clone()
    }

    pub async fn delivered_data(&self) -> Vec<String> {
        self.delivered
            .lock()
            .await
            .iter()
            .map(|(_, data)| data.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for ScriptedPublisher {
    async fn publish_serialized(&self, event_type: &str, data: &str) -> Result<(), PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if should_fail {
            return Err(PublishError::Handler {
                event_type: event_type.to_string(),
                handler: "ScriptedPublisher",
                reason: "scripted failure".to_string(),
            });
        }
        self.delivered
            .lock()
            .await
            .push((event_type.to_string(), data.to_string()));
        Ok(())
    }
}
