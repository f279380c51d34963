use crate::shared::infrastructure::event_bus::EventPublisher;
use crate::shared::infrastructure::outbox::circuit_breaker::CircuitBreaker;
use crate::shared::infrastructure::outbox::cleanup::{CleanupSchedule, OutboxCleanupService};
use crate::shared::infrastructure::outbox::config::OutboxConfig;
use crate::shared::infrastructure::outbox::dispatcher::OutboxDispatcher;
use crate::shared::infrastructure::outbox::{OutboxError, OutboxStore, RetentionSettingsStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Background outbox tasks sharing one shutdown signal.
pub struct Workers {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Starts the dispatcher loop and the cleanup scheduler.
    /// Fails before spawning anything when the cleanup cron does not parse.
    pub fn spawn<TStore, TPublisher>(
        store: Arc<TStore>,
        publisher: Arc<TPublisher>,
        breaker: Arc<CircuitBreaker>,
        config: &OutboxConfig,
    ) -> Result<Self, OutboxError>
    where
        TStore: OutboxStore + RetentionSettingsStore + 'static,
        TPublisher: EventPublisher + 'static,
    {
        let schedule = CleanupSchedule::parse(&config.cleanup_cron)?;
        let (shutdown, receiver) = watch::channel(false);

        let dispatcher =
            OutboxDispatcher::new(store.clone(), publisher, config).with_breaker(breaker);
        let dispatcher_shutdown = receiver.clone();
        let dispatcher_handle = tokio::spawn(async move {
            dispatcher.run(dispatcher_shutdown).await;
        });

        let cleanup = OutboxCleanupService::new(store);
        let cleanup_handle = tokio::spawn(async move {
            cleanup.run(schedule, receiver).await;
        });

        info!("Outbox workers started");
        Ok(Self {
            shutdown,
            handles: vec![dispatcher_handle, cleanup_handle],
        })
    }

    /// Signals every task and waits for the in-flight cycle to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Outbox worker ended abnormally");
            }
        }
        info!("Outbox workers stopped");
    }
}
