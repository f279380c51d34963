use crate::modules::clients::adapters::outbound::client_repository::SqliteClientRepository;
use crate::modules::clients::adapters::outbound::client_repository_in_memory::InMemoryClientRepository;
use crate::modules::clients::core::events::{ClientCreated, ClientEmailChanged};
use crate::modules::clients::core::ports::ClientRepository;
use crate::modules::clients::use_cases::application_error::ApplicationError;
use crate::modules::clients::use_cases::change_client_email::command::ChangeClientEmail;
use crate::modules::clients::use_cases::change_client_email::handler::ChangeClientEmailHandler;
use crate::modules::clients::use_cases::register_client::command::RegisterClient;
use crate::modules::clients::use_cases::register_client::handler::RegisterClientHandler;
use crate::shared::core::domain_event::DomainEvent;
use crate::shared::infrastructure::database::SqliteDatabase;
use crate::shared::infrastructure::event_bus::{EventBus, EventHandler};
use crate::shared::infrastructure::outbox::cleanup::OutboxCleanupService;
use crate::shared::infrastructure::outbox::config::{DeliveryMode, OutboxConfig};
use crate::shared::infrastructure::outbox::dispatcher::{CycleOutcome, CycleReport, OutboxDispatcher};
use crate::shared::infrastructure::outbox::in_memory::InMemoryOutboxStore;
use crate::shared::infrastructure::outbox::sqlite::SqliteOutboxStore;
use crate::shared::infrastructure::outbox::{OutboxStore, RetentionSettingsStore};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct SeenEmails {
    emails: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl EventHandler<ClientCreated> for SeenEmails {
    async fn handle(&self, event: &ClientCreated) -> anyhow::Result<()> {
        self.emails.lock().await.push(event.email.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Unavailable {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl EventHandler<ClientCreated> for Unavailable {
    async fn handle(&self, _: &ClientCreated) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("mail relay unavailable")
    }
}

fn fast_config() -> OutboxConfig {
    OutboxConfig {
        retry_delay: Duration::from_millis(1),
        max_retry_delay: Duration::from_millis(2),
        ..OutboxConfig::default()
    }
}

async fn register(handler: &RegisterClientHandler, email: &str) {
    handler
        .handle(RegisterClient {
            email: email.into(),
        })
        .await
        .unwrap();
}

fn completed(outcome: CycleOutcome) -> CycleReport {
    match outcome {
        CycleOutcome::Completed(report) => report,
        other => panic!("unexpected cycle outcome: {other:?}"),
    }
}

#[tokio::test]
async fn registers_delivers_once_and_cleans_up_after_retention() {
    let store = Arc::new(InMemoryOutboxStore::new());
    let repository = Arc::new(InMemoryClientRepository::new(store.clone()));
    let register_handler = RegisterClientHandler::new(repository);
    let seen = SeenEmails::default();
    let bus = Arc::new(
        EventBus::builder()
            .subscribe::<ClientCreated, _>(seen.clone())
            .build(),
    );
    let dispatcher = OutboxDispatcher::new(store.clone(), bus, &fast_config());
    let cleanup = OutboxCleanupService::new(store.clone());

    register(&register_handler, "ada@example.com").await;
    assert_eq!(store.pending_count().await.unwrap(), 1);

    let report = completed(dispatcher.run_cycle().await);
    assert_eq!(report.processed, 1);
    assert_eq!(*seen.emails.lock().await, vec!["ada@example.com".to_string()]);

    let report = completed(dispatcher.run_cycle().await);
    assert_eq!(report.claimed, 0);
    assert_eq!(seen.emails.lock().await.len(), 1);

    let now = Utc::now();
    assert_eq!(
        cleanup
            .run_cleanup_at(now + ChronoDuration::days(29))
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        cleanup
            .run_cleanup_at(now + ChronoDuration::days(31))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        cleanup
            .run_cleanup_at(now + ChronoDuration::days(31))
            .await
            .unwrap(),
        0
    );
    assert!(store.all().await.is_empty());
}

#[tokio::test]
async fn keeps_retrying_a_failing_subscriber_until_dead_lettered() {
    let store = Arc::new(InMemoryOutboxStore::new());
    let repository = Arc::new(InMemoryClientRepository::new(store.clone()));
    let register_handler = RegisterClientHandler::new(repository);
    let unavailable = Unavailable::default();
    let bus = Arc::new(
        EventBus::builder()
            .subscribe::<ClientCreated, _>(unavailable.clone())
            .build(),
    );
    let config = OutboxConfig {
        max_retry_attempts: 3,
        dead_letter_after: 2,
        ..fast_config()
    };
    let dispatcher = OutboxDispatcher::new(store.clone(), bus, &config);
    register(&register_handler, "ada@example.com").await;

    let first = completed(dispatcher.run_cycle().await);
    assert_eq!(first.failed, 1);
    assert_eq!(unavailable.calls.load(Ordering::SeqCst), 3);
    let message = store.all().await.remove(0);
    assert!(message.is_pending());
    assert_eq!(message.attempts, 1);
    assert!(message.last_error.is_some());

    let second = completed(dispatcher.run_cycle().await);
    assert_eq!(second.dead_lettered, 1);
    assert_eq!(unavailable.calls.load(Ordering::SeqCst), 6);

    let third = completed(dispatcher.run_cycle().await);
    assert_eq!(third.claimed, 0);
    assert_eq!(unavailable.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn delivers_in_registration_order_when_sequential() {
    let store = Arc::new(InMemoryOutboxStore::new());
    let repository = Arc::new(InMemoryClientRepository::new(store.clone()));
    let register_handler = RegisterClientHandler::new(repository);
    let seen = SeenEmails::default();
    let bus = Arc::new(
        EventBus::builder()
            .subscribe::<ClientCreated, _>(seen.clone())
            .build(),
    );
    let config = OutboxConfig {
        delivery_mode: DeliveryMode::Sequential,
        ..fast_config()
    };
    let dispatcher = OutboxDispatcher::new(store.clone(), bus, &config);
    let emails: Vec<String> = (0..5).map(|i| format!("client-{i}@example.com")).collect();
    for email in &emails {
        register(&register_handler, email).await;
    }

    let report = completed(dispatcher.run_cycle().await);

    assert_eq!(report.processed, 5);
    assert_eq!(*seen.emails.lock().await, emails);
}

#[tokio::test]
async fn leaves_an_unroutable_message_pending_without_blocking_the_batch() {
    let store = Arc::new(InMemoryOutboxStore::new());
    let repository = Arc::new(InMemoryClientRepository::new(store.clone()));
    let register_handler = RegisterClientHandler::new(repository.clone());
    let change_handler = ChangeClientEmailHandler::new(repository);
    // Only ClientCreated is routed; ClientEmailChanged has no decoder on this bus.
    let seen = SeenEmails::default();
    let bus = Arc::new(
        EventBus::builder()
            .subscribe::<ClientCreated, _>(seen.clone())
            .build(),
    );
    let dispatcher = OutboxDispatcher::new(store.clone(), bus, &fast_config());
    let client_id = register_handler
        .handle(RegisterClient {
            email: "ada@example.com".into(),
        })
        .await
        .unwrap();
    change_handler
        .handle(ChangeClientEmail {
            client_id,
            new_email: "ada@lovelace.dev".into(),
        })
        .await
        .unwrap();

    let report = completed(dispatcher.run_cycle().await);

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    let pending = store.fetch_pending(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].event_type, ClientEmailChanged::EVENT_TYPE);
}

#[tokio::test]
async fn commits_nothing_when_registration_conflicts() {
    let store = Arc::new(InMemoryOutboxStore::new());
    let repository = Arc::new(InMemoryClientRepository::new(store.clone()));
    let register_handler = RegisterClientHandler::new(repository);
    register(&register_handler, "ada@example.com").await;

    let result = register_handler
        .handle(RegisterClient {
            email: "ada@example.com".into(),
        })
        .await;

    assert!(matches!(result, Err(ApplicationError::EmailTaken(_))));
    assert_eq!(store.all().await.len(), 1);
}

#[tokio::test]
async fn runs_the_full_flow_against_sqlite() {
    let db = SqliteDatabase::open_in_memory().await.unwrap();
    let store = Arc::new(SqliteOutboxStore::new(db.clone()));
    let repository: Arc<dyn ClientRepository> = Arc::new(SqliteClientRepository::new(db));
    let register_handler = RegisterClientHandler::new(repository.clone());
    let change_handler = ChangeClientEmailHandler::new(repository.clone());
    let seen = SeenEmails::default();
    let bus = Arc::new(
        EventBus::builder()
            .subscribe::<ClientCreated, _>(seen.clone())
            .register::<ClientEmailChanged>()
            .build(),
    );
    let dispatcher = OutboxDispatcher::new(store.clone(), bus, &fast_config());
    let cleanup = OutboxCleanupService::new(store.clone());

    let client_id = register_handler
        .handle(RegisterClient {
            email: "ada@example.com".into(),
        })
        .await
        .unwrap();
    change_handler
        .handle(ChangeClientEmail {
            client_id,
            new_email: "ada@lovelace.dev".into(),
        })
        .await
        .unwrap();
    assert_eq!(store.pending_count().await.unwrap(), 2);

    let report = completed(dispatcher.run_cycle().await);
    assert_eq!(report.processed, 2);
    assert_eq!(store.pending_count().await.unwrap(), 0);
    assert_eq!(*seen.emails.lock().await, vec!["ada@example.com".to_string()]);

    store.set_retention_days(7).await.unwrap();
    let removed = cleanup
        .run_cleanup_at(Utc::now() + ChronoDuration::days(8))
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(
        repository
            .find_by_id(client_id)
            .await
            .unwrap()
            .unwrap()
            .email(),
        "ada@lovelace.dev"
    );
}
