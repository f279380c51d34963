use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use storefront::modules::clients::adapters::inbound::event_handlers as client_subscribers;
use storefront::modules::clients::adapters::outbound::client_repository::SqliteClientRepository;
use storefront::modules::clients::use_cases::change_client_email::handler::ChangeClientEmailHandler;
use storefront::modules::clients::use_cases::get_client_by_email::handler::GetClientByEmailHandler;
use storefront::modules::clients::use_cases::get_client_by_id::handler::GetClientByIdHandler;
use storefront::modules::clients::use_cases::register_client::handler::RegisterClientHandler;
use storefront::modules::products::adapters::inbound::event_handlers as product_subscribers;
use storefront::modules::products::adapters::outbound::product_repository::SqliteProductRepository;
use storefront::modules::products::use_cases::create_product::handler::CreateProductHandler;
use storefront::shared::infrastructure::database::SqliteDatabase;
use storefront::shared::infrastructure::event_bus::EventBus;
use storefront::shared::infrastructure::outbox::circuit_breaker::CircuitBreaker;
use storefront::shared::infrastructure::outbox::sqlite::SqliteOutboxStore;
use storefront::shell::config::AppConfig;
use storefront::shell::http::router;
use storefront::shell::state::AppState;
use storefront::shell::workers::Workers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db = SqliteDatabase::open(&config.database_path).await?;
    db.health_check().await?;
    info!(path = db.path(), "Database ready");

    let outbox = Arc::new(SqliteOutboxStore::new(db.clone()));
    let clients = Arc::new(SqliteClientRepository::new(db.clone()));
    let products = Arc::new(SqliteProductRepository::new(db));

    let bus = EventBus::builder();
    let bus = client_subscribers::subscribe(bus);
    let bus = product_subscribers::subscribe(bus);
    let bus = Arc::new(bus.build());
    for event_type in bus.event_types() {
        info!(
            event_type,
            handlers = bus.handler_count(event_type),
            "Event subscribers registered"
        );
    }

    let breaker = Arc::new(CircuitBreaker::new(
        config.outbox.breaker_failure_threshold,
        config.outbox.breaker_cooldown,
    ));
    let workers = Workers::spawn(outbox.clone(), bus, breaker.clone(), &config.outbox)?;

    let state = AppState {
        register_client: Arc::new(RegisterClientHandler::new(clients.clone())),
        change_client_email: Arc::new(ChangeClientEmailHandler::new(clients.clone())),
        get_client_by_id: Arc::new(GetClientByIdHandler::new(clients.clone())),
        get_client_by_email: Arc::new(GetClientByEmailHandler::new(clients)),
        create_product: Arc::new(CreateProductHandler::new(products)),
        outbox,
        breaker,
    };

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!("HTTP endpoint: http://{}", config.http_addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown requested"),
                Err(e) => {
                    error!(error = %e, "Cannot listen for Ctrl-C; running until killed");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    workers.shutdown().await;
    Ok(())
}
