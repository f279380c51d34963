use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::modules::clients::use_cases::change_client_email::inbound::http as change_email_http;
use crate::modules::clients::use_cases::get_client_by_email::inbound::http as client_by_email_http;
use crate::modules::clients::use_cases::get_client_by_id::inbound::http as client_by_id_http;
use crate::modules::clients::use_cases::register_client::inbound::http as register_client_http;
use crate::modules::products::use_cases::create_product::inbound::http as create_product_http;
use crate::shared::infrastructure::outbox::circuit_breaker::CircuitState;
use crate::shell::state::AppState;

#[derive(Serialize)]
pub struct OutboxStatus {
    pub pending: u64,
    pub circuit: CircuitState,
}

async fn outbox_status(State(state): State<AppState>) -> impl IntoResponse {
    match state.outbox.pending_count().await {
        Ok(pending) => Json(OutboxStatus {
            pending,
            circuit: state.breaker.state().await,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read outbox status");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.outbox.pending_count().await {
        Ok(_) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            error!(error = %e, "Health check failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/clients", post(register_client_http::handle))
        .route("/clients/by-email", get(client_by_email_http::handle))
        .route("/clients/{id}", get(client_by_id_http::handle))
        .route("/clients/{id}/email", put(change_email_http::handle))
        .route("/products", post(create_product_http::handle))
        .route("/outbox/status", get(outbox_status))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
