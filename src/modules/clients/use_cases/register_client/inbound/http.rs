use axum::{
    Json, extract::State, extract::rejection::JsonRejection, http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::modules::clients::use_cases::application_error::ApplicationError;
use crate::modules::clients::use_cases::register_client::command::RegisterClient;
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct RegisterClientBody {
    pub email: String,
}

#[derive(Serialize)]
pub struct RegisterClientResponse {
    pub client_id: String,
}

pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<RegisterClientBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };

    let command = RegisterClient { email: body.email };

    match state.register_client.handle(command).await {
        Ok(client_id) => (
            StatusCode::CREATED,
            Json(RegisterClientResponse {
                client_id: client_id.to_string(),
            }),
        )
            .into_response(),
        Err(ApplicationError::EmailTaken(_)) => StatusCode::CONFLICT.into_response(),
        Err(ApplicationError::Domain(_)) => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to register client");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
