use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use crate::modules::clients::core::client::ClientId;
use crate::modules::clients::use_cases::application_error::ApplicationError;
use crate::modules::clients::use_cases::change_client_email::command::ChangeClientEmail;
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct ChangeClientEmailBody {
    pub email: String,
}

pub async fn handle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ChangeClientEmailBody>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(client_id) = id.parse::<ClientId>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };

    let command = ChangeClientEmail {
        client_id,
        new_email: body.email,
    };

    match state.change_client_email.handle(command).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(ApplicationError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(ApplicationError::EmailTaken(_)) => StatusCode::CONFLICT.into_response(),
        Err(ApplicationError::Domain(_)) => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
        Err(e) => {
            error!(error = %e, %client_id, "Failed to change client email");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
