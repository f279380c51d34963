use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use crate::modules::clients::core::client::ClientId;
use crate::modules::clients::use_cases::application_error::ApplicationError;
use crate::modules::clients::use_cases::get_client_by_id::query::GetClientById;
use crate::shell::state::AppState;

pub async fn handle(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Ok(client_id) = id.parse::<ClientId>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    match state
        .get_client_by_id
        .handle(GetClientById { client_id })
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(ApplicationError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, %client_id, "Failed to load client");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
