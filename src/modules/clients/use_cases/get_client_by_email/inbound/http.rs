use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use crate::modules::clients::use_cases::get_client_by_email::query::GetClientByEmail;
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct GetClientByEmailParams {
    pub email: String,
}

pub async fn handle(
    State(state): State<AppState>,
    Query(params): Query<GetClientByEmailParams>,
) -> impl IntoResponse {
    if params.email.trim().is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state
        .get_client_by_email
        .handle(GetClientByEmail {
            email: params.email,
        })
        .await
    {
        Ok(Some(view)) => Json(view).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load client by email");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
