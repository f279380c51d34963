use axum::{
    Json, extract::State, extract::rejection::JsonRejection, http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::modules::products::use_cases::application_error::ApplicationError;
use crate::modules::products::use_cases::create_product::command::CreateProduct;
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct CreateProductBody {
    pub name: String,
}

#[derive(Serialize)]
pub struct CreateProductResponse {
    pub product_id: String,
}

pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<CreateProductBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };

    match state
        .create_product
        .handle(CreateProduct { name: body.name })
        .await
    {
        Ok(product_id) => (
            StatusCode::CREATED,
            Json(CreateProductResponse {
                product_id: product_id.to_string(),
            }),
        )
            .into_response(),
        Err(ApplicationError::Domain(_)) => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create product");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
