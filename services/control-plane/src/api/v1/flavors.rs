//! Flavor API endpoints.
//!
//! Flavors are immutable reference data once created; there is no update or
//! delete, matching how placements reference them by identifier.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use pylon_id::FlavorId;
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiError;
use crate::model::{Flavor, Resources};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_flavors).post(create_flavor))
        .route("/{id}", get(get_flavor))
}

#[derive(Debug, Deserialize)]
pub struct CreateFlavorRequest {
    pub name: String,
    pub resources: Resources,
}

async fn list_flavors(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items = state.flavors().list().await?;
    Ok(Json(json!({ "items": items })))
}

async fn create_flavor(
    State(state): State<AppState>,
    Json(request): Json<CreateFlavorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("field 'name' must not be empty"));
    }
    if !request.resources.is_valid() {
        return Err(ApiError::bad_request("resources must be non-negative"));
    }
    let flavor = Flavor {
        id: FlavorId::new(),
        name: request.name,
        resources: request.resources,
    };
    state.flavors().save(flavor.clone()).await?;
    Ok((StatusCode::CREATED, Json(flavor)))
}

async fn get_flavor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = FlavorId::parse(&id)
        .map_err(|_| ApiError::bad_request(format!("invalid flavor id '{id}'")))?;
    let flavor = state.flavors().get(id).await?;
    Ok(Json(flavor))
}
