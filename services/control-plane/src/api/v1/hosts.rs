//! Host API endpoints.
//!
//! Hosts are administrative inventory: machines running a container engine
//! that the scheduler may place onto. They are created and updated here and
//! read-only everywhere else.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use pylon_id::HostId;
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiError;
use crate::model::{Host, Resources};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_hosts).post(create_host))
        .route("/{id}", get(get_host).put(update_host).delete(delete_host))
}

#[derive(Debug, Deserialize)]
pub struct CreateHostRequest {
    pub ip: String,
    pub port: u16,
    #[serde(default = "default_alive")]
    pub alive: bool,
    pub capacity: Resources,
}

fn default_alive() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateHostRequest {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub alive: Option<bool>,
    #[serde(default)]
    pub capacity: Option<Resources>,
}

fn parse_host_id(raw: &str) -> Result<HostId, ApiError> {
    HostId::parse(raw).map_err(|_| ApiError::bad_request(format!("invalid host id '{raw}'")))
}

async fn list_hosts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items = state.hosts().list().await?;
    Ok(Json(json!({ "items": items })))
}

async fn create_host(
    State(state): State<AppState>,
    Json(request): Json<CreateHostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.ip.trim().is_empty() {
        return Err(ApiError::bad_request("field 'ip' must not be empty"));
    }
    if !request.capacity.is_valid() {
        return Err(ApiError::bad_request("capacity must be non-negative"));
    }
    let host = Host {
        id: HostId::new(),
        ip: request.ip,
        port: request.port,
        alive: request.alive,
        capacity: request.capacity,
        created_at: Utc::now(),
    };
    state.hosts().save(host.clone()).await?;
    Ok((StatusCode::CREATED, Json(host)))
}

async fn get_host(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_host_id(&id)?;
    let host = state.hosts().get(id).await?;
    Ok(Json(host))
}

async fn update_host(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateHostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_host_id(&id)?;
    let mut host = state.hosts().get(id).await?;
    if let Some(ip) = request.ip {
        if ip.trim().is_empty() {
            return Err(ApiError::bad_request("field 'ip' must not be empty"));
        }
        host.ip = ip;
    }
    if let Some(port) = request.port {
        host.port = port;
    }
    if let Some(alive) = request.alive {
        host.alive = alive;
    }
    if let Some(capacity) = request.capacity {
        if !capacity.is_valid() {
            return Err(ApiError::bad_request("capacity must be non-negative"));
        }
        host.capacity = capacity;
    }
    state.hosts().save(host.clone()).await?;
    Ok(Json(host))
}

async fn delete_host(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_host_id(&id)?;
    state.hosts().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
