//! Container API endpoints.
//!
//! Thin decoding layer over the orchestrator: requests are parsed into
//! operation parameters, responses mirror the orchestrator's result, and
//! failures become `{"detail": ...}` bodies through [`ApiError`].

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use pylon_id::{ContainerId, FlavorId, HostId};
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiError;
use crate::orchestrator::CreateRequest;
use crate::state::AppState;
use crate::store::ContainerFilter;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_containers).post(create_container))
        .route("/{id}", get(get_container).delete(delete_container))
        .route("/{id}/start", post(start_container))
        .route("/{id}/stop", post(stop_container))
        .route("/{id}/restart", post(restart_container))
        .route("/{id}/pause", post(pause_container))
        .route("/{id}/unpause", post(unpause_container))
        .route("/{id}/top", post(top_container))
        .route("/{id}/inspect", post(inspect_container))
        .route("/{id}/exec", post(exec_container))
        .route("/{id}/console", post(console_container))
        .route("/{id}/host-exec", post(host_exec_container))
        .route("/{id}/files/write", post(files_write))
        .route("/{id}/files/read", post(files_read))
        .route("/{id}/files/list", post(files_list))
        .route("/{id}/files/delete", post(files_delete))
        .route("/{id}/dirs/create", post(dirs_create))
        .route("/{id}/dirs/delete", post(dirs_delete))
}

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateContainerRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub image: String,
    pub flavor: String,
    pub user: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
    /// Pinned host; omit to let the scheduler choose.
    #[serde(default)]
    pub host: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListContainersQuery {
    pub user: Option<String>,
    pub status: Option<String>,
    pub cid: Option<String>,
    pub name: Option<String>,
    pub host: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExecRequest {
    pub command: String,
}

#[derive(Debug, Deserialize)]
pub struct ConsoleRequest {
    pub command: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct HostExecRequest {
    pub commands: Vec<String>,
    pub username: String,
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Deserialize)]
pub struct FilesWriteRequest {
    pub files: BTreeMap<String, String>,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct FilesReadRequest {
    pub files: Vec<String>,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct FilesSelectionRequest {
    #[serde(default)]
    pub dirs: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DirsRequest {
    pub dirs: Vec<String>,
}

fn parse_container_id(raw: &str) -> Result<ContainerId, ApiError> {
    ContainerId::parse(raw)
        .map_err(|_| ApiError::bad_request(format!("invalid container id '{raw}'")))
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_containers(
    State(state): State<AppState>,
    Query(query): Query<ListContainersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let host = match query.host.as_deref() {
        Some(raw) => Some(
            HostId::parse(raw)
                .map_err(|_| ApiError::bad_request(format!("invalid host id '{raw}'")))?,
        ),
        None => None,
    };
    let filter = ContainerFilter {
        host,
        user: query.user,
        status: query.status,
        cid: query.cid,
        name: query.name,
    };
    let items = state.containers().list(&filter).await?;
    Ok(Json(json!({ "items": items })))
}

async fn create_container(
    State(state): State<AppState>,
    Json(request): Json<CreateContainerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let flavor = FlavorId::parse(&request.flavor)
        .map_err(|_| ApiError::bad_request(format!("invalid flavor id '{}'", request.flavor)))?;
    let host = match request.host.as_deref() {
        Some(raw) => Some(
            HostId::parse(raw)
                .map_err(|_| ApiError::bad_request(format!("invalid host id '{raw}'")))?,
        ),
        None => None,
    };

    let container = state
        .orchestrator()
        .create(CreateRequest {
            name: request.name,
            image: request.image,
            flavor,
            user: request.user,
            command: request.command,
            hostname: request.hostname,
            ports: request.ports,
            host,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(container)))
}

async fn get_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let container = state.containers().get(id).await?;
    Ok(Json(container))
}

async fn delete_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    state.orchestrator().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let container = state.orchestrator().start(id).await?;
    Ok(Json(container))
}

async fn stop_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let container = state.orchestrator().stop(id).await?;
    Ok(Json(container))
}

async fn restart_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let container = state.orchestrator().restart(id).await?;
    Ok(Json(container))
}

async fn pause_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let container = state.orchestrator().pause(id).await?;
    Ok(Json(container))
}

async fn unpause_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let container = state.orchestrator().unpause(id).await?;
    Ok(Json(container))
}

async fn top_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state.orchestrator().top(id).await?;
    Ok(Json(result))
}

async fn inspect_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state.orchestrator().inspect(id).await?;
    Ok(Json(result))
}

async fn exec_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ExecRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state.orchestrator().exec(id, request.command).await?;
    Ok(Json(result))
}

async fn console_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ConsoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let url = state
        .orchestrator()
        .console(id, request.command, request.username)
        .await?;
    Ok(Json(json!({ "url": url })))
}

async fn host_exec_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<HostExecRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state
        .orchestrator()
        .host_exec(id, request.commands, request.username, request.wait)
        .await?;
    Ok(Json(result))
}

async fn files_write(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FilesWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state
        .orchestrator()
        .files_write(id, request.files, request.username)
        .await?;
    Ok(Json(result))
}

async fn files_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FilesReadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state
        .orchestrator()
        .files_read(id, request.files, request.username)
        .await?;
    Ok(Json(result))
}

async fn files_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FilesSelectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state
        .orchestrator()
        .files_list(id, request.dirs, request.files)
        .await?;
    Ok(Json(result))
}

async fn files_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FilesSelectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state
        .orchestrator()
        .files_delete(id, request.dirs, request.files)
        .await?;
    Ok(Json(result))
}

async fn dirs_create(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DirsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state.orchestrator().dirs_create(id, request.dirs).await?;
    Ok(Json(result))
}

async fn dirs_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DirsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_container_id(&id)?;
    let result = state.orchestrator().dirs_delete(id, request.dirs).await?;
    Ok(Json(result))
}
