//! API v1 routes.

mod containers;
mod flavors;
mod hosts;

use axum::Router;

use crate::state::AppState;

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/containers", containers::routes())
        .nest("/hosts", hosts::routes())
        .nest("/flavors", flavors::routes())
}
