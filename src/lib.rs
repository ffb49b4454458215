#![allow(async_fn_in_trait)]

use axum::Router;
use axum::extract::State;
use std::sync::Arc;

pub mod api;
pub mod app_env;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod password;
pub mod persistence;
pub mod routing_utils;


/// State shared by every request handler
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
    pub sessions: api::session::SessionStore,
}

/// Extractor alias for the app's shared state
pub type AppState = State<Arc<SharedData>>;

/// Assembles the application router. The identity-resolution middleware wraps
/// every route, so each handler receives an explicit [domain::auth::Identity]
/// extension.
pub fn router(shared_data: Arc<SharedData>) -> Router {
    Router::new()
        .merge(api::auth::auth_routes())
        .merge(api::project::project_routes())
        .merge(api::task::task_routes())
        .layer(axum::middleware::from_fn_with_state(
            shared_data.clone(),
            api::session::resolve_identity,
        ))
        .with_state(shared_data)
}
