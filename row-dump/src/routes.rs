pub use crate::row_dump::row_dump_handler;

use crate::session::Connector;
use crate::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn mount_path(route: Option<&str>) -> anyhow::Result<String> {
    let route = route.unwrap_or("/");
    if !route.starts_with('/') {
        anyhow::bail!("Invalid route '{}': must start with '/'", route);
    }
    Ok(route.to_string())
}

/// Router with the row dump handler mounted for GET at `path`.
pub fn router<C: Connector>(path: &str, state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route(path, get(row_dump_handler::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
