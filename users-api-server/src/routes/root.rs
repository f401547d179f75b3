use std::sync::Arc;

use axum::{Router, routing::get};

use crate::{
    app_state::AppState,
    handlers::{not_found, root::root},
};

pub fn create_router_root() -> Router<Arc<AppState>> {
    Router::new().route("/", get(root).head(not_found).fallback(not_found))
}
