use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::info;

use crate::{
    app_state::AppState,
    handlers::{
        not_found,
        users::{create_user, get_user, get_user_without_id},
    },
};

/// User routes. Each method router falls back to the JSON 404 so a wrong
/// method on a known path looks the same as an unknown path. `HEAD` is routed
/// there explicitly since `get` would otherwise answer it.
pub fn create_router_users() -> Router<Arc<AppState>> {
    info!("Registering user routes");
    Router::new()
        .route("/users", post(create_user).fallback(not_found))
        .route(
            "/users/",
            get(get_user_without_id).head(not_found).fallback(not_found),
        )
        .route(
            "/users/{*user_path}",
            get(get_user).head(not_found).fallback(not_found),
        )
}
