//! Shared fixtures for the integration tests.

use std::{sync::Arc, time::Duration};

use axum::Router;
use shared::config::server::Config;
use users_api_server::{
    app_state::AppState, server::create_app_router,
    services::user_store::test_implementations::InMemoryUserStore,
};

/// Router backed by a fresh in-memory store whose ids start at 1.
pub fn app() -> Router {
    let store = Arc::new(InMemoryUserStore::default());
    let state = Arc::new(AppState::new(store, Duration::from_secs(60)));
    create_app_router(state, &Config::with_defaults())
}
