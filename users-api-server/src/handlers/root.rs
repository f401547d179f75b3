use axum::{Json, http::StatusCode};
use shared::models::Greeting;

pub async fn root() -> (StatusCode, Json<Greeting>) {
    (StatusCode::OK, Json(Greeting::default()))
}
