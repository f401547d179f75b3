pub mod root;
pub mod users;


use crate::http::error::ApiError;

/// Answer for any method/path pair without a handler.
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
