use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, State,
        rejection::{BytesRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use shared::models::{CreateUserRequest, User, UserCreated};
use tracing::{info, instrument};

use crate::{
    app_state::AppState,
    http::{
        error::{ApiError, AppResult},
        user_path::UserPath,
    },
    services::user_store::with_deadline,
};

/// `POST /users`: validates the body, then inserts exactly one row.
#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<impl IntoResponse> {
    let deadline = state.deadline();

    let body = body.map_err(|_| ApiError::InvalidJson)?;
    // A `null` body is treated like `{}`.
    let request = serde_json::from_slice::<Option<CreateUserRequest>>(&body)
        .map_err(|_| ApiError::InvalidJson)?
        .unwrap_or_default();
    if !request.has_required_fields() {
        return Err(ApiError::MissingFields);
    }

    let user_id = with_deadline(deadline, state.users.create_user(&request)).await?;
    info!(user_id, "user created");

    Ok((StatusCode::CREATED, Json(UserCreated::new(user_id))))
}

/// `GET /users/{*user_path}`: reads the id from the first segment.
#[instrument(skip_all)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    user_path: Result<Path<String>, PathRejection>,
) -> AppResult<Json<User>> {
    let user_path = user_path.map_or(UserPath::Invalid, |Path(rest)| UserPath::parse(&rest));
    find_user(&state, user_path).await
}

/// `GET /users/`: the id segment is empty.
pub async fn get_user_without_id() -> ApiError {
    ApiError::InvalidUserId
}

async fn find_user(state: &AppState, user_path: UserPath) -> AppResult<Json<User>> {
    let deadline = state.deadline();
    let UserPath::Id(user_id) = user_path else {
        return Err(ApiError::InvalidUserId);
    };

    with_deadline(deadline, state.users.find_user(user_id))
        .await?
        .map(Json)
        .ok_or(ApiError::UserNotFound)
}
