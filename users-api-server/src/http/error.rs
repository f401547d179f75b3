use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::services::user_store::StoreError;

pub type AppResult<T> = Result<T, ApiError>;

/// Every way a request can fail. Each variant maps to exactly one status code
/// and one [`ErrorBody`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not Found")]
    RouteNotFound,
    #[error("invalid JSON")]
    InvalidJson,
    #[error("username and email are required")]
    MissingFields,
    #[error("Invalid user_id")]
    InvalidUserId,
    #[error("User not found")]
    UserNotFound,
    #[error("Database error")]
    Database(#[from] StoreError),
}

/// JSON error payload: `{"error": ..}` plus `detail` for database failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RouteNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidJson | Self::MissingFields | Self::InvalidUserId => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let detail = match self {
            Self::Database(source) => Some(source.to_string()),
            _ => None,
        };
        ErrorBody {
            error: self.to_string(),
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Database(source) = &self {
            error!(error = %source, "database operation failed");
        } else {
            debug!(status = status.as_u16(), reason = %self, "request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}
