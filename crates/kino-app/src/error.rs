use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tracing::error;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Dal(#[from] kino_dal::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use kino_dal::Error as DalError;
        let status = match &self {
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Dal(DalError::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Dal(DalError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Dal(DalError::InvalidOrderByField(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {self}");
        }
        (status, self.to_string()).into_response()
    }
}
