use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ErrorResponse;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is required")]
    MissingField(&'static str),
    #[error("'rating' must be a number between 0 and 5")]
    InvalidRating,
    #[error("'url' must be a valid URL")]
    InvalidUrl,
    #[error("'{0}' must be a string")]
    NotText(&'static str),
    #[error("Request body must contain either 'title', 'url', 'description', or 'rating'")]
    EmptyUpdate,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Bookmark doesn't exist")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage(e) => {
                let detail = format!("{e:#}");
                tracing::error!(error = %detail, "bookmark store call failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal server error")),
                )
                    .into_response();
            }
        };

        (status, Json(ErrorResponse::new(&self.to_string()))).into_response()
    }
}
