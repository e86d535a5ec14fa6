use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use magjob_core::{CalendarError, ExpansionError, PageError, ShiftError, StatusParseError, TargetError};
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} {} not found", entity, id))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::Serialization(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ShiftError> for AppError {
    fn from(e: ShiftError) -> Self {
        AppError::Conflict(e.to_string())
    }
}

impl From<PageError> for AppError {
    fn from(e: PageError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<CalendarError> for AppError {
    fn from(e: CalendarError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<StatusParseError> for AppError {
    fn from(e: StatusParseError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<ExpansionError> for AppError {
    fn from(e: ExpansionError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<TargetError> for AppError {
    fn from(e: TargetError) -> Self {
        match e {
            TargetError::Missing => AppError::NotFound(e.to_string()),
            TargetError::Ambiguous => AppError::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Serialization(e) => {
                tracing::warn!("Serialization error: {:?}", e);
                "Invalid JSON".to_string()
            }
            AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Forbidden(msg)
            | AppError::Unauthorized(msg)
            | AppError::BadRequest(msg) => msg.clone(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_statuses() {
        let missing: AppError = TargetError::Missing.into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let ambiguous: AppError = TargetError::Ambiguous.into();
        assert_eq!(ambiguous.status(), StatusCode::BAD_REQUEST);
        let page: AppError = PageError::ZeroSize.into();
        assert_eq!(page.status(), StatusCode::BAD_REQUEST);
    }
}
