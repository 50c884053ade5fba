//! Mapping of domain errors onto HTTP responses.

use axum::{http::StatusCode, response::IntoResponse, Json};

use contentai_core::Error;

/// Error returned by the plain JSON endpoints as `{ "error": message }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            Error::NotFound(_) | Error::TaskNotFound(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => msg,
        };
        if status.is_server_error() {
            tracing::error!(subsystem = "api", error = %message, "Request failed");
        }

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ApiError::from(Error::InvalidInput("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::TaskNotFound(Uuid::nil())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(Error::Inference("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
