//! Mapping from `PropertyError` to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use parcel_services::PropertyError;
use serde_json::json;

/// A failed request. Logs internal detail once, on construction, and renders
/// only the user-facing message.
#[derive(Debug)]
pub struct ApiError(PropertyError);

impl ApiError {
    pub fn logged(operation: &'static str, id: Option<&str>, error: PropertyError) -> Self {
        let id = id.unwrap_or("-");
        match &error {
            PropertyError::ValidationFailed(_) | PropertyError::NotFound(_) => {
                tracing::debug!(operation, id, "{}", error);
            }
            PropertyError::WeatherRejected(_) => {
                tracing::warn!(operation, id, "{}", error);
            }
            PropertyError::WeatherUnavailable { .. } | PropertyError::PersistenceFault(_) => {
                tracing::error!(operation, id, "{}", error);
            }
        }
        Self(error)
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            PropertyError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            PropertyError::NotFound(_) => StatusCode::NOT_FOUND,
            PropertyError::WeatherRejected(_) => StatusCode::BAD_GATEWAY,
            PropertyError::WeatherUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PropertyError::PersistenceFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.0.code(),
            "message": self.0.user_message(),
        });
        if let Some(violations) = self.0.violations() {
            body["violations"] = json!(violations);
        }
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_services::FieldViolation;

    #[test]
    fn test_status_per_error_kind() {
        let cases = [
            (PropertyError::ValidationFailed(vec![]), StatusCode::BAD_REQUEST),
            (PropertyError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PropertyError::WeatherRejected("x".into()), StatusCode::BAD_GATEWAY),
            (
                PropertyError::WeatherUnavailable {
                    attempts: 3,
                    last_error: "x".into(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                PropertyError::PersistenceFault("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError(error).status(), status);
        }
    }

    #[test]
    fn test_validation_response_carries_status() {
        let error = PropertyError::ValidationFailed(vec![FieldViolation::new(
            "zipCode",
            "format",
            "Zip code must be exactly 5 digits",
        )]);
        let response = ApiError::logged("create_property", None, error).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
