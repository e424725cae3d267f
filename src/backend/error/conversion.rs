/**
 * Error Conversion
 *
 * `IntoResponse` for backend errors, so handlers can return them directly.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 403,
 *   "code": "forbidden"
 * }
 * ```
 *
 * HTTP clients rebuild the typed error from `code` and `error`.
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("[Backend] {} {}", status.as_u16(), message);
        } else {
            tracing::debug!("[Backend] {} {}", status.as_u16(), message);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "code": self.code(),
        });

        (status, Json(body)).into_response()
    }
}

/// Build the error response for a rejected extractor
pub fn rejection(status: StatusCode, message: impl Into<String>) -> Response {
    BackendError::handler(status, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::CollabError;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_error_body_carries_code() {
        let response = BackendError::from(CollabError::NotCollaborative).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "not_collaborative");
        assert_eq!(body["status"], 403);
        assert_eq!(body["error"], "This note is not a collaborative note");
    }
}
