use crate::core::Response;
use http::StatusCode;

/// Errors that know how to render themselves as an HTTP response.
pub trait ResponseError: std::error::Error + Send + Sync {
    /// Status code for this error; 500 unless overridden.
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Render the error. Defaults to `{"error": "<display>"}`.
    fn error_response(&self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        Response::json(self.status_code().as_u16(), &body)
    }
}
