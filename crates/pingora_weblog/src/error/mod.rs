mod response_error;
mod web_error;

pub use response_error::ResponseError;
pub use web_error::WebError;

use http::StatusCode;

fn simple<T: std::fmt::Display>(status: StatusCode, msg: T) -> WebError {
    WebError::new(SimpleError::new(status, msg.to_string()))
}

pub fn bad_request<T: std::fmt::Display>(msg: T) -> WebError {
    simple(StatusCode::BAD_REQUEST, msg)
}

pub fn unauthorized<T: std::fmt::Display>(msg: T) -> WebError {
    simple(StatusCode::UNAUTHORIZED, msg)
}

pub fn forbidden<T: std::fmt::Display>(msg: T) -> WebError {
    simple(StatusCode::FORBIDDEN, msg)
}

pub fn not_found<T: std::fmt::Display>(msg: T) -> WebError {
    simple(StatusCode::NOT_FOUND, msg)
}

pub fn internal_error<T: std::fmt::Display>(msg: T) -> WebError {
    simple(StatusCode::INTERNAL_SERVER_ERROR, msg)
}

pub fn service_unavailable<T: std::fmt::Display>(msg: T) -> WebError {
    simple(StatusCode::SERVICE_UNAVAILABLE, msg)
}

/// Error carrying only a status and a message
#[derive(Debug)]
pub struct SimpleError {
    status: StatusCode,
    message: String,
}

impl SimpleError {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}

impl ResponseError for SimpleError {
    fn status_code(&self) -> StatusCode {
        self.status
    }
}

impl ResponseError for std::io::Error {}

impl ResponseError for serde_json::Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}
