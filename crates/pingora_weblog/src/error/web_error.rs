use super::ResponseError;
use crate::core::Response;

/// Error type returned by handlers and middleware.
///
/// Wraps any [`ResponseError`]; the wrapped error decides the status code
/// and the rendered body.
#[derive(Debug)]
pub struct WebError {
    inner: Box<dyn ResponseError>,
}

impl WebError {
    pub fn new<T: ResponseError + 'static>(err: T) -> Self {
        Self {
            inner: Box::new(err),
        }
    }

    pub fn as_response_error(&self) -> &dyn ResponseError {
        &*self.inner
    }

    /// Render without consuming, for callers that keep the error around.
    pub fn render(&self) -> Response {
        self.inner.error_response()
    }

    /// Log and render. Used for errors that reach the app boundary unhandled.
    pub fn into_response(self) -> Response {
        tracing::error!(
            status_code = %self.inner.status_code(),
            error = %self.inner,
            "Unhandled web error",
        );
        self.render()
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for WebError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl From<std::io::Error> for WebError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

impl From<serde_json::Error> for WebError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err)
    }
}

impl From<super::SimpleError> for WebError {
    fn from(err: super::SimpleError) -> Self {
        Self::new(err)
    }
}
