use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use http::{Extensions, HeaderMap, HeaderValue, StatusCode};

use crate::error::WebError;

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
    pub extensions: Extensions,
}

/// Error a middleware swallowed after rendering it into the response.
#[derive(Debug, Clone)]
pub struct RecordedError(pub Arc<WebError>);

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: HeaderMap::new(),
            body: Body::Bytes(Bytes::new()),
            extensions: Extensions::new(),
        }
    }

    pub fn text<S: Into<String>>(status: u16, body: S) -> Self {
        let mut res = Self::new(status);
        res.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res.body = Body::Bytes(Bytes::from(body.into().into_bytes()));
        res
    }

    /// Construct an empty response with given status. Does not set content-type.
    pub fn empty(status: u16) -> Self {
        Self::new(status)
    }

    /// Construct a raw bytes response. Does not set content-type.
    pub fn bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let mut res = Self::new(status);
        res.body = Body::Bytes(body.into());
        res
    }

    /// Construct a JSON response from any serializable value.
    pub fn json(status: u16, value: impl serde::Serialize) -> Self {
        let mut res = Self::new(status);
        res.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        match serde_json::to_vec(&value) {
            Ok(bytes) => res.body = Body::Bytes(Bytes::from(bytes)),
            Err(_) => {
                res.status = StatusCode::INTERNAL_SERVER_ERROR;
                res.body = Body::Bytes(Bytes::new());
            }
        }
        res
    }

    /// Redirect to `location` with the given 3xx status.
    pub fn redirect(status: u16, location: &str) -> Self {
        let mut res = Self::new(status);
        res.set_header(http::header::LOCATION, location);
        res
    }

    /// Construct a streaming response from a boxed stream of Bytes chunks
    pub fn stream(status: u16, stream: BoxStream<'static, Bytes>) -> Self {
        let mut res = Self::new(status);
        res.body = Body::Stream(stream);
        res
    }

    /// Number of body bytes this response will write.
    ///
    /// Streaming bodies report their `content-length` header, or 0 when the
    /// length is not known up front.
    pub fn size(&self) -> u64 {
        match &self.body {
            Body::Bytes(b) => b.len() as u64,
            Body::Stream(_) => self
                .headers
                .get(http::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }

    pub fn header_str<K: http::header::AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Attach an error that was handled without being propagated, so outer
    /// middleware can still inspect it.
    pub fn record_error(&mut self, err: WebError) {
        self.extensions.insert(RecordedError(Arc::new(err)));
    }

    pub fn recorded_error(&self) -> Option<&WebError> {
        self.extensions.get::<RecordedError>().map(|e| e.0.as_ref())
    }

    pub fn set_header<K, V>(&mut self, k: K, v: V)
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        if let (Ok(key), Ok(value)) = (k.try_into(), v.try_into()) {
            self.headers.insert(key, value);
        }
    }

    pub fn header<K, V>(mut self, k: K, v: V) -> Self
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        self.set_header(k, v);
        self
    }
}

pub enum Body {
    Bytes(Bytes),
    Stream(BoxStream<'static, Bytes>),
}
