use std::collections::HashMap;
use std::net::IpAddr;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri};

#[derive(Debug)]
pub struct Request {
    pub inner: http::Request<Bytes>,
    pub params: HashMap<String, String>,
    /// Peer address of the underlying connection, when known.
    pub remote_ip: Option<IpAddr>,
}

impl Request {
    pub fn new<M: Into<Method>, S: AsRef<str>>(method: M, path: S) -> Self {
        // An unparsable target keeps the default "/" rather than failing.
        let mut inner = http::Request::new(Bytes::new());
        *inner.method_mut() = method.into();
        if let Ok(uri) = path.as_ref().parse::<Uri>() {
            *inner.uri_mut() = uri;
        }

        Self {
            inner,
            params: HashMap::new(),
            remote_ip: None,
        }
    }

    pub fn header<K, V>(mut self, k: K, v: V) -> Self
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        if let (Ok(key), Ok(value)) = (k.try_into(), v.try_into()) {
            self.inner.headers_mut().insert(key, value);
        }
        self
    }

    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        *self.inner.body_mut() = body.into();
        self
    }

    pub fn with_remote_ip(mut self, ip: IpAddr) -> Self {
        self.remote_ip = Some(ip);
        self
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn path(&self) -> &str {
        self.inner.uri().path()
    }

    /// Path plus query string, as it appeared on the request line.
    pub fn request_uri(&self) -> &str {
        self.inner
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.path())
    }

    /// `Host` header, falling back to the URI authority for absolute-form targets.
    pub fn host(&self) -> &str {
        self.header_str(http::header::HOST)
            .or_else(|| self.inner.uri().authority().map(|a| a.as_str()))
            .unwrap_or("")
    }

    pub fn user_agent(&self) -> &str {
        self.header_str(http::header::USER_AGENT).unwrap_or("")
    }

    /// Client address as seen through proxies.
    ///
    /// Takes the first hop of `X-Forwarded-For`, then `X-Real-IP`, then the
    /// connection peer. Returns an empty string when none is known.
    pub fn real_ip(&self) -> String {
        if let Some(xff) = self.header_str("x-forwarded-for") {
            let first = xff.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
        if let Some(xri) = self.header_str("x-real-ip").map(str::trim)
            && !xri.is_empty()
        {
            return xri.to_string();
        }
        self.remote_ip.map(|ip| ip.to_string()).unwrap_or_default()
    }

    pub fn header_str<K: http::header::AsHeaderName>(&self, name: K) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap<HeaderValue> {
        self.inner.headers_mut()
    }

    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }
}
