pub mod core;
pub mod error;
pub mod logging;
pub mod middleware;

pub use crate::core::*;
pub use error::{ResponseError, WebError};
pub use http::StatusCode;
pub use logging::*;
pub use middleware::*;

use async_trait::async_trait;
use futures::StreamExt;
use http::Response as HttpResponse;
use pingora::protocols::http::ServerSession;
use pingora::server::ShutdownWatch;
use pingora_core::apps::{HttpPersistentSettings, HttpServerApp, HttpServerOptions, ReusedHttpStream};
use pingora_http::ResponseHeader;
use std::sync::Arc;

/// Router plus the middleware stack wrapped around it.
pub struct App {
    router: Router,
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
}

struct NotFound;

#[async_trait]
impl Handler for NotFound {
    async fn handle(&self, _req: Request) -> Result<Response, WebError> {
        Err(error::not_found("Not Found"))
    }
}

struct MethodNotAllowed {
    allow: String,
}

#[async_trait]
impl Handler for MethodNotAllowed {
    async fn handle(&self, _req: Request) -> Result<Response, WebError> {
        Ok(Response::text(405, "Method Not Allowed").header(http::header::ALLOW, self.allow.as_str()))
    }
}

impl App {
    /// New app around `router`. A [`RequestId`] middleware is installed first,
    /// so it sits innermost and every later middleware sees its response header.
    pub fn new(router: Router) -> Self {
        let mut app = Self {
            router,
            middlewares: Vec::new(),
        };
        app.use_middleware(RequestId::default());
        app
    }

    /// Register a middleware. Later registrations wrap earlier ones.
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    fn endpoint(&self, req: &Request) -> (Arc<dyn Handler>, std::collections::HashMap<String, String>) {
        if let Some(found) = self.router.find(req.method(), req.path()) {
            return found;
        }
        let allowed = self.router.allowed_methods(req.path());
        if allowed.is_empty() {
            return (Arc::new(NotFound), Default::default());
        }
        let h = MethodNotAllowed {
            allow: allowed.join(", "),
        };
        (Arc::new(h), Default::default())
    }

    /// Run a request through the middleware stack and router.
    ///
    /// Unmatched paths become 404 and wrong methods 405, both still passing
    /// through every middleware. Errors nothing handled are rendered here.
    pub async fn handle(&self, req: Request) -> Response {
        let (handler, params) = self.endpoint(&req);
        let entry = compose(&self.middlewares, handler);

        let mut response = match entry.handle(req.with_params(params)).await {
            Ok(res) => res,
            Err(err) => err.into_response(),
        };
        finalize_response_headers(&mut response);
        response
    }
}

/// Set content-length or transfer-encoding unless the handler already did
fn finalize_response_headers(response: &mut Response) {
    if response.headers.contains_key(http::header::CONTENT_LENGTH)
        || response.headers.contains_key(http::header::TRANSFER_ENCODING)
    {
        return;
    }

    match &response.body {
        Body::Bytes(bytes) => {
            response
                .headers
                .insert(http::header::CONTENT_LENGTH, http::HeaderValue::from(bytes.len()));
        }
        Body::Stream(_) => {
            response.headers.insert(
                http::header::TRANSFER_ENCODING,
                http::HeaderValue::from_static("chunked"),
            );
        }
    }
}

#[async_trait]
impl HttpServerApp for App {
    async fn process_new_http(
        self: &Arc<Self>,
        mut http: ServerSession,
        shutdown: &ShutdownWatch,
    ) -> Option<ReusedHttpStream> {
        if !(http.read_request().await.ok()?) {
            return None;
        }
        if *shutdown.borrow() {
            http.set_keepalive(None);
        } else {
            http.set_keepalive(Some(60));
        }

        let reqh = http.req_header();
        let path = String::from_utf8_lossy(reqh.raw_path()).to_string();
        let is_head = reqh.method == http::Method::HEAD;

        let mut req = Request::new(reqh.method.clone(), path);
        for (name, value) in reqh.headers.iter() {
            if let Ok(v) = value.to_str() {
                req = req.header(name.as_str(), v);
            }
        }
        if let Some(peer) = http.client_addr().and_then(|a| a.as_inet()) {
            req = req.with_remote_ip(peer.ip());
        }

        if !is_head {
            let has_te = req.headers().contains_key(http::header::TRANSFER_ENCODING);
            let has_len = req
                .header_str(http::header::CONTENT_LENGTH)
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0)
                > 0;
            if (has_te || has_len)
                && let Ok(Some(bytes)) = http.read_request_body().await
            {
                req = req.with_body(bytes);
            }
        }

        let res = self.handle(req).await;

        let mut builder = HttpResponse::builder().status(res.status);
        for (k, v) in res.headers.iter() {
            builder = builder.header(k, v);
        }
        let parts = match builder.body(()) {
            Ok(r) => r.into_parts().0,
            Err(e) => {
                tracing::error!(error = %e, "failed to build response header");
                return None;
            }
        };
        let resp_header: ResponseHeader = parts.into();
        if http
            .write_response_header(Box::new(resp_header))
            .await
            .is_err()
        {
            return None;
        }

        if !is_head {
            match res.body {
                Body::Bytes(bytes) => {
                    let _ = http.write_response_body(bytes, true).await;
                }
                Body::Stream(mut s) => {
                    while let Some(chunk) = s.next().await {
                        if http.write_response_body(chunk, false).await.is_err() {
                            break;
                        }
                    }
                    let _ = http.write_response_body(bytes::Bytes::new(), true).await;
                }
            }
        }

        let persistent_settings = HttpPersistentSettings::for_session(&http);
        match http.finish().await {
            Ok(c) => c.map(|s| ReusedHttpStream::new(s, Some(persistent_settings))),
            Err(_) => None,
        }
    }

    fn h2_options(&self) -> Option<pingora::protocols::http::v2::server::H2Options> {
        None
    }

    fn server_options(&self) -> Option<&HttpServerOptions> {
        None
    }
}
