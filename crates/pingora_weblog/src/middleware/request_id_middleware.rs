use crate::{
    core::{Handler, Request, Response},
    error::WebError,
    middleware::Middleware,
};
use http::HeaderValue;
use std::sync::Arc;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every exchange with a correlation id.
///
/// An inbound `x-request-id` is reused; otherwise a UUID v4 is generated.
/// The id is exposed to inner handlers through the request headers and
/// echoed on the response unless the handler already set one. Handler
/// errors are rendered into a response here so they carry the id as well.
#[derive(Clone)]
pub struct RequestId {
    header: &'static str,
}

impl RequestId {
    pub fn new() -> Self {
        Self {
            header: REQUEST_ID_HEADER,
        }
    }

    /// Use a different header name, e.g. `x-correlation-id`.
    pub fn with_header(header: &'static str) -> Self {
        Self { header }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

fn generate() -> HeaderValue {
    let id = uuid::Uuid::new_v4().simple().to_string();
    HeaderValue::from_str(&id).unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

#[async_trait::async_trait]
impl Middleware for RequestId {
    async fn handle(&self, mut req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        let request_id = req
            .headers()
            .get(self.header)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(generate);

        req.headers_mut().insert(self.header, request_id.clone());

        // Errors are rendered here so the id reaches error responses too.
        let mut res = match next.handle(req).await {
            Ok(res) => res,
            Err(err) => {
                let mut res = err.render();
                res.record_error(err);
                res
            }
        };
        if !res.headers.contains_key(self.header) {
            res.headers.insert(self.header, request_id);
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FnHandler, Method};

    fn echo_id() -> Arc<dyn Handler> {
        Arc::new(FnHandler::new(|req: Request| {
            let seen = req.header_str(REQUEST_ID_HEADER).unwrap_or("").to_string();
            Ok(Response::text(200, seen))
        }))
    }

    #[tokio::test]
    async fn generates_when_missing() {
        let res = RequestId::new()
            .handle(Request::new(Method::GET, "/"), echo_id())
            .await
            .unwrap();
        let id = res.header_str(REQUEST_ID_HEADER).expect("id on response");
        assert_eq!(id.len(), 32);
        assert_eq!(res.size(), 32);
    }

    #[tokio::test]
    async fn reuses_inbound_id() {
        let req = Request::new(Method::GET, "/").header(REQUEST_ID_HEADER, "abc123");
        let res = RequestId::new().handle(req, echo_id()).await.unwrap();
        assert_eq!(res.header_str(REQUEST_ID_HEADER), Some("abc123"));
    }

    #[tokio::test]
    async fn empty_inbound_id_is_replaced() {
        let req = Request::new(Method::GET, "/").header(REQUEST_ID_HEADER, "");
        let res = RequestId::new().handle(req, echo_id()).await.unwrap();
        let id = res.header_str(REQUEST_ID_HEADER).unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn error_responses_carry_the_id() {
        let handler: Arc<dyn Handler> =
            Arc::new(FnHandler::new(|_req: Request| Err(crate::error::not_found("gone"))));
        let res = RequestId::new()
            .handle(Request::new(Method::GET, "/"), handler)
            .await
            .expect("errors are rendered, not propagated");
        assert_eq!(res.status.as_u16(), 404);
        assert_eq!(res.header_str(REQUEST_ID_HEADER).map(str::len), Some(32));
        assert_eq!(res.recorded_error().map(|e| e.to_string()).as_deref(), Some("gone"));
    }

    #[tokio::test]
    async fn handler_id_wins() {
        let handler: Arc<dyn Handler> = Arc::new(FnHandler::new(|_req: Request| {
            Ok(Response::empty(204).header(REQUEST_ID_HEADER, "from-handler"))
        }));
        let res = RequestId::new()
            .handle(Request::new(Method::GET, "/"), handler)
            .await
            .unwrap();
        assert_eq!(res.header_str(REQUEST_ID_HEADER), Some("from-handler"));
    }
}
