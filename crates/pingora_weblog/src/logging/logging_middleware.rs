use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::core::{Handler, Method, Request, Response};
use crate::error::WebError;
use crate::logging::{AccessRecord, AtomicLevel, Logger, classify, new_logger};
use crate::middleware::{Middleware, REQUEST_ID_HEADER};

/// Emits one access record per request once the inner chain has finished.
///
/// Handler errors are rendered into the response and recorded on it with
/// [`Response::record_error`]; this middleware itself never fails.
pub struct LoggingMiddleware {
    logger: Arc<dyn Logger>,
}

impl LoggingMiddleware {
    pub fn new<L: Logger + 'static>(logger: L) -> Self {
        Self {
            logger: Arc::new(logger),
        }
    }

    /// Build a dedicated logger for `level` and log through it.
    pub fn from_level(level: AtomicLevel) -> Self {
        Self::new(new_logger(&level, Vec::new()))
    }
}

/// Request-side fields, taken before the request is handed down the chain.
struct RequestSnapshot {
    remote_ip: String,
    host: String,
    request: String,
    user_agent: String,
    inbound_request_id: Option<String>,
    // HEAD responses are sent without a body
    bodyless: bool,
}

impl RequestSnapshot {
    fn capture(req: &Request) -> Self {
        Self {
            remote_ip: req.real_ip(),
            host: req.host().to_string(),
            request: format!("{} {}", req.method(), req.request_uri()),
            user_agent: req.user_agent().to_string(),
            inbound_request_id: req.header_str(REQUEST_ID_HEADER).map(str::to_string),
            bodyless: *req.method() == Method::HEAD,
        }
    }

    fn into_record(self, latency: Duration, res: &Response) -> AccessRecord {
        let status = res.status.as_u16();
        let (level, message) = classify(status);

        // The response id is consulted only when the request carried none.
        // A non-empty inbound id therefore yields no request_id field at all.
        let request_id = match self.inbound_request_id.as_deref() {
            Some(id) if !id.is_empty() => None,
            _ => Some(res.header_str(REQUEST_ID_HEADER).unwrap_or("").to_string()),
        };

        AccessRecord {
            level,
            message,
            remote_ip: self.remote_ip,
            latency,
            host: self.host,
            request: self.request,
            status,
            size: if self.bodyless { 0 } else { res.size() },
            user_agent: self.user_agent,
            request_id,
        }
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        let start = Instant::now();
        let snapshot = RequestSnapshot::capture(&req);

        let res = match next.handle(req).await {
            Ok(res) => res,
            Err(err) => {
                let mut res = err.render();
                res.record_error(err);
                res
            }
        };

        let record = snapshot.into_record(start.elapsed(), &res);
        self.logger.log(&record);
        Ok(res)
    }
}
