use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{Handler, Request, Response};
use crate::error::WebError;

/// A layer around the rest of the handler chain
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Process the request, optionally calling `next`
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError>;
}

/// Binds a middleware to the handler it wraps
struct Layered {
    middleware: Arc<dyn Middleware>,
    next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for Layered {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        self.middleware.handle(req, Arc::clone(&self.next)).await
    }
}

/// Wrap `endpoint` in `middlewares`, onion style.
///
/// The last registered middleware ends up outermost and sees the request first.
pub fn compose(middlewares: &[Arc<dyn Middleware>], endpoint: Arc<dyn Handler>) -> Arc<dyn Handler> {
    middlewares.iter().fold(endpoint, |next, middleware| {
        Arc::new(Layered {
            middleware: Arc::clone(middleware),
            next,
        }) as Arc<dyn Handler>
    })
}
