use async_trait::async_trait;
use pingora::server::Server;
use pingora::services::listening::Service;
use pingora_weblog::{
    App, AtomicLevel, Handler, Level, LogConfig, LoggerOption, LoggingMiddleware, Method, Request,
    Response, Router, WebError, error,
};
use std::sync::Arc;

struct UserHandler;

#[async_trait]
impl Handler for UserHandler {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        let id = req.param("id").unwrap_or("");
        tracing::debug!(id, "looking up user");
        match id {
            "1" => Ok(Response::json(
                200,
                serde_json::json!({ "id": 1, "name": "ada" }),
            )),
            _ => Err(error::not_found(format!("user {id} not found"))),
        }
    }
}

struct SlowHandler;

#[async_trait]
impl Handler for SlowHandler {
    async fn handle(&self, _req: Request) -> Result<Response, WebError> {
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        Ok(Response::text(200, "done"))
    }
}

/// `PUT /admin/level/{level}` retunes the shared threshold at runtime.
fn level_route(router: &mut Router, level: AtomicLevel) {
    router.add_fn(Method::PUT, "/admin/level/{level}", move |req| {
        let next: Level = req
            .param("level")
            .unwrap_or("")
            .parse()
            .map_err(error::bad_request)?;
        level.set_level(next);
        tracing::info!(level = %next, "log level changed");
        Ok(Response::empty(204))
    });
}

fn main() -> std::io::Result<()> {
    let config = match LogConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => panic!("weblog_demo: {e}"),
    };
    let (level, logger) = match config.try_build(vec![LoggerOption::Name("app".into())]) {
        Ok(built) => built,
        Err(e) => panic!("weblog_demo: {e}"),
    };
    if let Err(e) = logger.install_global() {
        panic!("weblog_demo: {e}");
    }

    let mut router = Router::new();
    router.get_fn("/", |_req| Ok(Response::text(200, "ok")));
    router.get_fn("/old", |_req| Ok(Response::redirect(301, "/")));
    router.get("/users/{id}", Arc::new(UserHandler));
    router.get("/slow", Arc::new(SlowHandler));
    router.get_fn("/fail", |_req| Err(error::internal_error("simulated failure")));
    level_route(&mut router, level.clone());

    let mut app = App::new(router);
    app.use_middleware(LoggingMiddleware::from_level(level));

    let addr = std::env::var("WEBLOG_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    tracing::info!(%addr, preset = ?logger.preset(), "starting weblog demo");

    let mut server = Server::new(None).map_err(|e| std::io::Error::other(e.to_string()))?;
    server.bootstrap();

    let mut service = Service::new("weblog demo".to_string(), app);
    service.add_tcp(&addr);
    server.add_service(service);

    server.run_forever()
}
