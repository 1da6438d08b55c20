//! HTTP server facade for the BookStore API: Axum router assembly, error
//! mapping, and bearer-token middleware.

use anyhow::Context;
use axum::{routing::get, Router};

use bookstore_kernel::ModuleRegistry;

pub mod auth;
pub mod error;
pub mod router;

pub use auth::require_auth;
pub use error::{ApiError, FieldError};

use router::RouterBuilder;

/// Start the HTTP server with the given module registry
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &bookstore_kernel::settings::Settings,
) -> anyhow::Result<()> {
    let app = build_router(registry, settings);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", settings.server.host, settings.server.port))
            .await
            .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(
    registry: &ModuleRegistry,
    settings: &bookstore_kernel::settings::Settings,
) -> Router {
    let mut router_builder = RouterBuilder::new()
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms)
        .route("/", get(index))
        .route("/healthz", get(health_check));

    for module in registry.modules() {
        tracing::info!(module = module.name(), "mounting module routes");
        router_builder = router_builder.mount_module(module.name(), module.routes());
    }

    router_builder.with_openapi(registry).build()
}

async fn index() -> &'static str {
    "API running"
}

async fn health_check() -> &'static str {
    "ok"
}
