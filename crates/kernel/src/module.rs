use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Trait implemented by every feature module of the application.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module; routes are mounted under `/api/{name}`.
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context.
    /// Called once during application startup, before the server binds.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return an OpenAPI specification fragment for this module as JSON.
    /// Fragments are merged into the application-wide document.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }
}
