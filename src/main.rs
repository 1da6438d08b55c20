use anyhow::Context;
use bookstore_app::{modules, AppState};
use bookstore_kernel::{InitCtx, ModuleRegistry, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookstore settings")?;

    bookstore_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        "bookstore bootstrap starting"
    );

    let state = AppState::from_settings(&settings);

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &state);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;

    bookstore_http::start_server(&registry, &settings).await
}
