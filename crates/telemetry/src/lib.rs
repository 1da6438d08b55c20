//! Tracing/logging bootstrap for the BookStore API.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use bookstore_kernel::settings::{LogFormat, TelemetrySettings};

/// Initialize the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` when set, defaulting to `info`. The output
/// format comes from configuration so production deployments can switch to
/// structured JSON without a rebuild.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match settings.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    result.map_err(|err| anyhow!("failed to initialize tracing subscriber: {err}"))
}
