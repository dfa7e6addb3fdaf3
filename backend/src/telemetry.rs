//! Telemetry initialization: tracing subscriber with env-based filtering.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` applies to this
/// crate with sqlx query logging capped at info.
pub fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "gatekeeper_backend={default_level},sqlx::query=info"
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
