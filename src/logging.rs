use crate::config::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber. JSON formatting when `logger_enabled`
/// is true (the production/container-friendly path), a compact
/// human-readable layer otherwise; `RUST_LOG` overrides the environment's
/// default filter when set.
pub fn init(env: Environment, logger_enabled: bool) {
    let default_filter = if env.is_production() { "info" } else { "debug" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if logger_enabled {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer().compact();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}
