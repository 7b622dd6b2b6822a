use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `level`; calling this
/// again once a subscriber is installed does nothing.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let formatter = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_level(true);

    if tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("[logging] subscriber already installed");
    }
}
