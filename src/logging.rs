//! Diagnostics go to stderr so stdout carries only replies and notices.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV_VAR: &str = "MASTERMIND_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. `MASTERMIND_LOG` takes precedence over
/// `RUST_LOG`; an unparsable directive falls back to `warn`.
pub fn init() {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install log subscriber: {error}");
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
