//! Tracing initialization

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// Logs always go to stderr; stdout belongs to the stdio JSON-RPC stream.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() -> anyhow::Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}
