//! Console logging for the CLI.
//!
//! Logs go to stderr so stdout carries nothing but IDs (or decoded rows) and
//! can be piped safely. Verbosity follows `RUST_LOG`, defaulting to `info`;
//! `RUST_LOG=esnowflake=trace` shows per-call spans and pool refills from the
//! library.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .try_init()?;
    Ok(())
}
