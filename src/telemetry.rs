use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

fn filter(verbosity_level: Level) -> EnvFilter {
    // RUST_LOG=
    EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
}

/// Install a JSON log subscriber for the timer events, meant for host
/// binaries; the library itself never calls this.
/// # Errors
/// Will return an error if a global subscriber is already set
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let verbosity_level = verbosity_level.unwrap_or(Level::ERROR);

    let fmt_layer = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .json();

    let subscriber = Registry::default()
        .with(fmt_layer)
        .with(filter(verbosity_level));

    Ok(tracing::subscriber::set_global_default(subscriber)?)
}
