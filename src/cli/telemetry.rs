use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::cli::commands::logging::LogOptions;

/// Initialize logging on stderr so command output on stdout stays clean.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init(options: LogOptions) -> Result<()> {
    // RUST_LOG=
    let filter = EnvFilter::builder()
        .with_default_directive(options.level.into())
        .from_env_lossy();

    if options.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false);
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_target(false);
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
