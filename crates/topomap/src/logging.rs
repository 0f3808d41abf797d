use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Install the global subscriber
///
/// Logs go to stderr so the SVG document can be piped from stdout. `RUST_LOG`
/// overrides the default `info` level.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    // Ignore the error if a subscriber is already installed (tests)
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
