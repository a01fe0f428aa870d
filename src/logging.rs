//! Tracing setup
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins if it's set; otherwise we
/// log at `info`, or at `debug` (including each HTTP request) when `debug` is
/// true. Logs go to stderr so `listset compare` output stays clean.
pub fn init(debug: bool) {
    let fallback = if debug { "listset=debug,tower_http=debug,info" } else { "listset=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
