//! Diagnostic logging setup.

use std::io;

use tracing_subscriber::EnvFilter;

/// Maps the `-v` count onto a default filter directive.
pub(crate) const fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs a stderr subscriber. `RUST_LOG` wins over the `-v` count.
///
/// Later calls in the same process keep the first subscriber.
pub(crate) fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .try_init();
}
