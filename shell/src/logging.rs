//! Diagnostic tracing for the shell.
//!
//! Guard verdicts, chain skips and fast-path choices inside `cmdguard` are
//! emitted at `debug` and `trace`. They go to stderr so that command output
//! on stdout (plain lines or the `--json` report) stays machine readable.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "shell=debug,cmdguard=trace"
    } else {
        "warn"
    }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` shows every guard the
/// dispatcher runs.
///
/// ```bash
/// RUST_LOG=cmdguard=trace shell --user root group staff add bob
/// ```
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
