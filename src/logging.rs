//! Log output for the command-line binary
//!
//! Logs go to stderr so JSON written to stdout stays machine-readable.
//! `RUST_LOG` overrides the level chosen from the `--verbose` flag.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "catalog_admin=debug"
    } else {
        "catalog_admin=warn"
    }
}

/// Installs the global subscriber; later calls are no-ops
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
