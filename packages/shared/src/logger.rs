//! Logger setup shared by the binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence. Without it, `default_level` applies to the
/// binary named `bin_name` and to the Mamalink crates, and everything else
/// logs at `warn`.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let bin_target = bin_name.replace('-', "_");
    let default_directive = format!(
        "warn,{bin_target}={default_level},mamalink_server={default_level},mamalink_client={default_level},mamalink_shared={default_level}"
    );

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second call (e.g. from tests) leaves the first subscriber in place.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
