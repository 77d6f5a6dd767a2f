//! Mamalink relay server.
//!
//! Routes consultation chat events between registered doctors and patients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin mamalink-server -- --port 8080
//! ```

use clap::Parser;
use mamalink_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(version, about = "Mamalink consultation chat relay")]
struct Args {
    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Run the server
    if let Err(e) = mamalink_server::run(&args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
