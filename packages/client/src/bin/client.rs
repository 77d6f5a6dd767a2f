//! Mamalink chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin mamalink-client -- --user-id doctor123 --role doctor --counterpart patient456
//! ```

use clap::Parser;
use mamalink_client::{
    config::CliArgs, input::spawn_line_reader, run_session, view::TerminalView,
};
use mamalink_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let identity = config.session.identity.clone();
    println!(
        "Chatting as {} ({}) with {}. Type /quit to leave.",
        identity.local, identity.role, identity.counterpart
    );

    let input = spawn_line_reader(format!("{}> ", identity.local));
    let mut view = TerminalView::stdout(identity.counterpart);

    if let Err(e) = run_session(config, input, &mut view).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
