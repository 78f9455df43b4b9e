mod auth;
mod backlog;
mod cli;
mod config;
mod model;
mod priority;
mod providers;
mod reconcile;
mod sheets;
mod sync;
mod teams;
mod versions;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli.run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
