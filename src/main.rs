use clap::Parser;
use quickfill::cli::{run, Quickfill};
use quickfill::config::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Quickfill::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
