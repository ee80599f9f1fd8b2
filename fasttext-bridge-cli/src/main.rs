//! ftbridge entry point

use clap::Parser;
use fasttext_bridge::FastTextEngine;
use fasttext_bridge_cli::{run, Cli};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = fasttext_bridge::logging::init_logging(cli.log.as_deref()) {
        eprintln!("ftbridge: {}", e);
        std::process::exit(1);
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    if let Err(e) = run::<FastTextEngine, _, _>(&cli.command, stdin.lock(), stdout.lock()) {
        tracing::error!("{:#}", e);
        eprintln!("ftbridge: {:#}", e);
        std::process::exit(1);
    }
}
