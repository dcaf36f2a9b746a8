//! cloudplat CLI: declarative cloud stacks.

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cloudplat",
    version,
    about = "Declarative cloud stacks: ordered descriptors, output references, provider adapters"
)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace); RUST_LOG overrides
    #[arg(
        long,
        global = true,
        default_value = "warn",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,

    #[command(subcommand)]
    command: cloudplat::cli::Commands,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = cloudplat::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
