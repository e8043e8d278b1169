mod cmd;
mod config;
mod error;

use clap::Parser;
use config::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Paths(args) => cmd::paths::run(args),
        Commands::Layout(args) => cmd::layout::run(&cli.config, args),
        Commands::CheckConfig => cmd::check_config::run(&cli.config),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
