//! Remy CLI entry point.

use clap::Parser;
use remy::cache::NotecardCache;
use remy::cli::args::{Cli, Commands, IndexCommands};
use remy::cli::{index, query};
use remy::config::UserConfig;
use remy::error::Result;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`/`-q`.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = UserConfig::load()?;
    let root = config.resolve_cache_path(cli.cache.as_deref())?;
    let mut cache = NotecardCache::open(root)?;

    match &cli.command {
        Commands::Query(args) => query::run(&mut cache, args),
        Commands::Index(IndexCommands::List(args)) => index::list(&cache, args),
        Commands::Index(IndexCommands::Dump(args)) => index::dump(&mut cache, args),
    }
}
