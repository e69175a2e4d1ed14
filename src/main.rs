//! closure-deps CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use closure_deps::cli::{Cli, Commands};
use closure_deps::commands::{run_cache, run_deps, run_resolve, CommandContext};
use closure_deps::config::DepsConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run(cli: Cli) -> closure_deps::Result<String> {
    let ctx = CommandContext::from_cli(cli.format, cli.verbose, cli.progress, cli.config);

    match &cli.command {
        Commands::Resolve(args) => run_resolve(args, &ctx),
        Commands::Deps(args) => run_deps(args, &ctx),
        Commands::Cache(args) => run_cache(args, &ctx),
    }
}

/// Logs go to stderr; stdout carries command output only
fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        configured_level(cli)
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("closure_deps={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// `[logging] level` from the configuration file, if it can be read
fn configured_level(cli: &Cli) -> String {
    let config = match &cli.config {
        Some(path) => DepsConfig::load_from(path),
        None => DepsConfig::load_default(),
    };
    config
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".to_string())
}
