use anyhow::Context as _;
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use weekplan::cli::commands::{Cli, Commands};
use weekplan::cli::{self, Context};
use weekplan::config::{AppConfig, DEFAULT_LOG_FILTER, LOG_ENV};

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(anyhow::Error::msg)
        .context("failed to install log subscriber")
}

fn main() {
    if let Err(e) = init_logging() {
        eprintln!("warning: {e:#}");
    }

    let cli_args = Cli::parse();
    let json_output = cli_args.json;

    let config = match AppConfig::resolve(cli_args.db) {
        Ok(config) => config,
        Err(e) => process::exit(cli::finish(Err(e), json_output)),
    };
    let ctx = Context {
        json: json_output,
        db_path: config.db_path,
    };

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(&ctx),
        Commands::Plan(cmd) => cli::plan::run(cmd, &ctx),
        Commands::Day(cmd) => cli::day::run(cmd, &ctx),
        Commands::Settings(cmd) => cli::settings::run(cmd, &ctx),
        Commands::Status => cli::status::run(&ctx),
    };

    process::exit(exit_code);
}
