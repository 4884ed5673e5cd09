//! quinto - rental listing scraper for QuintoAndar

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use quinto::cli::{Cli, Commands, ConfigCommands};
use quinto::config::Config;
use quinto::error::Result;

mod commands;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(hint) = e.hint() {
            eprintln!("\n{}", hint.dimmed());
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "quinto=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Completions and `config init` must work even with a broken config file
    match cli.command {
        Commands::Completions { shell } => return commands::cmd_completions(shell),
        Commands::Config(ConfigCommands::Init { force }) => {
            return commands::cmd_config_init(cli.config.as_deref(), force)
        }
        _ => {}
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Collect { pages, limit, output } => {
            commands::cmd_collect(&config, pages, limit, output)
        }
        Commands::Scrape { urls, output, concurrency, yes } => {
            commands::cmd_scrape(&config, urls, output, concurrency, yes)
        }
        Commands::Parse { file, url, json } => commands::cmd_parse(&config, &file, url, json),
        Commands::Config(ConfigCommands::Show) => commands::cmd_config_show(&config),
        Commands::Completions { .. } | Commands::Config(ConfigCommands::Init { .. }) => Ok(()),
    }
}
