use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Parser)]
#[command(name = "quinto")]
#[command(author, version, about = "Rental listing scraper for QuintoAndar", long_about = None)]
#[command(after_help = r#"Examples:
  quinto collect                          Collect listing URLs for the configured neighborhood
  quinto scrape                           Scrape every collected listing to CSV
  quinto parse saved.html --json          Run the extractor on a saved page
  quinto config init                      Write the default configuration

Quick Start:
  1. quinto config init
  2. quinto collect --pages 3
  3. quinto scrape
"#)]
pub struct Cli {
    /// Configuration file (default: QUINTO_CONFIG or the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect listing URLs from the search results
    #[command(after_help = r#"Examples:
  quinto collect                          Walk up to search.max_pages result pages
  quinto collect --pages 2 --limit 40     Stop early
  quinto collect --output urls.txt        Write somewhere else
"#)]
    Collect {
        /// Maximum number of result pages to walk
        #[arg(long)]
        pages: Option<usize>,

        /// Stop once this many URLs are known
        #[arg(long)]
        limit: Option<usize>,

        /// URL file to write (default: <output.dir>/urls/urls_<neighborhood>.txt)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Fetch and parse listings, then write them to CSV
    #[command(after_help = r#"Examples:
  quinto scrape                           Reuse or collect URLs, then scrape
  quinto scrape --urls urls.txt           Scrape a specific URL list
  quinto scrape --concurrency 4 --yes     Non-interactive, fewer workers
"#)]
    Scrape {
        /// URL file to read instead of collecting
        #[arg(long)]
        urls: Option<PathBuf>,

        /// CSV file to write (default: timestamped file under <output.dir>/data)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Listings fetched in parallel (overrides http.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Reuse an existing URL file without asking
        #[arg(long, short)]
        yes: bool,
    },

    /// Parse a saved listing page
    #[command(after_help = r#"Examples:
  quinto parse listing.html
  quinto parse listing.html --url https://www.quintoandar.com.br/imovel/123 --json
"#)]
    Parse {
        /// HTML file to parse
        #[arg(value_name = "HTML_FILE")]
        file: PathBuf,

        /// URL to record for this page
        #[arg(long)]
        url: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(after_help = r#"Examples:
  quinto completions bash > ~/.local/share/bash-completion/completions/quinto
  quinto completions zsh > ~/.zfunc/_quinto
  quinto completions fish > ~/.config/fish/completions/quinto.fish
"#)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scrape_flags() {
        let cli = Cli::try_parse_from(["quinto", "scrape", "--concurrency", "4", "-y", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Scrape { concurrency, yes, urls, .. } => {
                assert_eq!(concurrency, Some(4));
                assert!(yes);
                assert!(urls.is_none());
            }
            _ => panic!("expected scrape"),
        }
    }
}
