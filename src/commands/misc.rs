//! Config and shell-completion commands

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use colored::Colorize;

use quinto::cli::{Cli, CompletionShell};
use quinto::config::Config;
use quinto::error::{QuintoError, Result};

/// Generate shell completions
pub fn cmd_completions(shell: CompletionShell) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => Shell::Bash,
        CompletionShell::Zsh => Shell::Zsh,
        CompletionShell::Fish => Shell::Fish,
        CompletionShell::Powershell => Shell::PowerShell,
    };
    generate(shell, &mut cmd, "quinto", &mut io::stdout());
    Ok(())
}

/// Write the default configuration
pub fn cmd_config_init(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::config_path()?,
    };

    if path.exists() && !force {
        return Err(QuintoError::ConfigError(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(&path)?;
    println!("{} Wrote default config to {}", "✓".green(), path.display().to_string().cyan());
    Ok(())
}

/// Print the effective configuration as TOML
pub fn cmd_config_show(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
