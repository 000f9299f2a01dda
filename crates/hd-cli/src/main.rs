use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hd_cli::commands::{diff, extract, groupe_profs};
use hd_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout carries only the report. Warnings
    // are on by default so ambiguous matches reach the operator.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Diff { before, after }) => {
            let config = Config::load_from(cli.config.as_deref())
                .context("failed to load configuration")?;
            tracing::debug!(?config, "loaded configuration");
            diff::run(&mut stdout.lock(), before, after, &config)?;
        }
        Some(Commands::Extract { dir }) => {
            extract::run(&mut stdout.lock(), dir)?;
        }
        Some(Commands::GroupeProfs { events, ue }) => {
            groupe_profs::run(&mut stdout.lock(), events, ue.as_deref())?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
