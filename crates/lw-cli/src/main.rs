use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lw_cli::commands::{discover, extract, merge, metrics};
use lw_cli::{Cli, Commands, Config};

/// Loads config and applies the global command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(year) = cli.year {
        config.year = Some(year);
    }
    if let Some(normalizer) = &cli.normalizer {
        config.normalizer.clone_from(normalizer);
    }
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr, command output to stdout
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Discover { root, json }) => {
            let config = load_config(&cli)?;
            discover::run(&mut out, root, *json, &config)?;
        }
        Some(Commands::Merge { root, rules }) => {
            let mut config = load_config(&cli)?;
            if let Some(rules) = rules {
                config.rules_path.clone_from(rules);
            }
            merge::run(&mut out, root, &config)?;
        }
        Some(Commands::Metrics { root, aligned }) => {
            let config = load_config(&cli)?;
            metrics::run(&mut out, root, *aligned, &config)?;
        }
        Some(Commands::Extract { file, patterns }) => {
            let config = load_config(&cli)?;
            extract::run(&mut out, file, patterns, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    out.flush()?;
    Ok(())
}
