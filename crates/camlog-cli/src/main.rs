use std::io::stdout;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use camlog_cli::commands::{merge, scan};
use camlog_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
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
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Merge { input, output }) => {
            let config = load_config(cli.config.as_deref())?;
            merge::run(
                &mut stdout().lock(),
                input,
                output.as_deref(),
                &config,
                cli.quiet,
            )?;
        }
        Some(Commands::Scan { input, json }) => {
            let config = load_config(cli.config.as_deref())?;
            scan::run(&mut stdout().lock(), input, &config, *json)?;
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
