//! ModInfo CLI entry point.
//!
//! This binary provides the command-line interface for ModInfo.

use clap::Parser;
use modinfo::cli::{Cli, Commands};
use modinfo::{Blueprint, Config, Inspector, ModInfoError};
use std::error::Error;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            let code = e
                .downcast_ref::<ModInfoError>()
                .map_or(1, ModInfoError::exit_code);

            if e
                .downcast_ref::<ModInfoError>()
                .is_some_and(ModInfoError::is_environment_fault)
            {
                tracing::error!(error = %e, "Environment fault, aborting");
            } else {
                tracing::error!(error = %e, "Fatal error");
            }

            eprintln!("Error: {e}");

            // Print error chain (cause chain)
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // First try to use RUST_LOG from environment, otherwise use verbose flag
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let base_level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            // modinfo at the requested level, everything else at warn
            EnvFilter::new(format!("warn,modinfo={base_level}"))
        })
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::debug!("Loading configuration");
    let mut config = load_config(&cli)?;
    config.merge_cli_args(&cli.overrides);

    match cli.command {
        Commands::Inspect(args) => {
            let inspector = Inspector::new(config);

            let reports = inspector.inspect_all(&args.sources).await?;

            let report = inspector.render(&reports, args.format)?;
            if let Some(output_path) = args.output {
                std::fs::write(&output_path, &report)?;
                tracing::info!(path = %output_path.display(), "Report written");
            } else {
                println!("{report}");
            }

            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate(args) => {
            let content = std::fs::read_to_string(&args.blueprint)?;
            let blueprint = Blueprint::from_yaml(&content, &args.blueprint)?;
            let inspector = Inspector::new(config);

            match inspector.validate(&blueprint).await {
                Ok(reports) => {
                    if args.show_modules {
                        println!("{}", inspector.render(&reports, args.format)?);
                    }
                    println!(
                        "Blueprint is valid: {} ({} modules)",
                        args.blueprint.display(),
                        reports.len()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                // the error itself lists every problem
                Err(e) => Err(e.into()),
            }
        }

        Commands::Init => {
            let config_path = std::path::Path::new("modinfo.yaml");
            if config_path.exists() {
                anyhow::bail!("Configuration file already exists: {}", config_path.display());
            }

            std::fs::write(config_path, Config::example_yaml())?;
            println!("Created example configuration: modinfo.yaml");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(ref config_path) = cli.config {
        tracing::debug!(path = %config_path.display(), "Loading configuration from explicit path");
        let content = std::fs::read_to_string(config_path)?;
        return Ok(Config::from_yaml(&content)?);
    }

    let default_paths = ["modinfo.yaml", "modinfo.yml", ".modinfo.yaml"];
    for path in &default_paths {
        if std::path::Path::new(path).exists() {
            tracing::debug!(path = %path, "Found configuration file");
            let content = std::fs::read_to_string(path)?;
            return Ok(Config::from_yaml(&content)?);
        }
    }

    tracing::debug!("No configuration file found, using default configuration");
    Ok(Config::default())
}
