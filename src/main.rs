//! Tidemark CLI entry point.
//!
//! This binary provides the command-line interface for Tidemark.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use tidemark::cli::{CheckArgs, Cli, Commands};
use tidemark::{Config, Linter, TidemarkError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");

            eprintln!("Error: {e}");

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

            let code = e
                .downcast_ref::<TidemarkError>()
                .map_or(1, TidemarkError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over the verbosity flag
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let base_level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,tidemark={base_level}"))
        })
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::debug!("Loading configuration");
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Check(args) => {
            config.merge_cli_args(&args);
            config.validate()?;
            check(config, &args, cli.quiet).await
        }

        Commands::Rules => {
            let linter = Linter::new(config);
            for rule in linter.rules() {
                println!(
                    "{:<28} {:<8} enabled={}",
                    rule.name(),
                    rule.severity().to_string(),
                    rule.enabled()
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Init => {
            let config_path = Path::new("tidemark.yaml");
            if config_path.exists() {
                anyhow::bail!("Configuration file already exists: {}", config_path.display());
            }

            std::fs::write(config_path, Config::example_yaml())?;
            println!("Created example configuration: tidemark.yaml");
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate(args) => match Config::from_file(&args.config) {
            Ok(_) => {
                println!("Configuration is valid: {}", args.config.display());
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Configuration error: {e}");
                Ok(ExitCode::from(1))
            }
        },
    }
}

async fn check(config: Config, args: &CheckArgs, quiet: bool) -> anyhow::Result<ExitCode> {
    let linter = Linter::new(config.clone()).with_rules(&args.rules)?;
    let result = linter.check_paths(&args.effective_paths()).await?;

    let reporter = tidemark::reporter::Reporter::new(&config);
    let report = reporter.generate(&result, args.format)?;

    if let Some(output_path) = &args.output {
        std::fs::write(output_path, &report)
            .map_err(|e| TidemarkError::io(output_path, e, file!(), line!()))?;
        tracing::info!(path = %output_path.display(), "Report written");
    } else if !quiet || !result.diagnostics.is_empty() {
        println!("{report}");
    }

    let exit_code = if args.strict && result.has_warnings() {
        1
    } else {
        0
    };

    Ok(ExitCode::from(exit_code))
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(config_path) = &cli.config {
        tracing::debug!(path = %config_path.display(), "Loading configuration from explicit path");
        return Ok(Config::from_file(config_path)?);
    }

    if let Some(path) = Config::discover() {
        return Ok(Config::from_file(&path)?);
    }

    tracing::debug!("No configuration file found, using default configuration");
    Ok(Config::default())
}
