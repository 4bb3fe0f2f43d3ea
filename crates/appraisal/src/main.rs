//! Appraisal launcher

use anyhow::{Context, Result};
use appraisal::api;
use appraisal::{AppConfig, Pipeline};
use appraisal_logging::{init_logging, LogConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "appraisal", version, about = "Housing batch ETL and price prediction")]
struct Cli {
    /// Enable verbose logging (debug to stderr and log file)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ~/.appraisal/appraisal.toml)
    #[arg(long, global = true, env = "APPRAISAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one batch through validate, transform, predict and persist
    Run {
        /// CSV file to process instead of the configured input file
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Serve the HTTP adapter
    Serve {
        /// Address to bind instead of the configured one
        #[arg(long)]
        bind: Option<String>,
    },

    /// Create the raw_data and predictions tables
    InitDb,

    /// Show the resolved configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(LogConfig {
        app_name: "appraisal",
        verbose: cli.verbose,
        log_dir: config.log_dir.clone(),
    }) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: {:#}", e);
            None
        }
    };

    match run_command(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_command(command: Commands, config: AppConfig) -> Result<()> {
    match command {
        Commands::Config { json } => show_config(&config, json),
        command => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(run_async(command, config))
        }
    }
}

async fn run_async(command: Commands, config: AppConfig) -> Result<()> {
    match command {
        Commands::Run { input } => {
            let pipeline = Pipeline::from_config(config).context("Failed to set up pipeline")?;
            pipeline.initialize().await?;
            let outcome = match input {
                Some(path) => pipeline.run_file(&path).await,
                None => pipeline.run().await,
            }
            .context("Batch run failed")?;
            println!(
                "Batch {}: {} raw rows, {} transformed rows, {} predictions",
                outcome.batch_id, outcome.raw_rows, outcome.transformed_rows, outcome.predictions
            );
            Ok(())
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let pipeline = Pipeline::from_config(config).context("Failed to set up pipeline")?;
            pipeline.initialize().await?;
            api::serve(Arc::new(pipeline), &bind)
                .await
                .with_context(|| format!("HTTP adapter on {} failed", bind))
        }
        Commands::InitDb => {
            let store = appraisal_db::Store::new(
                appraisal_db::StoreConfig::new(&config.db_path)
                    .with_busy_timeout(config.busy_timeout()),
            )?;
            appraisal_db::initialize_database(&store, None).await?;
            println!("Initialized {}", config.db_path.display());
            Ok(())
        }
        Commands::Config { json } => show_config(&config, json),
    }
}

fn show_config(config: &AppConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}
