mod commands;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ilhealth_lib::{ClientConfig, HealthTools};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "ilhealth")]
#[command(about = "Query the Israel Ministry of Health data dashboard")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available subjects
    Subjects,
    /// Show the endpoints of a subject
    Metadata(commands::metadata::MetadataArgs),
    /// Fetch data from a subject endpoint
    Data(commands::data::DataArgs),
    /// Show reference links for a subject
    Links(commands::links::LinksArgs),
    /// List the tool definitions offered to hosts
    Tools,
    /// Invoke a tool by name with JSON arguments
    Call(commands::call::CallArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ilhealth=info".parse::<tracing_subscriber::filter::Directive>()?),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output)?;

    let config = ClientConfig::from_env();
    tracing::debug!("Using dashboard API at {}", config.base_url);
    let tools = HealthTools::from_config(&config)?;

    if dispatch(&cli.command, &tools, format).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Runs one subcommand. `Ok(false)` means a data call came back unsuccessful.
async fn dispatch(command: &Commands, tools: &HealthTools, format: OutputFormat) -> Result<bool> {
    let succeeded = match command {
        Commands::Subjects => commands::subjects::run(tools, format).map(|_| true)?,
        Commands::Metadata(args) => commands::metadata::run(args, tools, format).map(|_| true)?,
        Commands::Data(args) => commands::data::run(args, tools, format).await?,
        Commands::Links(args) => commands::links::run(args, tools, format).map(|_| true)?,
        Commands::Tools => commands::tools::run(tools, format).map(|_| true)?,
        Commands::Call(args) => commands::call::run(args, tools).await?,
    };
    Ok(succeeded)
}
