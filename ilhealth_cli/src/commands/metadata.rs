use anyhow::Result;
use clap::Args;
use ilhealth_lib::HealthTools;

use crate::output::{build_endpoint_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct MetadataArgs {
    /// Subject id (see `ilhealth subjects`)
    pub subject: String,
}

pub fn run(args: &MetadataArgs, tools: &HealthTools, format: OutputFormat) -> Result<()> {
    let metadata = tools.get_metadata(&args.subject)?;
    match format {
        OutputFormat::Json => print_json(&metadata),
        _ => {
            if format == OutputFormat::Table {
                println!(
                    "{} ({}): {}",
                    metadata.subject.display_name, metadata.subject.id, metadata.subject.description
                );
            }
            print_rows(build_endpoint_rows(&metadata.endpoints), format)?;
        }
    }
    Ok(())
}
