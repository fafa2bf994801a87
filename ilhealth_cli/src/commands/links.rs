use anyhow::Result;
use clap::Args;
use ilhealth_lib::HealthTools;

use crate::output::{build_link_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct LinksArgs {
    /// Subject id (see `ilhealth subjects`)
    pub subject: String,

    /// Only show links for this dashboard section
    #[arg(long)]
    pub section: Option<String>,
}

pub fn run(args: &LinksArgs, tools: &HealthTools, format: OutputFormat) -> Result<()> {
    let links = tools.get_links(&args.subject, args.section.as_deref())?;
    match format {
        OutputFormat::Json => print_json(&links),
        _ if links.is_empty() => println!("No links."),
        _ => print_rows(build_link_rows(&links), format)?,
    }
    Ok(())
}
