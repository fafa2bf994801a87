use anyhow::Result;
use ilhealth_lib::HealthTools;

use crate::output::{build_tool_rows, print_json, print_rows, OutputFormat};

pub fn run(tools: &HealthTools, format: OutputFormat) -> Result<()> {
    let definitions = tools.tool_definitions();
    match format {
        OutputFormat::Json => print_json(&definitions),
        _ => print_rows(build_tool_rows(&definitions), format)?,
    }
    Ok(())
}
