use anyhow::Result;
use ilhealth_lib::HealthTools;

use crate::output::{build_subject_rows, print_json, print_rows, OutputFormat};

pub fn run(tools: &HealthTools, format: OutputFormat) -> Result<()> {
    let subjects = tools.get_available_subjects();
    match format {
        OutputFormat::Json => print_json(&subjects),
        _ => print_rows(build_subject_rows(&subjects), format)?,
    }
    Ok(())
}
