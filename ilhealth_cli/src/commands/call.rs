use anyhow::{Context, Result};
use clap::Args;
use ilhealth_lib::HealthTools;
use serde_json::Value;

use crate::output::print_json;

#[derive(Args)]
pub struct CallArgs {
    /// Tool name (see `ilhealth tools`)
    pub name: String,

    /// Tool arguments as a JSON object
    #[arg(long, default_value = "{}")]
    pub args: String,
}

/// Invokes a tool exactly as a host would and prints its JSON result.
/// Returns whether a `get_data` call succeeded; other tools always do.
pub async fn run(args: &CallArgs, tools: &HealthTools) -> Result<bool> {
    let arguments: Value =
        serde_json::from_str(&args.args).context("--args must be a JSON object")?;
    let result = tools.call_tool(&args.name, arguments).await?;
    print_json(&result);
    Ok(result
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(true))
}
