use anyhow::{anyhow, bail, Result};
use clap::Args;
use ilhealth_lib::{DataRequest, EndpointDescriptor, HealthTools, ResultData};
use serde_json::Value;

use crate::output::{print_json, print_object, print_records, OutputFormat};

#[derive(Args)]
pub struct DataArgs {
    /// Subject id (see `ilhealth subjects`)
    pub subject: String,

    /// Endpoint name (see `ilhealth metadata <subject>`); dashboard cards are
    /// fetched with `card --param endPointName=<path>`
    pub endpoint: String,

    /// Endpoint parameter as name=value; repeat for several
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,
}

/// Returns whether the upstream call succeeded.
pub async fn run(args: &DataArgs, tools: &HealthTools, format: OutputFormat) -> Result<bool> {
    let endpoint = tools
        .catalog()
        .get_endpoint(&args.subject, &args.endpoint)
        .ok();

    let mut request = DataRequest::new(&args.subject, &args.endpoint);
    for raw in &args.params {
        let (name, value) = parse_param(raw, endpoint)?;
        request = request.with_parameter(&name, value);
    }

    let result = tools.get_data(&request).await?;

    if format == OutputFormat::Json {
        print_json(&result);
        return Ok(result.is_success());
    }

    match (result.data(), result.error()) {
        (Some(ResultData::Records(records)), _) => print_records(records, format)?,
        (Some(ResultData::Metadata(object)), _) => print_object(object, format)?,
        (None, Some(err)) => eprintln!(
            "{} failed: {:?}: {}",
            result.source_endpoint().path,
            err.kind,
            err.detail
        ),
        (None, None) => {}
    }
    Ok(result.is_success())
}

/// Parses `name=value`, typing the value by the endpoint's declared
/// parameter type. Names the endpoint doesn't declare stay strings and are
/// rejected later by validation.
pub fn parse_param(raw: &str, endpoint: Option<&EndpointDescriptor>) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid --param '{}': expected NAME=VALUE", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid --param '{}': empty name", raw);
    }

    let spec = endpoint.and_then(|e| e.allowed_parameters.get(name));
    let value = match spec {
        Some(spec) => spec.param_type.parse_str(value).ok_or_else(|| {
            anyhow!(
                "Invalid --param {}: '{}' is not a valid {}",
                name,
                value,
                spec.param_type
            )
        })?,
        None => Value::String(value.to_string()),
    };
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilhealth_lib::catalog::parse_catalog;
    use ilhealth_lib::Catalog;
    use serde_json::json;

    const YAML: &str = r#"
subjects:
  - id: beaches
    display_name: Beaches
    description: x
    endpoints:
      - name: waterSamples
        remote_path_template: "beaches/waterSamples/{beachId}"
        response_shape_hint: records
        allowed_parameters:
          beachId:
            type: integer
            required: true
          lang:
            type: string
            default: he
"#;

    fn water_samples(catalog: &Catalog) -> &EndpointDescriptor {
        catalog.get_endpoint("beaches", "waterSamples").unwrap()
    }

    #[test]
    fn test_parse_param_typed_by_schema() {
        let catalog = parse_catalog(YAML).unwrap();
        let ep = water_samples(&catalog);
        assert_eq!(
            parse_param("beachId=42", Some(ep)).unwrap(),
            ("beachId".to_string(), json!(42))
        );
        assert_eq!(
            parse_param("lang=en", Some(ep)).unwrap(),
            ("lang".to_string(), json!("en"))
        );
    }

    #[test]
    fn test_parse_param_bad_integer() {
        let catalog = parse_catalog(YAML).unwrap();
        let err = parse_param("beachId=north", Some(water_samples(&catalog))).unwrap_err();
        assert!(err.to_string().contains("not a valid integer"));
    }

    #[test]
    fn test_parse_param_card_path_stays_whole() {
        let catalog = Catalog::load_builtin().unwrap();
        let card = catalog.get_endpoint("beaches", "card").unwrap();
        assert_eq!(
            parse_param("endPointName=beaches/seasonSummary", Some(card)).unwrap(),
            ("endPointName".to_string(), json!("beaches/seasonSummary"))
        );
    }

    #[test]
    fn test_parse_param_value_may_contain_equals() {
        let (name, value) = parse_param("q=a=b", None).unwrap();
        assert_eq!(name, "q");
        assert_eq!(value, json!("a=b"));
    }

    #[test]
    fn test_parse_param_undeclared_stays_string() {
        let catalog = parse_catalog(YAML).unwrap();
        let (_, value) = parse_param("color=7", Some(water_samples(&catalog))).unwrap();
        assert_eq!(value, json!("7"));
    }

    #[test]
    fn test_parse_param_requires_equals() {
        assert!(parse_param("beachId", None).is_err());
        assert!(parse_param("=5", None).is_err());
    }
}
