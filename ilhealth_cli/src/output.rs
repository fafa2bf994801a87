use std::io::Write;

use anyhow::{bail, Result};
use ilhealth_lib::{EndpointDescriptor, Link, SubjectSummary, ToolDefinition};
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            other => bail!("Unknown output format '{}': expected table, json, csv or markdown", other),
        }
    }
}

#[derive(Tabled, Serialize)]
pub struct SubjectRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    #[serde(rename = "Description")]
    description: String,
}

#[derive(Tabled, Serialize)]
pub struct EndpointRow {
    #[tabled(rename = "Endpoint")]
    #[serde(rename = "Endpoint")]
    name: String,
    #[tabled(rename = "Returns")]
    #[serde(rename = "Returns")]
    shape: String,
    #[tabled(rename = "Parameters")]
    #[serde(rename = "Parameters")]
    parameters: String,
    #[tabled(rename = "Section")]
    #[serde(rename = "Section")]
    section: String,
    #[tabled(rename = "Map")]
    #[serde(rename = "Map")]
    map: String,
}

#[derive(Tabled, Serialize)]
pub struct LinkRow {
    #[tabled(rename = "Label")]
    #[serde(rename = "Label")]
    label: String,
    #[tabled(rename = "URL")]
    #[serde(rename = "URL")]
    url: String,
    #[tabled(rename = "Section")]
    #[serde(rename = "Section")]
    section: String,
}

#[derive(Tabled, Serialize)]
pub struct ToolRow {
    #[tabled(rename = "Tool")]
    #[serde(rename = "Tool")]
    name: String,
    #[tabled(rename = "Description")]
    #[serde(rename = "Description")]
    description: String,
}

// -- Row builders --

pub fn build_subject_rows(subjects: &[SubjectSummary]) -> Vec<SubjectRow> {
    subjects
        .iter()
        .map(|s| SubjectRow {
            id: s.id.clone(),
            name: s.display_name.clone(),
            description: s.description.clone(),
        })
        .collect()
}

pub fn build_endpoint_rows(endpoints: &[EndpointDescriptor]) -> Vec<EndpointRow> {
    endpoints
        .iter()
        .map(|e| EndpointRow {
            name: e.name.clone(),
            shape: e.response_shape_hint.to_string(),
            parameters: describe_parameters(e),
            section: e.section.clone().unwrap_or_default(),
            map: e.embed_link.clone().unwrap_or_default(),
        })
        .collect()
}

pub fn build_link_rows(links: &[Link]) -> Vec<LinkRow> {
    links
        .iter()
        .map(|l| LinkRow {
            label: l.label.clone(),
            url: l.url.clone(),
            section: l.section.clone().unwrap_or_default(),
        })
        .collect()
}

pub fn build_tool_rows(tools: &[ToolDefinition]) -> Vec<ToolRow> {
    tools
        .iter()
        .map(|t| ToolRow {
            name: t.name.clone(),
            description: t.description.clone(),
        })
        .collect()
}

/// `endPointName: path (required), lang: string = "he"`
fn describe_parameters(endpoint: &EndpointDescriptor) -> String {
    endpoint
        .allowed_parameters
        .iter()
        .map(|(name, spec)| {
            let mut text = format!("{}: {}", name, spec.param_type);
            if spec.required {
                text.push_str(" (required)");
            }
            if let Some(default) = &spec.default {
                text.push_str(&format!(" = {}", default));
            }
            text
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// -- Typed rows --

/// Commands usually print the domain value itself for JSON; the `Json` arm
/// here prints the flattened rows.
pub fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            let values = rows
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&values);
        }
    }
    Ok(())
}

// -- Dynamic records --

/// Column names across all records, in first-seen order.
pub fn record_columns(records: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if let Some(obj) = record.as_object() {
            for key in obj.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

/// Plain-text rendering of a single JSON value for a table cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn record_row(record: &Value, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| record.get(c).map(cell_text).unwrap_or_default())
        .collect()
}

pub fn records_table(records: &[Value]) -> Table {
    let columns = record_columns(records);
    let mut builder = Builder::default();
    builder.push_record(columns.clone());
    for record in records {
        builder.push_record(record_row(record, &columns));
    }
    builder.build()
}

pub fn write_records_csv<W: Write>(writer: W, records: &[Value]) -> Result<()> {
    let columns = record_columns(records);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&columns)?;
    for record in records {
        wtr.write_record(record_row(record, &columns))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_records(records: &[Value], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Csv => write_records_csv(std::io::stdout(), records)?,
        OutputFormat::Table | OutputFormat::Markdown if records.is_empty() => {
            println!("No records.");
        }
        OutputFormat::Table => println!("{}", records_table(records)),
        OutputFormat::Markdown => {
            let mut table = records_table(records);
            table.with(Style::markdown());
            println!("{}", table);
        }
    }
    Ok(())
}

/// Dashboard metadata is nested; only its top-level scalar fields fit a
/// table, so anything else is printed as JSON.
pub fn print_object(object: &Map<String, Value>, format: OutputFormat) -> Result<()> {
    let flat = object
        .values()
        .all(|v| !matches!(v, Value::Array(_) | Value::Object(_)));
    if flat && format != OutputFormat::Json {
        print_records(&[Value::Object(object.clone())], format)
    } else {
        print_json(object);
        Ok(())
    }
}

// -- JSON output --

pub fn print_json<T: Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
