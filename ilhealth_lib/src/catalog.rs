//! Subject catalog: the closed set of dashboard subjects and their endpoints.
//!
//! The catalog is declared in a YAML seed table embedded at compile time and
//! validated once on load. It is read-only afterwards and is the only place
//! remote paths are defined.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::ResolveError;

/// Error types for catalog loading.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse subject catalog YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate subject id: {0}")]
    DuplicateSubject(String),
    #[error("Subject '{0}' declares no endpoints")]
    EmptySubject(String),
    #[error("Duplicate endpoint '{endpoint}' in subject '{subject}'")]
    DuplicateEndpoint { subject: String, endpoint: String },
    #[error("Default for parameter '{parameter}' of {subject}/{endpoint} is not a valid {expected}")]
    InvalidDefault {
        subject: String,
        endpoint: String,
        parameter: String,
        expected: ParamType,
    },
    #[error("Placeholder '{{{placeholder}}}' in {subject}/{endpoint} is not a required or defaulted parameter")]
    UndeclaredPlaceholder {
        subject: String,
        endpoint: String,
        placeholder: String,
    },
    #[error("Path parameter '{placeholder}' in {subject}/{endpoint} must fill a whole path segment")]
    PathPlaceholderPlacement {
        subject: String,
        endpoint: String,
        placeholder: String,
    },
    #[error("Invalid placeholder pattern: {0}")]
    Pattern(String),
}

/// Declared type of an endpoint parameter. Values are checked against it
/// without coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    /// A relative remote path such as `beaches/beachList`. As a placeholder
    /// it expands to one path segment per `/`-separated component.
    Path,
}

impl ParamType {
    /// Whether `value` is a well-typed instance of this parameter type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String | ParamType::Path => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
        }
    }

    /// Parses a command-line string into a JSON value of this type.
    pub fn parse_str(&self, raw: &str) -> Option<Value> {
        match self {
            ParamType::String | ParamType::Path => Some(Value::String(raw.to_string())),
            ParamType::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
            ParamType::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            ParamType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Path => "path",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema entry for one parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Expected top-level shape of an endpoint's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShapeHint {
    /// A JSON array whose elements are all objects.
    Records,
    /// A single JSON object, e.g. dashboard card/section metadata.
    Object,
    /// Either of the above, for endpoints named at runtime.
    RecordsOrObject,
}

impl fmt::Display for ResponseShapeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseShapeHint::Records => f.write_str("list of records"),
            ResponseShapeHint::Object => f.write_str("object"),
            ResponseShapeHint::RecordsOrObject => f.write_str("list of records or object"),
        }
    }
}

/// A named, parameterized remote query belonging to a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub name: String,
    /// Path relative to the API root; `{name}` segments are substituted from
    /// parameters.
    pub remote_path_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Dashboard section the card belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Interactive GIS map for this data, when the dashboard offers one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_link: Option<String>,
    #[serde(default)]
    pub allowed_parameters: BTreeMap<String, ParameterSpec>,
    pub response_shape_hint: ResponseShapeHint,
    /// Placeholder names in template order, filled in on load.
    #[serde(skip)]
    placeholders: Vec<String>,
    /// The template split into path segments, filled in on load.
    #[serde(skip)]
    template: Vec<Vec<TemplatePart>>,
}

/// A piece of one path segment of a `remote_path_template`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Placeholder(String),
}

impl EndpointDescriptor {
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn template(&self) -> &[Vec<TemplatePart>] {
        &self.template
    }

    /// Whether `name` is declared as a [`ParamType::Path`] parameter.
    pub fn is_path_parameter(&self, name: &str) -> bool {
        self.allowed_parameters
            .get(name)
            .is_some_and(|spec| spec.param_type == ParamType::Path)
    }
}

/// Reference documentation for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// One health-data domain of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub endpoints: Vec<EndpointDescriptor>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Subject {
    pub fn summary(&self) -> SubjectSummary {
        SubjectSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
        }
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

/// The listing entry returned by `get_available_subjects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub id: String,
    pub display_name: String,
    pub description: String,
}

/// Top-level structure for the subject catalog YAML file.
#[derive(Deserialize, Debug)]
pub struct CatalogFile {
    pub subjects: Vec<Subject>,
}

/// Immutable registry of subjects, in seed-table order.
#[derive(Debug, Clone)]
pub struct Catalog {
    subjects: Vec<Subject>,
}

impl Catalog {
    /// Loads the catalog embedded in the binary.
    pub fn load_builtin() -> Result<Self, CatalogError> {
        let yaml_content = include_str!("../../seed_data/subjects.yml");
        parse_catalog(yaml_content)
    }

    pub fn list_subjects(&self) -> Vec<SubjectSummary> {
        self.subjects.iter().map(Subject::summary).collect()
    }

    pub fn subject_ids(&self) -> Vec<&str> {
        self.subjects.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn get_subject(&self, id: &str) -> Result<&Subject, ResolveError> {
        self.subjects
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ResolveError::UnknownSubject {
                subject: id.to_string(),
                known: self.subject_ids().join(", "),
            })
    }

    pub fn get_endpoint(
        &self,
        subject_id: &str,
        endpoint_name: &str,
    ) -> Result<&EndpointDescriptor, ResolveError> {
        let subject = self.get_subject(subject_id)?;
        subject
            .endpoint(endpoint_name)
            .ok_or_else(|| ResolveError::UnknownEndpoint {
                subject: subject_id.to_string(),
                endpoint: endpoint_name.to_string(),
                known: subject
                    .endpoints
                    .iter()
                    .map(|e| e.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Links for a subject, optionally restricted to one dashboard section.
    pub fn get_links(
        &self,
        subject_id: &str,
        section: Option<&str>,
    ) -> Result<Vec<Link>, ResolveError> {
        let subject = self.get_subject(subject_id)?;
        Ok(subject
            .links
            .iter()
            .filter(|link| match section {
                Some(wanted) => link.section.as_deref() == Some(wanted),
                None => true,
            })
            .cloned()
            .collect())
    }
}

/// Parse and validate a subject catalog from YAML content.
///
/// Rejects duplicate subject ids, subjects without endpoints, duplicate
/// endpoint names within a subject, defaults that don't match their declared
/// type, and path placeholders that could be left unfilled.
pub fn parse_catalog(yaml_content: &str) -> Result<Catalog, CatalogError> {
    let file: CatalogFile = serde_yml::from_str(yaml_content)?;
    let placeholder_re = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| CatalogError::Pattern(e.to_string()))?;

    let mut seen_subjects = HashSet::new();
    let mut subjects = Vec::with_capacity(file.subjects.len());

    for mut subject in file.subjects {
        if !seen_subjects.insert(subject.id.clone()) {
            return Err(CatalogError::DuplicateSubject(subject.id));
        }
        if subject.endpoints.is_empty() {
            return Err(CatalogError::EmptySubject(subject.id));
        }

        let mut seen_endpoints = HashSet::new();
        for endpoint in &mut subject.endpoints {
            if !seen_endpoints.insert(endpoint.name.clone()) {
                return Err(CatalogError::DuplicateEndpoint {
                    subject: subject.id.clone(),
                    endpoint: endpoint.name.clone(),
                });
            }

            for (name, spec) in &endpoint.allowed_parameters {
                if let Some(default) = &spec.default {
                    if !spec.param_type.accepts(default) {
                        return Err(CatalogError::InvalidDefault {
                            subject: subject.id.clone(),
                            endpoint: endpoint.name.clone(),
                            parameter: name.clone(),
                            expected: spec.param_type,
                        });
                    }
                }
            }

            let template: Vec<Vec<TemplatePart>> = endpoint
                .remote_path_template
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|segment| parse_segment(&placeholder_re, segment))
                .collect();
            let mut placeholders = Vec::new();
            for parts in &template {
                for part in parts {
                    if let TemplatePart::Placeholder(name) = part {
                        if endpoint.is_path_parameter(name) && parts.len() != 1 {
                            return Err(CatalogError::PathPlaceholderPlacement {
                                subject: subject.id.clone(),
                                endpoint: endpoint.name.clone(),
                                placeholder: name.clone(),
                            });
                        }
                        placeholders.push(name.clone());
                    }
                }
            }
            for placeholder in &placeholders {
                let always_filled = endpoint
                    .allowed_parameters
                    .get(placeholder)
                    .is_some_and(|spec| spec.required || spec.default.is_some());
                if !always_filled {
                    return Err(CatalogError::UndeclaredPlaceholder {
                        subject: subject.id.clone(),
                        endpoint: endpoint.name.clone(),
                        placeholder: placeholder.clone(),
                    });
                }
            }
            endpoint.placeholders = placeholders;
            endpoint.template = template;
        }

        subjects.push(subject);
    }

    Ok(Catalog { subjects })
}

fn parse_segment(placeholder_re: &Regex, segment: &str) -> Vec<TemplatePart> {
    let mut parts = Vec::new();
    let mut last = 0;
    for cap in placeholder_re.captures_iter(segment) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        if whole.start() > last {
            parts.push(TemplatePart::Literal(segment[last..whole.start()].to_string()));
        }
        parts.push(TemplatePart::Placeholder(name.as_str().to_string()));
        last = whole.end();
    }
    if last < segment.len() {
        parts.push(TemplatePart::Literal(segment[last..].to_string()));
    }
    parts
}
