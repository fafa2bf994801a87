//! The tool surface offered to a host protocol layer.
//!
//! Four tools are exposed: `get_available_subjects`, `get_metadata`,
//! `get_data` and `get_links`. A host lists them with
//! [`HealthTools::tool_definitions`] and invokes them by name with
//! [`HealthTools::call_tool`].

use std::sync::Arc;

use ilhealth_api::{Client, Fetch};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError, EndpointDescriptor, Link, SubjectSummary};
use crate::client::RetryingClient;
use crate::config::ClientConfig;
use crate::error::ResolveError;
use crate::normalize::NormalizedResult;
use crate::resolver::{DataRequest, Resolver};

pub const GET_AVAILABLE_SUBJECTS: &str = "get_available_subjects";
pub const GET_METADATA: &str = "get_metadata";
pub const GET_DATA: &str = "get_data";
pub const GET_LINKS: &str = "get_links";

/// Endpoint every subject declares for fetching one dashboard card.
pub const CARD_ENDPOINT: &str = "card";
/// Card path argument, named as in the dashboard metadata.
pub const END_POINT_NAME: &str = "endPointName";

/// Errors from tool dispatch.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid arguments for {tool}: either '{first}' or '{second}' is required")]
    MissingArgument {
        tool: String,
        first: &'static str,
        second: &'static str,
    },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Failed to serialize tool result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from assembling the production tool set.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] ilhealth_api::Error),
}

/// Tool definition as advertised to a host.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// `get_metadata` result: a subject and its endpoint descriptors.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectMetadata {
    #[serde(flatten)]
    pub subject: SubjectSummary,
    pub endpoints: Vec<EndpointDescriptor>,
}

#[derive(Debug, Deserialize)]
struct SubjectArgs {
    subject: String,
}

#[derive(Debug, Deserialize)]
struct DataArgs {
    subject: String,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default, rename = "endPointName")]
    end_point_name: Option<String>,
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
}

impl DataArgs {
    /// A bare `endPointName` targets the subject's card endpoint.
    fn into_request(self) -> Result<DataRequest, ToolError> {
        let mut parameters = self.parameters.unwrap_or_default();
        let endpoint = match (self.endpoint, self.end_point_name) {
            (Some(endpoint), Some(path)) => {
                parameters.insert(END_POINT_NAME.to_string(), Value::String(path));
                endpoint
            }
            (Some(endpoint), None) => endpoint,
            (None, Some(path)) => {
                parameters.insert(END_POINT_NAME.to_string(), Value::String(path));
                CARD_ENDPOINT.to_string()
            }
            (None, None) => {
                return Err(ToolError::MissingArgument {
                    tool: GET_DATA.to_string(),
                    first: "endpoint",
                    second: END_POINT_NAME,
                })
            }
        };
        Ok(DataRequest {
            subject_id: self.subject,
            endpoint_name: endpoint,
            parameters,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LinksArgs {
    subject: String,
    #[serde(default, alias = "sectionId")]
    section: Option<String>,
}

/// Facade over the catalog and resolver implementing the four tools.
#[derive(Debug)]
pub struct HealthTools<F = RetryingClient<Client>> {
    resolver: Resolver<F>,
}

impl HealthTools<RetryingClient<Client>> {
    /// Builtin catalog plus the HTTP client described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, SetupError> {
        let catalog = Arc::new(Catalog::load_builtin()?);
        let client = config.build_client()?;
        Ok(Self::new(catalog, client))
    }
}

impl<F: Fetch> HealthTools<F> {
    pub fn new(catalog: Arc<Catalog>, client: F) -> Self {
        Self {
            resolver: Resolver::new(catalog, client),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.resolver.catalog()
    }

    pub fn resolver(&self) -> &Resolver<F> {
        &self.resolver
    }

    /// Every subject in the closed catalog. Never touches the network.
    pub fn get_available_subjects(&self) -> Vec<SubjectSummary> {
        self.catalog().list_subjects()
    }

    /// Endpoint descriptors for one subject. Never touches the network.
    pub fn get_metadata(&self, subject_id: &str) -> Result<SubjectMetadata, ResolveError> {
        let subject = self.catalog().get_subject(subject_id)?;
        Ok(SubjectMetadata {
            subject: subject.summary(),
            endpoints: subject.endpoints.clone(),
        })
    }

    /// Runs the full resolve/fetch/normalize pipeline.
    pub async fn get_data(&self, request: &DataRequest) -> Result<NormalizedResult, ResolveError> {
        self.resolver.resolve_and_fetch(request).await
    }

    pub fn get_links(
        &self,
        subject_id: &str,
        section: Option<&str>,
    ) -> Result<Vec<Link>, ResolveError> {
        self.catalog().get_links(subject_id, section)
    }

    /// Tool names, descriptions and JSON input schemas.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let subjects = self.catalog().subject_ids();
        vec![
            ToolDefinition {
                name: GET_AVAILABLE_SUBJECTS.to_string(),
                description: "Get a list of all available subject areas with descriptions"
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            ToolDefinition {
                name: GET_METADATA.to_string(),
                description: "Get metadata about available data endpoints for a specific subject. \
                    Some endpoints include an embed_link field that opens an interactive GIS map \
                    for the data."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "subject": {
                            "type": "string",
                            "description": "The subject area to get metadata for",
                            "enum": subjects
                        }
                    },
                    "required": ["subject"]
                }),
            },
            ToolDefinition {
                name: GET_DATA.to_string(),
                description: "Get data from a subject. Fetch endpoint \"dashboard\" first: \
                    its cards list an endPointName for each data view. Pass that value as \
                    endPointName to fetch the card's data. If a card has an embedLink, suggest \
                    opening the interactive map to the user."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "subject": {
                            "type": "string",
                            "description": "The subject area",
                            "enum": subjects
                        },
                        "endpoint": {
                            "type": "string",
                            "description": "The endpoint name, as listed by get_metadata"
                        },
                        "endPointName": {
                            "type": "string",
                            "description": "Card endPointName from the dashboard metadata, \
                                such as beaches/beachList"
                        },
                        "parameters": {
                            "type": "object",
                            "description": "Endpoint parameters, as declared by get_metadata"
                        }
                    },
                    "required": ["subject"],
                    "anyOf": [
                        {"required": ["endpoint"]},
                        {"required": ["endPointName"]}
                    ]
                }),
            },
            ToolDefinition {
                name: GET_LINKS.to_string(),
                description: "Get relevant links and documentation for a subject area".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "subject": {
                            "type": "string",
                            "description": "The subject area to get links for",
                            "enum": subjects
                        },
                        "section": {
                            "type": "string",
                            "description": "Optional dashboard section id to filter links"
                        }
                    },
                    "required": ["subject"]
                }),
            },
        ]
    }

    /// Invokes a tool by name with JSON arguments and returns its JSON result.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        tracing::info!("Tool call: {}", name);
        let arguments = if arguments.is_null() {
            Value::Object(Map::new())
        } else {
            arguments
        };

        match name {
            GET_AVAILABLE_SUBJECTS => Ok(json!({ "subjects": self.get_available_subjects() })),
            GET_METADATA => {
                let args: SubjectArgs = parse_args(name, arguments)?;
                Ok(serde_json::to_value(self.get_metadata(&args.subject)?)?)
            }
            GET_DATA => {
                let args: DataArgs = parse_args(name, arguments)?;
                let request = args.into_request()?;
                Ok(serde_json::to_value(self.get_data(&request).await?)?)
            }
            GET_LINKS => {
                let args: LinksArgs = parse_args(name, arguments)?;
                let links = self.get_links(&args.subject, args.section.as_deref())?;
                Ok(json!({ "links": links }))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|source| ToolError::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilhealth_api::{Error, RequestSpec};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Canned {
        body: Value,
        calls: AtomicUsize,
        paths: Mutex<Vec<String>>,
    }

    impl Fetch for Canned {
        async fn fetch(&self, request: &RequestSpec) -> Result<Value, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.paths.lock().unwrap().push(request.path());
            Ok(self.body.clone())
        }
    }

    fn tools_with(catalog: Catalog, body: Value) -> HealthTools<Canned> {
        HealthTools::new(
            Arc::new(catalog),
            Canned {
                body,
                calls: AtomicUsize::new(0),
                paths: Mutex::new(Vec::new()),
            },
        )
    }

    fn tools(body: Value) -> HealthTools<Canned> {
        tools_with(Catalog::load_builtin().unwrap(), body)
    }

    fn paths(t: &HealthTools<Canned>) -> Vec<String> {
        t.resolver().client().paths.lock().unwrap().clone()
    }

    fn calls(t: &HealthTools<Canned>) -> usize {
        t.resolver().client().calls.load(Ordering::SeqCst)
    }

    #[test]
    fn four_tools_defined() {
        let t = tools(json!([]));
        let names: Vec<String> = t.tool_definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["get_available_subjects", "get_metadata", "get_data", "get_links"]
        );
    }

    #[test]
    fn subject_enum_lists_catalog() {
        let t = tools(json!([]));
        let defs = t.tool_definitions();
        let subjects = &defs[1].input_schema["properties"]["subject"]["enum"];
        assert_eq!(subjects.as_array().unwrap().len(), 7);
        assert_eq!(subjects[0], "warCasualties");
    }

    #[test]
    fn metadata_for_every_subject_is_non_empty() {
        let t = tools(json!([]));
        for summary in t.get_available_subjects() {
            let meta = t.get_metadata(&summary.id).unwrap();
            assert!(!meta.endpoints.is_empty());
            assert_eq!(meta.subject, summary);
        }
        assert_eq!(calls(&t), 0);
    }

    #[test]
    fn metadata_unknown_subject() {
        let t = tools(json!([]));
        let err = t.get_metadata("weather").unwrap_err();
        assert_eq!(err.kind(), "UnknownSubjectError");
    }

    #[tokio::test]
    async fn call_get_available_subjects() {
        let t = tools(json!([]));
        let out = t.call_tool(GET_AVAILABLE_SUBJECTS, Value::Null).await.unwrap();
        let subjects = out["subjects"].as_array().unwrap();
        assert_eq!(subjects.len(), 7);
        assert_eq!(subjects[2]["id"], "beaches");
        assert!(subjects[2]["display_name"].is_string());
        assert_eq!(calls(&t), 0);
    }

    #[tokio::test]
    async fn call_get_metadata_serializes_endpoints() {
        let t = tools(json!([]));
        let out = t
            .call_tool(GET_METADATA, json!({"subject": "beaches"}))
            .await
            .unwrap();
        assert_eq!(out["id"], "beaches");
        let endpoints = out["endpoints"].as_array().unwrap();
        assert_eq!(endpoints[0]["name"], "dashboard");
        assert_eq!(endpoints[0]["response_shape_hint"], "object");
        assert_eq!(endpoints[1]["name"], CARD_ENDPOINT);
        assert_eq!(
            endpoints[1]["allowed_parameters"][END_POINT_NAME]["type"],
            "path"
        );
    }

    #[tokio::test]
    async fn call_get_data_returns_envelope() {
        let t = tools(json!([{"beach": "Gordon", "status": "open"}]));
        let out = t
            .call_tool(
                GET_DATA,
                json!({
                    "subject": "beaches",
                    "endpoint": "card",
                    "parameters": {"endPointName": "beaches/beachList"}
                }),
            )
            .await
            .unwrap();
        assert_eq!(out["success"], true);
        assert_eq!(out["data"][0]["beach"], "Gordon");
        assert!(out["error"].is_null());
        assert_eq!(out["source_endpoint"]["endpoint"], "card");
        assert_eq!(out["source_endpoint"]["path"], "beaches/beachList");
    }

    #[tokio::test]
    async fn call_get_data_accepts_dashboard_argument_names() {
        let t = tools(json!({"season": 2024, "closures": 3}));
        let out = t
            .call_tool(
                GET_DATA,
                json!({
                    "subject": "beaches",
                    "endPointName": "beaches/seasonSummary",
                    "transportProject": "x"
                }),
            )
            .await
            .unwrap();
        assert_eq!(out["success"], true);
        assert_eq!(out["data"]["closures"], 3);
        assert_eq!(paths(&t), vec!["beaches/seasonSummary".to_string()]);
    }

    #[tokio::test]
    async fn call_get_data_end_point_name_with_explicit_endpoint() {
        let t = tools(json!([]));
        let out = t
            .call_tool(
                GET_DATA,
                json!({"subject": "childKi", "endpoint": "card", "endPointName": "childKi/centers"}),
            )
            .await
            .unwrap();
        assert_eq!(out["success"], true);
        assert_eq!(paths(&t), vec!["childKi/centers".to_string()]);
    }

    #[tokio::test]
    async fn call_get_data_dashboard_endpoint() {
        let t = tools(json!({"cards": [], "sections": []}));
        let out = t
            .call_tool(GET_DATA, json!({"subject": "childKi", "endpoint": "dashboard"}))
            .await
            .unwrap();
        assert_eq!(out["success"], true);
        assert_eq!(paths(&t), vec!["content/dashboard/childKi".to_string()]);
    }

    #[tokio::test]
    async fn call_get_data_without_endpoint_or_card() {
        let t = tools(json!([]));
        let err = t
            .call_tool(GET_DATA, json!({"subject": "beaches"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument { .. }));
        assert_eq!(calls(&t), 0);
    }

    #[tokio::test]
    async fn call_get_data_invalid_parameter_is_resolve_error() {
        let t = tools(json!([]));
        let err = t
            .call_tool(
                GET_DATA,
                json!({"subject": "beaches", "endPointName": "../admin/users"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::Resolve(ResolveError::InvalidParameter { .. })
        ));
        assert_eq!(calls(&t), 0);
    }

    #[tokio::test]
    async fn call_get_links_returns_portal_link() {
        let t = tools(json!([]));
        let out = t
            .call_tool(GET_LINKS, json!({"subject": "serviceQuality"}))
            .await
            .unwrap();
        let links = out["links"].as_array().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0]["url"],
            "https://datadashboard.health.gov.il/portal/dashboard/serviceQuality"
        );
        assert_eq!(calls(&t), 0);
    }

    #[tokio::test]
    async fn call_get_links_with_section_alias() {
        let catalog = crate::catalog::parse_catalog(
            r#"
subjects:
  - id: serviceQuality
    display_name: Service Quality
    description: x
    endpoints:
      - name: dashboard
        remote_path_template: content/dashboard/serviceQuality
        response_shape_hint: object
    links:
      - label: Portal
        url: https://example.org/portal
      - label: Survey method
        url: https://example.org/survey
        section: survey
"#,
        )
        .unwrap();
        let t = tools_with(catalog, json!([]));

        let all = t
            .call_tool(GET_LINKS, json!({"subject": "serviceQuality"}))
            .await
            .unwrap();
        assert_eq!(all["links"].as_array().unwrap().len(), 2);

        let filtered = t
            .call_tool(
                GET_LINKS,
                json!({"subject": "serviceQuality", "sectionId": "survey"}),
            )
            .await
            .unwrap();
        let filtered_links = filtered["links"].as_array().unwrap();
        assert_eq!(filtered_links.len(), 1);
        assert_eq!(filtered_links[0]["section"], "survey");
    }

    #[tokio::test]
    async fn missing_argument_is_invalid_arguments() {
        let t = tools(json!([]));
        let err = t.call_tool(GET_METADATA, json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn unknown_tool_rejected() {
        let t = tools(json!([]));
        let err = t.call_tool("delete_everything", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }
}
