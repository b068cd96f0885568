//! Swagger 2.0 document parsing and utilities.
//!
//! This module decodes the parts of a Swagger document the generator understands:
//! named schema `definitions` and `paths` with per-method operations. Anything
//! else in the document is ignored. The decoded model is read-only for the rest
//! of a generation run.
//!
//! # Examples
//!
//! ```
//! use clientgen_core::openapi::OpenApiContext;
//!
//! let doc = br#"{
//!     "info": {"title": "Demo", "version": "1.0"},
//!     "definitions": {"apiAccount": {"properties": {"user_id": {"type": "string"}}}},
//!     "paths": {}
//! }"#;
//! let spec = OpenApiContext::from_slice(doc).unwrap();
//! assert_eq!(spec.title(), Some("Demo"));
//! assert!(spec.definitions.contains_key("apiAccount"));
//! ```

// Internal imports (std, crate)
use std::collections::BTreeMap;
use std::path::Path;

use crate::Error;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;

/// A decoded Swagger 2.0 document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenApiContext {
    /// Document metadata
    #[serde(default)]
    pub info: Option<Info>,
    /// Host (and optional port) serving the API
    #[serde(default)]
    pub host: Option<String>,
    /// Path prefix shared by every operation
    #[serde(default, rename = "basePath")]
    pub base_path: Option<String>,
    /// Transfer protocols supported by the API
    #[serde(default)]
    pub schemes: Vec<String>,
    /// Schema definitions keyed by their wire name
    #[serde(default)]
    pub definitions: BTreeMap<String, Definition>,
    /// Path items keyed by URL template
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
}

impl OpenApiContext {
    /// Load a document from a file or URL (supports both JSON and YAML)
    pub async fn from_file_or_url<P: AsRef<str>>(location: P) -> crate::Result<Self> {
        let location = location.as_ref();

        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::from_url(location).await;
        }

        Self::from_file(location).await
    }

    /// Load a document from a file (supports both JSON and YAML)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!(
                "Failed to parse schema at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load a document from a URL (supports both JSON and YAML)
    pub async fn from_url(url: &str) -> crate::Result<Self> {
        let response = reqwest::get(url).await?;

        if !response.status().is_success() {
            return Err(Error::openapi(format!(
                "Failed to fetch schema from {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let content = response.text().await?;
        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!("Failed to parse schema from {}: {}", url, e))
        })
    }

    /// Decode a document from raw bytes
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        let content = std::str::from_utf8(bytes)
            .map_err(|e| Error::openapi(format!("Schema is not valid UTF-8: {}", e)))?;
        Self::parse_content(content).map_err(Error::openapi)
    }

    /// Parse content as either JSON or YAML
    fn parse_content(content: &str) -> Result<Self, String> {
        let json_err = match serde_json::from_str(content) {
            Ok(spec) => return Ok(spec),
            Err(e) => e,
        };

        // A JSON document that failed to decode is reported as JSON; only fall
        // back to YAML for content that does not look like JSON at all.
        if content.trim_start().starts_with('{') {
            return Err(json_err.to_string());
        }

        serde_yaml::from_str(content)
            .map_err(|e| format!("content is neither valid JSON ({}) nor YAML ({})", json_err, e))
    }

    /// Get the title of the API
    pub fn title(&self) -> Option<&str> {
        self.info.as_ref()?.title.as_deref()
    }

    /// Get the version of the API
    pub fn version(&self) -> Option<&str> {
        self.info.as_ref()?.version.as_deref()
    }

    /// Build the base URL from `schemes`, `host` and `basePath`
    pub fn base_url(&self) -> Option<String> {
        let host = self.host.as_deref()?;
        let base_path = self.base_path.as_deref().unwrap_or("");

        let scheme = if self.schemes.iter().any(|s| s == "https") {
            "https"
        } else {
            self.schemes.first().map(String::as_str).unwrap_or("https")
        };

        Some(format!("{}://{}{}", scheme, host, base_path.trim_end_matches('/')))
    }

    /// Every operation in the document, ordered by path then by method
    pub fn operations(&self) -> Vec<OpenApiOperation<'_>> {
        let mut operations = Vec::new();
        for (path, item) in &self.paths {
            for (method, operation) in item.operations() {
                operations.push(OpenApiOperation {
                    path,
                    method,
                    operation,
                    shared_parameters: &item.parameters,
                });
            }
        }
        operations
    }
}

/// Document metadata from the `info` object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// A named schema entry: either an enum or an object with properties
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Definition {
    /// Object properties keyed by wire name
    #[serde(default)]
    pub properties: BTreeMap<String, Schema>,
    /// Enum literals in declaration order
    #[serde(default, rename = "enum")]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Definition {
    /// A definition with a non-empty enum sequence is an enum definition
    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }
}

/// The shape of a property, parameter, array item or map value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Primitive type tag (`integer`, `number`, `boolean`, `string`, `array`, `object`)
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    /// Reference to another definition (`#/definitions/<name>`)
    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    /// Item shape for `array`
    #[serde(default)]
    pub items: Option<Box<Schema>>,
    /// Map value shape for `object`
    #[serde(default, rename = "additionalProperties")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Schema {
    /// Description, falling back to title
    pub fn doc(&self) -> Option<&str> {
        description_or_title(self.description.as_deref(), self.title.as_deref())
    }

    /// The map value shape, if `additionalProperties` carries one
    pub fn map_value(&self) -> Option<&Schema> {
        match &self.additional_properties {
            Some(AdditionalProperties::Schema(schema)) => Some(schema),
            _ => None,
        }
    }
}

/// `additionalProperties` is either a boolean or a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// Operations available on a single path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    pub delete: Option<Operation>,
    pub get: Option<Operation>,
    pub head: Option<Operation>,
    pub options: Option<Operation>,
    pub patch: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
    /// Parameters shared by every operation on this path
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    /// Declared operations in method-name order
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        [
            ("delete", &self.delete),
            ("get", &self.get),
            ("head", &self.head),
            ("options", &self.options),
            ("patch", &self.patch),
            ("post", &self.post),
            ("put", &self.put),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
        .collect()
    }
}

/// A single HTTP method bound to a path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation identifier
    #[serde(default, rename = "operationId")]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
    /// Security requirements; only the first entry is honored
    #[serde(default)]
    pub security: Option<Vec<BTreeMap<String, JsonValue>>>,
}

/// Information about a single operation parameter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    /// The name of the parameter. Parameter names are case sensitive.
    pub name: String,
    /// The location of the parameter (`path`, `query`, `body`, `header`, `formData`)
    #[serde(rename = "in")]
    pub in_: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Body parameter shape
    #[serde(default)]
    pub schema: Option<Schema>,
    /// Inline shape for non-body parameters
    #[serde(flatten)]
    pub shape: Schema,
}

/// A single response entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// An operation together with the path and method it is bound to
#[derive(Debug, Clone, Copy)]
pub struct OpenApiOperation<'a> {
    pub path: &'a str,
    pub method: &'static str,
    pub operation: &'a Operation,
    /// Path-level parameters
    pub shared_parameters: &'a [Parameter],
}

impl<'a> OpenApiOperation<'a> {
    /// The operation identifier, derived from method and path when absent
    pub fn id(&self) -> String {
        self.operation.operation_id.clone().unwrap_or_else(|| {
            format!(
                "{}_{}",
                self.method,
                OpenApiOperation::sanitize_path(self.path)
            )
        })
    }

    /// Operation parameters with path-level parameters merged in front.
    /// An operation parameter overrides a shared one with the same name and location.
    pub fn parameters(&self) -> Vec<&'a Parameter> {
        let own = &self.operation.parameters;
        self.shared_parameters
            .iter()
            .filter(|shared| {
                !own
                    .iter()
                    .any(|p| p.name == shared.name && p.in_ == shared.in_)
            })
            .chain(own.iter())
            .collect()
    }

    /// The `$ref` of the 200 response schema, if any
    pub fn success_ref(&self) -> Option<&'a str> {
        self.operation
            .responses
            .get("200")?
            .schema
            .as_ref()?
            .reference
            .as_deref()
    }

    fn sanitize_path(path: &str) -> String {
        path.trim_start_matches('/')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect::<String>()
            .split('_')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Description when non-empty, otherwise title
pub fn description_or_title<'a>(description: Option<&'a str>, title: Option<&'a str>) -> Option<&'a str> {
    match description {
        Some(d) if !d.is_empty() => Some(d),
        _ => title.filter(|t| !t.is_empty()),
    }
}
