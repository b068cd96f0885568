//! Language-neutral emission plan.
//!
//! The plan holds every decision the generator makes: type names, field wire
//! names, enum member values, method names, parameter order, query and path
//! assembly, auth scheme and response type. Renderers only format it.

// Internal imports (std, crate)
use std::collections::{BTreeMap, HashSet};

use crate::config::Config;
use crate::openapi::{description_or_title, Definition, OpenApiContext, OpenApiOperation, Parameter};
use crate::resolve::{type_name, DefinitionIndex, Diagnostic, RefKind};
use crate::types::{ScalarType, TypePlan, TypeResolver};
use crate::utils::{camel_to_snake, enum_variant_name, snake_to_pascal, strip_newlines};

// External imports (alphabetized)
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder pattern"));

/// The full plan for one document
#[derive(Debug, Clone, Serialize)]
pub struct ApiPlan {
    /// `info.title`, newlines collapsed
    pub title: Option<String>,
    /// `info.version`
    pub version: Option<String>,
    /// Configured override, else derived from schemes, host and basePath
    pub base_url: Option<String>,
    /// Module the generated items are nested under
    pub sub_namespace: Option<String>,
    /// One entry per definition, ordered by definition key
    pub definitions: Vec<DefinitionPlan>,
    /// One entry per operation, ordered by path then method
    pub operations: Vec<OperationPlan>,
    /// Everything generation worked around, in discovery order
    pub diagnostics: Vec<Diagnostic>,
}

/// A generated type
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefinitionPlan {
    Enum(EnumPlan),
    Object(ObjectPlan),
}

impl DefinitionPlan {
    pub fn type_name(&self) -> &str {
        match self {
            Self::Enum(plan) => &plan.type_name,
            Self::Object(plan) => &plan.type_name,
        }
    }
}

/// An enumerated definition
#[derive(Debug, Clone, Serialize)]
pub struct EnumPlan {
    /// Definition key
    pub wire_name: String,
    /// PascalCase name of the generated enum
    pub type_name: String,
    /// The definition title
    pub doc: Option<String>,
    /// Members in declaration order
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumMember {
    /// The literal as written in the document
    pub literal: String,
    /// PascalCase member name
    pub name: String,
    /// Zero-based declaration index; the serialized form
    pub value: usize,
    /// The description line at the same position, if any
    pub doc: Option<String>,
}

/// An object definition
#[derive(Debug, Clone, Serialize)]
pub struct ObjectPlan {
    /// Definition key
    pub wire_name: String,
    /// PascalCase name of the generated type
    pub type_name: String,
    /// Description, falling back to title
    pub doc: Option<String>,
    /// One field per property, ordered by property key
    pub fields: Vec<FieldPlan>,
}

impl ObjectPlan {
    /// The ordered (label, style) pairs of the string representation
    pub fn display_parts(&self) -> Vec<(&str, DisplayStyle)> {
        self.fields
            .iter()
            .map(|field| (field.name.as_str(), field.display))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldPlan {
    /// Property key, used verbatim as the serialized name
    pub wire_name: String,
    /// Exposed PascalCase identifier
    pub name: String,
    /// Description, falling back to title
    pub doc: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypePlan,
    /// How the value appears in the string representation
    pub display: DisplayStyle,
}

/// How a field value appears in the string representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStyle {
    /// `Name: value, `
    Value,
    /// `Name: [a, b], `
    List,
    /// `Name: [{k=v}{k=v}], `
    Map,
    /// `Name: value, ` or `Name: , ` when absent
    Optional,
}

impl DisplayStyle {
    pub fn of(ty: &TypePlan) -> Self {
        match ty {
            TypePlan::ScalarList { .. } | TypePlan::RefList { .. } => Self::List,
            TypePlan::ScalarMap { .. } | TypePlan::RefMap { .. } => Self::Map,
            TypePlan::ObjectRef { .. } => Self::Optional,
            TypePlan::Scalar { .. } | TypePlan::EnumRef { .. } | TypePlan::Opaque => Self::Value,
        }
    }
}

/// Authentication mechanism of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityScheme {
    None,
    Basic,
    /// Implicit bearer token; the header is always sent
    Bearer,
    /// Declared `HttpKeyAuth`; the header is only sent for a non-empty token
    HttpKey,
}

impl SecurityScheme {
    /// Pick the scheme from the first security requirement.
    ///
    /// No declared security means an implicit bearer token; an empty
    /// requirement means none.
    pub fn select(security: Option<&[BTreeMap<String, serde_json::Value>]>) -> Self {
        match security {
            None | Some([]) => Self::Bearer,
            Some([first, ..]) => {
                if first.contains_key("BasicAuth") {
                    Self::Basic
                } else if first.contains_key("HttpKeyAuth") {
                    Self::HttpKey
                } else {
                    Self::None
                }
            }
        }
    }

    /// Credential parameters in signature order
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::Basic => &["basic_auth_username", "basic_auth_password"],
            Self::Bearer | Self::HttpKey => &["bearer_token"],
        }
    }
}

/// Where a parameter travels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Path,
    Query,
    Header,
    Body,
}

impl ParameterKind {
    fn from_location(location: &str) -> Option<Self> {
        match location {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "body" => Some(Self::Body),
            _ => None,
        }
    }
}

/// How a query parameter is written into the query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryEncoding {
    /// `key=value`; strings percent-encoded
    Scalar { scalar: ScalarType },
    /// `key=a&key=b`
    Repeated { scalar: ScalarType },
    /// `key[k]=v` per entry
    Map { scalar: ScalarType },
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterPlan {
    /// Declared name
    pub name: String,
    pub kind: ParameterKind,
    /// Declared required, or a path parameter
    pub required: bool,
    pub doc: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypePlan,
    /// `{name}` placeholder for path parameters
    pub placeholder: Option<String>,
    /// Query string key and encoding for query parameters
    pub query_key: Option<String>,
    pub query: Option<QueryEncoding>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponsePlan {
    /// Generated type the success body decodes into
    pub type_name: String,
    /// Whether that type is an enum definition
    pub is_enum: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationPlan {
    /// `operationId` as declared
    pub operation_id: String,
    /// Prefix-stripped PascalCase name, e.g. `GetAccount`
    pub name: String,
    /// `name` with the asynchronous suffix, e.g. `GetAccountAsync`
    pub method_name: String,
    /// Upper-case HTTP method
    pub http_method: String,
    /// URL template with `{name}` placeholders
    pub path: String,
    /// Summary, newlines collapsed
    pub summary: Option<String>,
    pub security: SecurityScheme,
    /// Declared parameters in declaration order
    pub parameters: Vec<ParameterPlan>,
    /// Success body type; `None` when the operation returns nothing
    pub response: Option<ResponsePlan>,
}

impl OperationPlan {
    /// Parameters that must be present before any request is sent
    pub fn required_parameters(&self) -> impl Iterator<Item = &ParameterPlan> {
        self.parameters.iter().filter(|p| p.required)
    }

    pub fn parameters_of(&self, kind: ParameterKind) -> impl Iterator<Item = &ParameterPlan> {
        self.parameters.iter().filter(move |p| p.kind == kind)
    }

    /// At most one body parameter is honored
    pub fn body(&self) -> Option<&ParameterPlan> {
        self.parameters_of(ParameterKind::Body).next()
    }
}

/// Builds an [`ApiPlan`] from a decoded document
pub struct Planner<'a> {
    spec: &'a OpenApiContext,
    config: &'a Config,
    index: DefinitionIndex<'a>,
    resolver: TypeResolver<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Planner<'a> {
    pub fn new(spec: &'a OpenApiContext, config: &'a Config) -> Self {
        let index = DefinitionIndex::new(&spec.definitions);
        Self {
            spec,
            config,
            index,
            resolver: TypeResolver::new(index),
            diagnostics: Vec::new(),
        }
    }

    /// Plan every definition and operation
    pub fn build(mut self) -> ApiPlan {
        let spec = self.spec;
        let mut definitions = Vec::with_capacity(spec.definitions.len());
        let mut seen_types = HashSet::new();
        for (key, definition) in &spec.definitions {
            let plan = self.plan_definition(key, definition);
            if !seen_types.insert(plan.type_name().to_string()) {
                self.diagnose(key, format!("type name '{}' is generated twice", plan.type_name()));
            }
            definitions.push(plan);
        }

        let mut operations = Vec::new();
        let mut seen_methods = HashSet::new();
        for op in spec.operations() {
            let plan = self.plan_operation(&op);
            if !seen_methods.insert(plan.method_name.clone()) {
                self.diagnose(&plan.operation_id, format!("method '{}' is generated twice", plan.method_name));
            }
            operations.push(plan);
        }

        let base_url = self
            .config
            .base_url
            .as_ref()
            .map(|url| url.as_str().trim_end_matches('/').to_string())
            .or_else(|| spec.base_url());

        log::debug!(
            "Planned {} definitions and {} operations ({} diagnostics)",
            definitions.len(),
            operations.len(),
            self.diagnostics.len()
        );

        ApiPlan {
            title: spec.title().map(String::from),
            version: spec.version().map(String::from),
            base_url,
            sub_namespace: self.config.sub_namespace.clone(),
            definitions,
            operations,
            diagnostics: self.diagnostics,
        }
    }

    fn plan_definition(&mut self, key: &str, definition: &Definition) -> DefinitionPlan {
        let type_name = type_name(key);

        if definition.is_enum() {
            let lines: Vec<&str> = definition
                .description
                .as_deref()
                .map(|d| d.split('\n').collect())
                .unwrap_or_default();
            let members: Vec<EnumMember> = definition
                .enum_values
                .iter()
                .enumerate()
                .map(|(value, literal)| EnumMember {
                    literal: literal.clone(),
                    name: enum_variant_name(literal),
                    value,
                    doc: lines
                        .get(value)
                        .map(|line| line.trim_end_matches('\r').trim().to_string())
                        .filter(|line| !line.is_empty()),
                })
                .collect();
            let mut seen_members = HashSet::new();
            for member in &members {
                if !seen_members.insert(member.name.as_str()) {
                    self.diagnose(key, format!("enum member '{}' is generated twice", member.name));
                }
            }
            return DefinitionPlan::Enum(EnumPlan {
                wire_name: key.to_string(),
                type_name,
                doc: definition.title.as_deref().map(strip_newlines),
                members,
            });
        }

        let mut seen_fields = HashSet::new();
        let mut fields = Vec::with_capacity(definition.properties.len());
        for (wire_name, property) in &definition.properties {
            let subject = format!("{}.{}", key, wire_name);
            let name = snake_to_pascal(wire_name);
            if !seen_fields.insert(name.clone()) {
                self.diagnose(&subject, format!("field name '{}' is generated twice", name));
            }
            let ty = self.resolver.resolve(property, &subject, &mut self.diagnostics);
            fields.push(FieldPlan {
                wire_name: wire_name.clone(),
                name,
                doc: property.doc().map(strip_newlines),
                display: DisplayStyle::of(&ty),
                ty,
            });
        }

        DefinitionPlan::Object(ObjectPlan {
            wire_name: key.to_string(),
            type_name,
            doc: description_or_title(definition.description.as_deref(), definition.title.as_deref())
                .map(strip_newlines),
            fields,
        })
    }

    fn plan_operation(&mut self, op: &OpenApiOperation<'_>) -> OperationPlan {
        let operation_id = op.id();
        let stripped = if self.config.operation_prefix.is_empty() {
            operation_id.as_str()
        } else {
            operation_id
                .strip_prefix(self.config.operation_prefix.as_str())
                .unwrap_or(&operation_id)
        };
        let name = snake_to_pascal(stripped);

        let mut parameters = Vec::new();
        for parameter in op.parameters() {
            if let Some(plan) = self.plan_parameter(&operation_id, parameter) {
                parameters.push(plan);
            }
        }
        if parameters.iter().filter(|p| p.kind == ParameterKind::Body).count() > 1 {
            self.diagnose(&operation_id, "more than one body parameter; only the first is sent");
        }
        for capture in PLACEHOLDER.captures_iter(op.path) {
            let name = &capture[1];
            let bound = parameters
                .iter()
                .any(|p| p.kind == ParameterKind::Path && p.name == name);
            if !bound {
                self.diagnose(
                    &operation_id,
                    format!("path placeholder '{{{}}}' has no path parameter", name),
                );
            }
        }

        OperationPlan {
            method_name: format!("{}Async", name),
            name,
            http_method: op.method.to_uppercase(),
            path: op.path.to_string(),
            summary: op.operation.summary.as_deref().map(strip_newlines),
            security: SecurityScheme::select(op.operation.security.as_deref()),
            parameters,
            response: op.success_ref().map(|reference| self.plan_response(&operation_id, reference)),
            operation_id,
        }
    }

    fn plan_parameter(&mut self, operation_id: &str, parameter: &Parameter) -> Option<ParameterPlan> {
        let subject = format!("{}.{}", operation_id, parameter.name);
        let Some(kind) = ParameterKind::from_location(&parameter.in_) else {
            self.diagnose(
                &subject,
                format!("parameters in '{}' are not supported; parameter skipped", parameter.in_),
            );
            return None;
        };

        let ty = match kind {
            ParameterKind::Body => {
                self.resolver
                    .resolve_body(parameter.schema.as_ref(), &subject, &mut self.diagnostics)
            }
            _ => self.resolver.resolve(&parameter.shape, &subject, &mut self.diagnostics),
        };
        let ty = match (kind, &ty) {
            (ParameterKind::Path | ParameterKind::Header, TypePlan::ScalarList { .. })
            | (ParameterKind::Path | ParameterKind::Header, TypePlan::RefList { .. })
            | (ParameterKind::Path | ParameterKind::Header, TypePlan::ScalarMap { .. })
            | (ParameterKind::Path | ParameterKind::Header, TypePlan::RefMap { .. }) => {
                self.diagnose(&subject, "collection path or header parameter carried as raw JSON");
                TypePlan::Opaque
            }
            _ => ty,
        };

        let query = match kind {
            ParameterKind::Query => {
                let encoding = QueryEncoding::of(&ty);
                if encoding.is_none() {
                    self.diagnose(&subject, "query parameter shape cannot be encoded; parameter is not sent");
                }
                encoding
            }
            _ => None,
        };

        Some(ParameterPlan {
            placeholder: (kind == ParameterKind::Path).then(|| format!("{{{}}}", parameter.name)),
            query_key: (kind == ParameterKind::Query).then(|| camel_to_snake(&parameter.name)),
            query,
            name: parameter.name.clone(),
            kind,
            // path parameters are always required
            required: parameter.required || kind == ParameterKind::Path,
            doc: parameter.description.as_deref().map(strip_newlines),
            ty,
        })
    }

    fn plan_response(&mut self, operation_id: &str, reference: &str) -> ResponsePlan {
        let kind = self.index.classify(reference);
        if kind == RefKind::Unresolved {
            self.diagnose(
                operation_id,
                format!("no definition found for response '{}', treating it as an object", reference),
            );
        }
        ResponsePlan {
            type_name: type_name(reference),
            is_enum: kind == RefKind::Enum,
        }
    }

    fn diagnose(&mut self, subject: &str, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(subject, message);
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

impl QueryEncoding {
    fn of(ty: &TypePlan) -> Option<Self> {
        match ty {
            TypePlan::Scalar { scalar } => Some(Self::Scalar { scalar: *scalar }),
            TypePlan::ScalarList { scalar } => Some(Self::Repeated { scalar: *scalar }),
            TypePlan::ScalarMap { scalar } => Some(Self::Map { scalar: *scalar }),
            _ => None,
        }
    }
}

/// Plan a decoded document with the given configuration
pub fn build_plan(spec: &OpenApiContext, config: &Config) -> ApiPlan {
    Planner::new(spec, config).build()
}
