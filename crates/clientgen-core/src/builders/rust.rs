//! Rust-specific client context builder for clientgen codegen.
//!
//! Every string a template writes between quotes is produced here as a finished
//! Rust literal, so templates never escape anything themselves.

use super::ContextBuilder;
use crate::config::Config;
use crate::plan::{
    ApiPlan, DefinitionPlan, DisplayStyle, EnumPlan, FieldPlan, ObjectPlan, OperationPlan,
    ParameterKind, QueryEncoding, SecurityScheme,
};
use crate::types::{ScalarType, TypePlan};
use crate::utils::{camel_to_snake, rust_ident, snake_to_pascal, strip_newlines};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Locals and credential parameters declared by every generated method
const RESERVED_LOCALS: [&str; 11] = [
    "basic_auth_password",
    "basic_auth_username",
    "bearer_token",
    "cancellation",
    "content",
    "credentials",
    "headers",
    "query_params",
    "response",
    "uri",
    "url_path",
];

/// Items every generated file declares besides the client and error types
const RESERVED_TYPES: [&str; 6] = [
    "ApiError",
    "CancellationToken",
    "Duration",
    "Future",
    "HashMap",
    "HttpAdapter",
];

/// Rust-specific context for the client template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustClientContext {
    pub title: Option<String>,
    pub version: Option<String>,
    /// Literal for `DEFAULT_BASE_URL`
    pub default_base_url: Option<String>,
    /// Module the generated items are nested under
    pub sub_namespace: Option<String>,
    pub client_name: String,
    pub error_name: String,
    /// Generated types in definition order
    pub types: Vec<RustTypeContext>,
    pub methods: Vec<RustMethodContext>,
    /// One-line diagnostics rendered into the file header
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RustTypeContext {
    Enum(RustEnumContext),
    Struct(RustStructContext),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustEnumContext {
    pub name: String,
    pub wire_name: String,
    pub doc: Option<String>,
    pub members: Vec<RustEnumMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustEnumMember {
    pub name: String,
    pub value: usize,
    /// Literal of `name`, written by `Display`
    pub label: String,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustStructContext {
    pub name: String,
    pub wire_name: String,
    pub doc: Option<String>,
    pub fields: Vec<RustFieldContext>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustFieldContext {
    /// Field and getter identifier
    pub ident: String,
    /// Literal of the wire name for `#[serde(rename = ..)]`
    pub wire_literal: String,
    /// Stored type
    pub rust_type: String,
    pub doc: Option<String>,
    pub getter_type: String,
    pub getter_body: String,
    pub setter_name: String,
    pub setter_type: String,
    pub setter_value: String,
    /// Literal of the exposed name used in `Display`
    pub label: String,
    /// Expression formatted after the label in `Display`
    pub display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustMethodContext {
    pub fn_name: String,
    pub operation_id: String,
    pub doc: Option<String>,
    /// Literal of the upper-case HTTP method
    pub http_method: String,
    /// Literal of the URL template
    pub path: String,
    pub auth: SecurityScheme,
    /// Credential parameter identifiers, declared before `params`
    pub credentials: Vec<String>,
    /// Declared parameters in signature order
    pub params: Vec<RustParamContext>,
    pub required: Vec<RustRequiredCheck>,
    pub path_params: Vec<RustPathParam>,
    pub query_params: Vec<RustQueryParam>,
    pub header_params: Vec<RustHeaderParam>,
    /// Identifier of the body parameter
    pub body: Option<String>,
    /// Decoded response type
    pub response: Option<String>,
    pub return_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustParamContext {
    pub ident: String,
    pub rust_type: String,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustRequiredCheck {
    pub ident: String,
    /// Literal of the invalid-argument message
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustPathParam {
    pub ident: String,
    /// Literal of the `{name}` placeholder
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RustQueryStyle {
    Scalar,
    Repeated,
    Map,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustQueryParam {
    pub ident: String,
    pub style: RustQueryStyle,
    /// Literal of the query key
    pub key: String,
    /// Expression for the encoded value; reads the parameter for scalars
    /// and the loop variable `value` otherwise
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustHeaderParam {
    pub ident: String,
    /// Literal of the header name
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RustContextBuilder;

impl ContextBuilder for RustContextBuilder {
    fn build(&self, plan: &ApiPlan, config: &Config) -> crate::Result<JsonValue> {
        let mut context = RustClientContext {
            title: plan.title.as_deref().map(strip_newlines),
            version: plan.version.as_deref().map(strip_newlines),
            default_base_url: plan.base_url.as_deref().map(literal),
            sub_namespace: plan.sub_namespace.as_deref().map(module_ident),
            client_name: config.client_name.clone(),
            error_name: config.error_name.clone(),
            types: plan.definitions.iter().map(build_type).collect(),
            methods: plan.operations.iter().map(build_method).collect(),
            diagnostics: plan
                .diagnostics
                .iter()
                .map(|d| strip_newlines(&d.to_string()))
                .collect(),
        };

        for definition in &plan.definitions {
            let name = definition.type_name();
            let shadowed = RESERVED_TYPES.contains(&name)
                || name == config.client_name
                || name == config.error_name;
            if shadowed {
                log::warn!("type '{}' collides with a generated item", name);
                context
                    .diagnostics
                    .push(format!("{}: type name collides with a generated item", name));
            }
        }

        Ok(serde_json::to_value(&context)?)
    }
}

/// `format!("{:?}")` of a `str` is a valid Rust string literal
fn literal(value: &str) -> String {
    format!("{:?}", value)
}

fn module_ident(name: &str) -> String {
    rust_ident(&camel_to_snake(name).to_lowercase())
}

/// snake_case identifier for a wire or exposed name
pub fn field_ident(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    rust_ident(&camel_to_snake(&snake_to_pascal(&sanitized)))
}

fn param_ident(name: &str) -> String {
    let ident = field_ident(name);
    if RESERVED_LOCALS.contains(&ident.as_str()) {
        format!("{}_param", ident)
    } else {
        ident
    }
}

/// Method identifier: snake_case of the PascalCase name plus `_async`
pub fn method_ident(name: &str) -> String {
    rust_ident(&format!("{}_async", camel_to_snake(name)))
}

/// The Rust spelling of a scalar
pub fn scalar_type(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Integer => "i64",
        ScalarType::Number => "f64",
        ScalarType::Boolean => "bool",
        ScalarType::String => "String",
    }
}

/// The stored type of a field
pub fn field_type(ty: &TypePlan) -> String {
    match ty {
        TypePlan::Scalar { scalar } => scalar_type(*scalar).to_string(),
        TypePlan::ScalarList { scalar } => format!("Vec<{}>", scalar_type(*scalar)),
        TypePlan::RefList { type_name } => format!("Vec<{}>", type_name),
        TypePlan::ScalarMap { scalar } => format!("HashMap<String, {}>", scalar_type(*scalar)),
        TypePlan::RefMap { type_name } => format!("HashMap<String, {}>", type_name),
        TypePlan::EnumRef { type_name } => type_name.clone(),
        TypePlan::ObjectRef { type_name } => format!("Option<Box<{}>>", type_name),
        TypePlan::Opaque => "serde_json::Value".to_string(),
    }
}

/// The borrowed form a parameter is accepted as, without the `Option`
pub fn borrowed_type(ty: &TypePlan) -> String {
    match ty {
        TypePlan::Scalar { scalar: ScalarType::String } => "&str".to_string(),
        TypePlan::Scalar { scalar } => scalar_type(*scalar).to_string(),
        TypePlan::ScalarList { scalar } => format!("&[{}]", scalar_type(*scalar)),
        TypePlan::RefList { type_name } => format!("&[{}]", type_name),
        TypePlan::ScalarMap { .. } | TypePlan::RefMap { .. } => format!("&{}", field_type(ty)),
        TypePlan::EnumRef { type_name } => type_name.clone(),
        TypePlan::ObjectRef { type_name } => format!("&{}", type_name),
        TypePlan::Opaque => "&serde_json::Value".to_string(),
    }
}

fn build_type(definition: &DefinitionPlan) -> RustTypeContext {
    match definition {
        DefinitionPlan::Enum(plan) => RustTypeContext::Enum(build_enum(plan)),
        DefinitionPlan::Object(plan) => RustTypeContext::Struct(build_struct(plan)),
    }
}

fn build_enum(plan: &EnumPlan) -> RustEnumContext {
    RustEnumContext {
        name: plan.type_name.clone(),
        wire_name: plan.wire_name.clone(),
        doc: plan.doc.clone(),
        members: plan
            .members
            .iter()
            .map(|member| RustEnumMember {
                label: literal(&member.name),
                name: member.name.clone(),
                value: member.value,
                doc: member.doc.clone(),
            })
            .collect(),
    }
}

fn build_struct(plan: &ObjectPlan) -> RustStructContext {
    RustStructContext {
        name: plan.type_name.clone(),
        wire_name: plan.wire_name.clone(),
        doc: plan.doc.clone(),
        fields: plan
            .fields
            .iter()
            .zip(plan.display_parts())
            .map(|(field, (label, style))| build_field(field, label, style))
            .collect(),
    }
}

fn build_field(field: &FieldPlan, label: &str, style: DisplayStyle) -> RustFieldContext {
    let ident = field_ident(&field.name);
    let access = format!("self.{}", ident);

    let (getter_type, getter_body) = match &field.ty {
        TypePlan::Scalar { scalar: ScalarType::String } => ("&str".to_string(), format!("&{}", access)),
        TypePlan::Scalar { scalar } => (scalar_type(*scalar).to_string(), access.clone()),
        TypePlan::EnumRef { type_name } => (type_name.clone(), access.clone()),
        TypePlan::ObjectRef { type_name } => {
            (format!("Option<&{}>", type_name), format!("{}.as_deref()", access))
        }
        ty => (borrowed_type(ty), format!("&{}", access)),
    };

    let (setter_type, setter_value) = match &field.ty {
        TypePlan::Scalar { scalar: ScalarType::String } => {
            ("impl Into<String>".to_string(), "value.into()".to_string())
        }
        TypePlan::ObjectRef { type_name } => {
            (type_name.clone(), "Some(Box::new(value))".to_string())
        }
        ty => (field_type(ty), "value".to_string()),
    };

    let display = match style {
        DisplayStyle::Value => access.clone(),
        DisplayStyle::List => format!("join_list(&{})", access),
        DisplayStyle::Map => format!("join_map(&{})", access),
        DisplayStyle::Optional => format!("display_opt(&{})", access),
    };

    let bare = ident.trim_start_matches("r#");
    RustFieldContext {
        setter_name: rust_ident(&format!("with_{}", bare.trim_end_matches('_'))),
        wire_literal: literal(&field.wire_name),
        rust_type: field_type(&field.ty),
        doc: field.doc.clone(),
        label: literal(label),
        getter_type,
        getter_body,
        setter_type,
        setter_value,
        display,
        ident,
    }
}

fn build_method(op: &OperationPlan) -> RustMethodContext {
    let params = op
        .parameters
        .iter()
        .map(|p| RustParamContext {
            ident: param_ident(&p.name),
            rust_type: format!("Option<{}>", borrowed_type(&p.ty)),
            doc: p.doc.clone(),
        })
        .collect();

    let required = op
        .required_parameters()
        .map(|p| RustRequiredCheck {
            ident: param_ident(&p.name),
            message: literal(&format!("'{}' is required but was None.", p.name)),
        })
        .collect();

    let path_params = op
        .parameters_of(ParameterKind::Path)
        .filter_map(|p| {
            p.placeholder.as_deref().map(|placeholder| RustPathParam {
                ident: param_ident(&p.name),
                placeholder: literal(placeholder),
            })
        })
        .collect();

    let query_params = op
        .parameters_of(ParameterKind::Query)
        .filter_map(|p| {
            let (key, encoding) = (p.query_key.as_deref()?, p.query?);
            let ident = param_ident(&p.name);
            let (style, value) = match encoding {
                QueryEncoding::Scalar { scalar } => (RustQueryStyle::Scalar, query_value(scalar, &ident)),
                QueryEncoding::Repeated { scalar } => (RustQueryStyle::Repeated, query_value(scalar, "value")),
                QueryEncoding::Map { scalar } => (RustQueryStyle::Map, query_value(scalar, "value")),
            };
            Some(RustQueryParam {
                key: literal(key),
                ident,
                style,
                value,
            })
        })
        .collect();

    let header_params = op
        .parameters_of(ParameterKind::Header)
        .map(|p| RustHeaderParam {
            ident: param_ident(&p.name),
            name: literal(&p.name),
        })
        .collect();

    let response = op.response.as_ref().map(|r| r.type_name.clone());

    RustMethodContext {
        fn_name: method_ident(&op.name),
        operation_id: op.operation_id.clone(),
        doc: op.summary.clone(),
        http_method: literal(&op.http_method),
        path: literal(&op.path),
        auth: op.security,
        credentials: op
            .security
            .parameter_names()
            .iter()
            .map(|name| name.to_string())
            .collect(),
        return_type: response.clone().unwrap_or_else(|| "()".to_string()),
        body: op.body().map(|p| param_ident(&p.name)),
        params,
        required,
        path_params,
        query_params,
        header_params,
        response,
    }
}

/// Strings are percent-encoded; every other scalar formats as written,
/// which lower-cases booleans
fn query_value(scalar: ScalarType, var: &str) -> String {
    match scalar {
        ScalarType::String => format!("urlencoding::encode({})", var),
        _ => var.to_string(),
    }
}
