//! Type resolution for properties and parameters.
//!
//! A [`TypePlan`] says what a schema shape becomes in generated code without
//! saying how any particular language spells it. Target builders turn it into
//! concrete type names.

use crate::openapi::Schema;
use crate::resolve::{type_name, DefinitionIndex, Diagnostic, RefKind};

// External imports (alphabetized)
use serde::Serialize;

/// Primitive scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Integer,
    Number,
    Boolean,
    String,
}

impl ScalarType {
    /// Parse a Swagger primitive type tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

/// What a property or parameter becomes in generated code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypePlan {
    /// A scalar held by value
    Scalar { scalar: ScalarType },
    /// An ordered sequence of scalars held by value
    ScalarList { scalar: ScalarType },
    /// A sequence of generated types; empty when absent
    RefList { type_name: String },
    /// A string-keyed map of scalars; empty when absent
    ScalarMap { scalar: ScalarType },
    /// A string-keyed map of generated types; empty when absent
    RefMap { type_name: String },
    /// A generated enum held by value
    EnumRef { type_name: String },
    /// An exclusively owned generated object
    ObjectRef { type_name: String },
    /// A shape the generator does not model; carried as raw JSON
    Opaque,
}

/// Maps schema shapes to [`TypePlan`]s
pub struct TypeResolver<'a> {
    index: DefinitionIndex<'a>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(index: DefinitionIndex<'a>) -> Self {
        Self { index }
    }

    /// Resolve a property or non-body parameter shape.
    ///
    /// Problems are pushed to `diagnostics` under `subject`; they never fail
    /// the resolution.
    pub fn resolve(
        &self,
        schema: &Schema,
        subject: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> TypePlan {
        let tag = schema.type_.as_deref();

        if let Some(scalar) = tag.and_then(ScalarType::from_tag) {
            return TypePlan::Scalar { scalar };
        }

        match tag {
            Some("array") => {
                let Some(items) = schema.items.as_deref() else {
                    return self.opaque(subject, "array without items", diagnostics);
                };
                if let Some(scalar) = items.type_.as_deref().and_then(ScalarType::from_tag) {
                    return TypePlan::ScalarList { scalar };
                }
                match items.reference.as_deref() {
                    Some(reference) => TypePlan::RefList {
                        type_name: self.checked_type_name(reference, subject, diagnostics),
                    },
                    None => self.opaque(subject, "unsupported array item type", diagnostics),
                }
            }
            Some("object") => {
                let Some(value) = schema.map_value() else {
                    return self.opaque(subject, "object without additionalProperties", diagnostics);
                };
                if let Some(scalar) = value.type_.as_deref().and_then(ScalarType::from_tag) {
                    return TypePlan::ScalarMap { scalar };
                }
                match value.reference.as_deref() {
                    Some(reference) => TypePlan::RefMap {
                        type_name: self.checked_type_name(reference, subject, diagnostics),
                    },
                    None => self.opaque(subject, "unsupported map value type", diagnostics),
                }
            }
            Some(other) if schema.reference.is_none() => {
                self.opaque(subject, &format!("unsupported type '{}'", other), diagnostics)
            }
            _ => match schema.reference.as_deref() {
                Some(reference) => self.resolve_ref(reference, subject, diagnostics),
                None => self.opaque(subject, "no type or $ref", diagnostics),
            },
        }
    }

    /// Resolve a `body` parameter schema: a string or a `$ref`
    pub fn resolve_body(
        &self,
        schema: Option<&Schema>,
        subject: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> TypePlan {
        match schema {
            Some(schema) if schema.type_.as_deref() == Some("string") => TypePlan::Scalar {
                scalar: ScalarType::String,
            },
            Some(Schema {
                reference: Some(reference),
                ..
            }) => self.resolve_ref(reference, subject, diagnostics),
            Some(schema) => self.resolve(schema, subject, diagnostics),
            None => self.opaque(subject, "body parameter without schema", diagnostics),
        }
    }

    /// A bare `$ref`: an enum by value, otherwise an owned object
    pub fn resolve_ref(
        &self,
        reference: &str,
        subject: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> TypePlan {
        let type_name = type_name(reference);
        match self.index.classify(reference) {
            RefKind::Enum => TypePlan::EnumRef { type_name },
            RefKind::Object => TypePlan::ObjectRef { type_name },
            RefKind::Unresolved => {
                diagnostics.push(unresolved(subject, reference));
                TypePlan::ObjectRef { type_name }
            }
        }
    }

    fn checked_type_name(
        &self,
        reference: &str,
        subject: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        if self.index.classify(reference) == RefKind::Unresolved {
            diagnostics.push(unresolved(subject, reference));
        }
        type_name(reference)
    }

    fn opaque(&self, subject: &str, reason: &str, diagnostics: &mut Vec<Diagnostic>) -> TypePlan {
        log::warn!("{}: {}, falling back to raw JSON", subject, reason);
        diagnostics.push(Diagnostic::new(subject, format!("{}, falling back to raw JSON", reason)));
        TypePlan::Opaque
    }
}

fn unresolved(subject: &str, reference: &str) -> Diagnostic {
    let diagnostic = Diagnostic::new(
        subject,
        format!("no definition found for '{}', treating it as an object", reference),
    );
    log::warn!("{}", diagnostic);
    diagnostic
}
