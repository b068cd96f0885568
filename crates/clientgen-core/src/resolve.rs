//! Reference resolution against the document's definitions.
//!
//! Definition keys in real Swagger documents do not agree on casing: the same
//! type may be declared as `apiAccount` and referenced as `ApiAccount`, or
//! declared as `session_refresh` and referenced as `SessionRefresh`. Every
//! lookup by reference goes through [`DefinitionIndex::lookup`], which tries
//! the PascalCase forms first, then the camelCase forms, then the name as
//! written and its snake_case form.

// Internal imports (std, crate)
use std::collections::BTreeMap;
use std::fmt;

use crate::openapi::Definition;
use crate::utils::{camel_to_pascal, camel_to_snake, pascal_to_camel, snake_to_camel, snake_to_pascal};

// External imports (alphabetized)
use serde::Serialize;

/// Prefix of a local definition reference
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Strip `#/definitions/` from a reference
pub fn strip_ref_prefix(reference: &str) -> &str {
    reference.strip_prefix(DEFINITIONS_PREFIX).unwrap_or(reference)
}

/// Strip the prefix and capitalize, giving the name used for lookups
pub fn clean_ref(reference: &str) -> String {
    camel_to_pascal(strip_ref_prefix(reference))
}

/// The generated type name for a definition key or reference
pub fn type_name(reference: &str) -> String {
    let sanitized: String = strip_ref_prefix(reference)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    snake_to_pascal(&sanitized)
}

/// How a reference resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// The referenced definition is an enum
    Enum,
    /// The referenced definition is an object
    Object,
    /// No casing of the name matched a definition
    Unresolved,
}

/// A non-fatal problem found while planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The definition, field, operation or parameter the problem belongs to
    pub subject: String,
    /// What is wrong and how generation proceeds
    pub message: String,
}

impl Diagnostic {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Case-tolerant view over the document's definitions
#[derive(Debug, Clone, Copy)]
pub struct DefinitionIndex<'a> {
    definitions: &'a BTreeMap<String, Definition>,
}

impl<'a> DefinitionIndex<'a> {
    pub fn new(definitions: &'a BTreeMap<String, Definition>) -> Self {
        Self { definitions }
    }

    /// Find the definition a name refers to under any supported casing.
    ///
    /// Returns the key the definition is stored under together with it.
    pub fn lookup(&self, name: &str) -> Option<(&'a str, &'a Definition)> {
        let name = strip_ref_prefix(name);
        let tiers: [[String; 2]; 3] = [
            [camel_to_pascal(name), snake_to_pascal(name)],
            [pascal_to_camel(name), snake_to_camel(name)],
            [name.to_string(), camel_to_snake(name)],
        ];

        tiers.iter().flatten().find_map(|candidate| {
            self.definitions
                .get_key_value(candidate.as_str())
                .map(|(key, def)| (key.as_str(), def))
        })
    }

    /// Classify a reference.
    ///
    /// Callers turn [`RefKind::Unresolved`] into a [`Diagnostic`] and log it.
    pub fn classify(&self, name: &str) -> RefKind {
        match self.lookup(name) {
            Some((_, def)) if def.is_enum() => RefKind::Enum,
            Some(_) => RefKind::Object,
            None => RefKind::Unresolved,
        }
    }

    /// Whether a reference names an enum definition.
    /// Unresolved references are treated as objects.
    pub fn is_ref_to_enum(&self, name: &str) -> bool {
        self.classify(name) == RefKind::Enum
    }
}
