//! clientgen Core Library
//!
//! This library turns a Swagger 2.0 document into the source of a typed,
//! asynchronous API client: one type per schema definition and one method per
//! operation, rendered through Tera templates from a language-neutral plan.
//!
//! ```
//! use clientgen_core::{render, Config};
//!
//! let doc = br#"{"definitions": {"apiStatus": {"enum": ["ONLINE", "OFFLINE"]}}}"#;
//! let source = render(doc, &Config::new("api.json")).unwrap();
//! assert!(source.contains("pub enum ApiStatus {"));
//! ```

pub mod builders;
pub mod config;
pub mod error;
pub mod generate;
pub mod openapi;
pub mod plan;
pub mod resolve;
pub mod templates;
pub mod types;
pub mod utils;

pub use crate::{
    config::Config,
    error::{Error, Result},
    generate::{generate, render, GenerationReport},
    openapi::OpenApiContext,
    plan::{build_plan, ApiPlan},
    resolve::Diagnostic,
    templates::{TemplateDir, TemplateKind, TemplateManager},
};
