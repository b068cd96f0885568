//! Context builder traits and adapters for language-specific codegen.
pub mod rust;

use crate::config::Config;
use crate::plan::ApiPlan;
use crate::templates::TemplateKind;
use serde_json::Value as JsonValue;

/// Trait for converting an [`ApiPlan`] into a language-specific template context.
pub trait ContextBuilder {
    fn build(&self, plan: &ApiPlan, config: &Config) -> crate::Result<JsonValue>;
}

pub struct ClientContext;

impl ClientContext {
    /// Build the full template context for a plan.
    ///
    /// The neutral plan is always available to templates under the `plan` key.
    pub fn build(template: TemplateKind, plan: &ApiPlan, config: &Config) -> crate::Result<JsonValue> {
        let builder = Self::get_builder(template);
        let mut context = builder.build(plan, config)?;
        if let JsonValue::Object(map) = &mut context {
            map.insert("plan".to_string(), serde_json::to_value(plan)?);
        }
        Ok(context)
    }

    /// Custom templates are rendered against the Rust context
    pub fn get_builder(template: TemplateKind) -> Box<dyn ContextBuilder> {
        match template {
            TemplateKind::Rust | TemplateKind::Custom => Box::new(rust::RustContextBuilder),
        }
    }
}
