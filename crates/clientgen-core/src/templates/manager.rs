//! Template loading and rendering

// Internal imports (std, crate)
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::task;

use crate::{
    builders::ClientContext,
    config::Config,
    error::{Error, Result},
    plan::ApiPlan,
};

use super::{TemplateDir, TemplateKind, ENTRY_TEMPLATE};

// External imports (alphabetized)
use serde_json::Value as JsonValue;
use tera::{Context, Tera};

/// The built-in Rust client template
const RUST_CLIENT_TEMPLATE: &str = include_str!("../../templates/rust/client.rs.tera");

/// Manages loading and rendering of code generation templates
#[derive(Debug, Clone)]
pub struct TemplateManager {
    /// Cached Tera template engine instance
    tera: Arc<Tera>,
    kind: TemplateKind,
    /// Source directory for custom templates
    template_dir: Option<TemplateDir>,
}

impl TemplateManager {
    /// The manager for the built-in Rust template
    pub fn builtin() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(ENTRY_TEMPLATE, RUST_CLIENT_TEMPLATE)?;
        Ok(Self {
            tera: Arc::new(tera),
            kind: TemplateKind::Rust,
            template_dir: None,
        })
    }

    /// Create a new TemplateManager for the given template kind
    ///
    /// # Arguments
    /// * `template_kind` - The kind of template to use
    /// * `template_dir` - Directory of a custom template. Ignored for built-in kinds;
    ///   discovered from the standard locations when absent.
    pub async fn new(template_kind: TemplateKind, template_dir: Option<PathBuf>) -> Result<Self> {
        if template_kind.is_builtin() {
            return Self::builtin();
        }

        let template_dir = TemplateDir::discover(template_dir.as_deref())?;
        let files = Self::discover_template_files(template_dir.template_path()).await?;

        let mut templates = Vec::with_capacity(files.len());
        for file in files {
            let name = Self::template_name(template_dir.template_path(), &file)?;
            let source = tokio::fs::read_to_string(&file).await?;
            log::debug!("Loaded template: {}", name);
            templates.push((name, source));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(templates).map_err(|e| {
            Error::template(format!(
                "Failed to parse templates in {}: {}",
                template_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            tera: Arc::new(tera),
            kind: template_kind,
            template_dir: Some(template_dir),
        })
    }

    /// Get the template kind this template manager is configured for
    pub fn template_kind(&self) -> TemplateKind {
        self.kind
    }

    /// Get the custom template directory, if any
    pub fn template_dir(&self) -> Option<&TemplateDir> {
        self.template_dir.as_ref()
    }

    /// Check if a template exists
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template(name).is_ok()
    }

    /// List all loaded templates
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tera.get_template_names().map(String::from).collect();
        names.sort();
        names
    }

    /// Discovers all template files in the given directory and its subdirectories.
    ///
    /// This function uses `spawn_blocking` to avoid blocking the async runtime
    /// during filesystem operations.
    pub async fn discover_template_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let dir_buf = dir.to_path_buf();

        task::spawn_blocking(move || {
            let mut templates = Vec::new();

            fn walk_dir(dir: &Path, templates: &mut Vec<PathBuf>) -> std::io::Result<()> {
                for entry in std::fs::read_dir(dir)? {
                    let entry = entry?;
                    let path = entry.path();

                    if path.is_dir() {
                        walk_dir(&path, templates)?;
                    } else if path.extension().and_then(|s| s.to_str()) == Some("tera") {
                        templates.push(path);
                    }
                }
                Ok(())
            }

            walk_dir(&dir_buf, &mut templates)?;
            templates.sort();
            Ok(templates)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to join blocking task: {}", e)))?
    }

    /// Template name relative to its directory, with `/` separators
    fn template_name(root: &Path, file: &Path) -> Result<String> {
        let relative = file.strip_prefix(root).map_err(|_| {
            Error::template(format!("{} is outside {}", file.display(), root.display()))
        })?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| {
                c.as_os_str()
                    .to_str()
                    .ok_or_else(|| Error::template("Template path contains invalid UTF-8"))
            })
            .collect::<Result<_>>()?;
        Ok(parts.join("/"))
    }

    /// Render the client for a plan
    pub fn render_plan(&self, plan: &ApiPlan, config: &Config) -> Result<String> {
        let context = ClientContext::build(self.kind, plan, config)?;
        self.render_context(&context)
    }

    /// Render the entry template with a prepared context
    pub fn render_context(&self, context: &JsonValue) -> Result<String> {
        let context_map = context
            .as_object()
            .ok_or_else(|| Error::template("Context must be a JSON object"))?;

        let mut tera_context = Context::new();
        for (k, v) in context_map {
            tera_context.insert(k, v);
        }

        log::debug!("Rendering template: {}", ENTRY_TEMPLATE);
        match self.tera.render(ENTRY_TEMPLATE, &tera_context) {
            Ok(content) => {
                log::debug!("Rendered {} ({} bytes)", ENTRY_TEMPLATE, content.len());
                Ok(content)
            }
            Err(e) => {
                log::error!("Template rendering failed for '{}': {:?}", ENTRY_TEMPLATE, e);
                log::error!(
                    "Available context keys: {:?}",
                    context_map.keys().collect::<Vec<_>>()
                );
                Err(Error::template(format!(
                    "Failed to render template '{}': {}",
                    ENTRY_TEMPLATE,
                    render_error_chain(&e)
                )))
            }
        }
    }
}

/// Tera nests the useful message in the error source chain
fn render_error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::OpenApiContext;
    use crate::plan::build_plan;
    use tempfile::tempdir;

    fn plan() -> (ApiPlan, Config) {
        let spec = OpenApiContext::from_slice(
            br#"{"info": {"title": "Demo"}, "definitions": {"apiStatus": {"enum": ["ON"]}}}"#,
        )
        .unwrap();
        let config = Config::new("demo.json");
        (build_plan(&spec, &config), config)
    }

    #[test]
    fn test_builtin_has_entry_template() {
        let manager = TemplateManager::builtin().unwrap();
        assert_eq!(manager.template_kind(), TemplateKind::Rust);
        assert!(manager.has_template(ENTRY_TEMPLATE));
        assert_eq!(manager.template_names(), vec![ENTRY_TEMPLATE.to_string()]);
        assert!(manager.template_dir().is_none());
    }

    #[tokio::test]
    async fn test_custom_templates_with_includes() -> crate::Result<()> {
        let dir = tempdir()?;
        tokio::fs::create_dir_all(dir.path().join("partials")).await?;
        tokio::fs::write(
            dir.path().join(ENTRY_TEMPLATE),
            "{% include \"partials/types.tera\" %}// {{ client_name }} for {{ plan.title }}",
        )
        .await?;
        tokio::fs::write(
            dir.path().join("partials/types.tera"),
            "{% for ty in types %}// {{ ty.kind }} {{ ty.name }}\n{% endfor %}",
        )
        .await?;

        let manager =
            TemplateManager::new(TemplateKind::Custom, Some(dir.path().to_path_buf())).await?;
        assert_eq!(
            manager.template_names(),
            vec![ENTRY_TEMPLATE.to_string(), "partials/types.tera".to_string()]
        );

        let (plan, config) = plan();
        let output = manager.render_plan(&plan, &config)?;
        assert_eq!(output, "// enum ApiStatus\n// ApiClient for Demo");
        Ok(())
    }

    #[tokio::test]
    async fn test_render_failure_is_template_error() -> crate::Result<()> {
        let dir = tempdir()?;
        tokio::fs::write(dir.path().join(ENTRY_TEMPLATE), "{{ missing.field }}").await?;

        let manager =
            TemplateManager::new(TemplateKind::Custom, Some(dir.path().to_path_buf())).await?;
        let (plan, config) = plan();
        let result = manager.render_plan(&plan, &config);
        assert!(matches!(result, Err(Error::Template(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_custom_dir() {
        let result = TemplateManager::new(
            TemplateKind::Custom,
            Some(PathBuf::from("/nonexistent/clientgen/templates")),
        )
        .await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
