//! Code generation functionality for clientgen

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    config::Config,
    error::{Error, Result},
    openapi::OpenApiContext,
    plan::{build_plan, ApiPlan},
    resolve::Diagnostic,
    templates::{TemplateKind, TemplateManager},
};

use tokio::io::AsyncWriteExt;

/// Generated source together with the plan it was rendered from
#[derive(Debug, Clone)]
pub struct Rendered {
    pub source: String,
    pub plan: ApiPlan,
}

/// Summary of a completed [`generate`] run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Output file; `None` when written to stdout
    pub output: Option<PathBuf>,
    pub bytes: usize,
    pub definitions: usize,
    pub operations: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render client source from raw document bytes with the built-in template
pub fn render(bytes: &[u8], config: &Config) -> Result<String> {
    config.validate()?;
    let spec = OpenApiContext::from_slice(bytes)?;
    let manager = TemplateManager::builtin()?;
    Ok(render_with(&spec, config, &manager)?.source)
}

/// Plan a decoded document and render it with the given templates
pub fn render_with(spec: &OpenApiContext, config: &Config, manager: &TemplateManager) -> Result<Rendered> {
    let plan = build_plan(spec, config);
    let source = manager.render_plan(&plan, config)?;
    Ok(Rendered { source, plan })
}

/// Main entry point for code generation
pub async fn generate(config: &Config) -> Result<GenerationReport> {
    config.validate()?;

    // 1. Load the schema from a file or URL
    let spec = OpenApiContext::from_file_or_url(&config.schema_path).await?;

    // 2. Initialize the template manager
    let template_kind = TemplateKind::from_str(&config.template_kind).map_err(Error::config)?;
    let template_dir = config.template_dir.as_ref().map(PathBuf::from);
    let manager = TemplateManager::new(template_kind, template_dir).await?;

    // 3. Render and write
    let Rendered { source, plan } = render_with(&spec, config, &manager)?;
    let output = config.output.as_ref().map(PathBuf::from);
    match &output {
        Some(path) => write_file(path, &source).await?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(source.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    log::info!(
        "Generated {} types and {} methods ({} bytes) to {}",
        plan.definitions.len(),
        plan.operations.len(),
        source.len(),
        output
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string())
    );

    Ok(GenerationReport {
        output,
        bytes: source.len(),
        definitions: plan.definitions.len(),
        operations: plan.operations.len(),
        diagnostics: plan.diagnostics,
    })
}

async fn write_file(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    log::debug!("Writing to output file: {}", path.display());
    tokio::fs::write(path, source).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SESSION_ENUM: &str =
        r#"{"definitions": {"session_refresh": {"enum": ["pending", "active"], "description": "A\nB"}}}"#;

    const ACCOUNT: &str = r##"{
        "swagger": "2.0",
        "info": {"title": "Nakama API v2", "version": "2.0"},
        "host": "127.0.0.1:7350",
        "schemes": ["http"],
        "paths": {
            "/v2/account/{id}": {
                "get": {
                    "operationId": "Nakama_GetAccount",
                    "parameters": [{"name": "id", "in": "path", "required": true, "type": "string"}],
                    "responses": {"200": {"schema": {"$ref": "#/definitions/Account"}}}
                }
            }
        },
        "definitions": {
            "Account": {
                "properties": {
                    "user_id": {"type": "string"},
                    "devices": {"type": "array", "items": {"$ref": "#/definitions/apiDevice"}},
                    "wallet": {"type": "object", "additionalProperties": {"type": "integer"}}
                }
            },
            "apiDevice": {"properties": {"id": {"type": "string"}}}
        }
    }"##;

    #[test]
    fn test_render_enum_scenario() {
        let source = render(SESSION_ENUM.as_bytes(), &Config::new("api.json")).unwrap();
        assert!(source.starts_with("// Code generated by clientgen. DO NOT EDIT."));
        assert!(source.contains("pub enum SessionRefresh {"));
        assert!(source.contains("    /// A\n    #[default]\n    Pending = 0,"));
        assert!(source.contains("    /// B\n    Active = 1,"));
        assert!(source.contains("Self::Active => \"Active\","));
    }

    #[test]
    fn test_render_account_scenario() {
        let source = render(ACCOUNT.as_bytes(), &Config::new("api.json")).unwrap();

        assert!(source.contains("// Nakama API v2 (version 2.0)"));
        assert!(source.contains("pub const DEFAULT_BASE_URL: &str = \"http://127.0.0.1:7350\";"));

        // object type
        assert!(source.contains("    #[serde(rename = \"user_id\")]\n    user_id: String,"));
        assert!(source.contains("    devices: Vec<ApiDevice>,"));
        assert!(source.contains("    wallet: HashMap<String, i64>,"));
        assert!(source.contains("pub fn devices(&self) -> &[ApiDevice] {"));
        assert!(source.contains("write!(f, \"{}: {}, \", \"Wallet\", join_map(&self.wallet))?;"));

        // client method
        assert!(source.contains("pub async fn get_account_async("));
        assert!(source.contains("        bearer_token: &str,\n        id: Option<&str>,\n"));
        assert!(source.contains(") -> Result<Account, ApiError> {"));
        assert!(source.contains(
            "return Err(ApiError::InvalidArgument(\"'id' is required but was None.\".to_string()));"
        ));
        assert!(source.contains("url_path = url_path.replace(\"{id}\", &urlencoding::encode(&id.to_string()));"));
        assert!(!source.contains("fn encode_component"));
        assert!(source.contains("// Requires the serde (derive), serde_json, serde_repr, base64, tokio-util and urlencoding crates."));

        // implicit bearer security sends the header even for an empty token
        assert!(source.contains(
            "        headers.insert(\"Authorization\".to_string(), format!(\"Bearer {}\", bearer_token));\n"
        ));
        assert!(!source.contains("if !bearer_token.is_empty()"));
        assert!(source.contains(".send(\"GET\", &uri, headers, content, self.timeout, cancellation)"));
        assert!(source.contains("Ok(serde_json::from_slice(&response)?)"));
        assert!(!source.contains("{{"));
    }

    #[test]
    fn test_render_http_key_guards_empty_token() {
        let document = br##"{
            "paths": {"/v2/rpc/{id}": {"post": {
                "operationId": "Nakama_RpcFunc",
                "security": [{"HttpKeyAuth": []}],
                "parameters": [{"name": "id", "in": "path", "required": true, "type": "string"}],
                "responses": {"200": {"schema": {"$ref": "#/definitions/apiRpc"}}}
            }}},
            "definitions": {"apiRpc": {"properties": {"payload": {"type": "string"}}}}
        }"##;
        let source = render(document, &Config::new("api.json")).unwrap();
        assert!(source.contains(
            "        if !bearer_token.is_empty() {\n            headers.insert(\"Authorization\".to_string(), format!(\"Bearer {}\", bearer_token));\n        }"
        ));
    }

    #[test]
    fn test_render_sub_namespace() {
        let mut config = Config::new("api.json");
        config.sub_namespace = Some("Satori".to_string());
        let source = render(SESSION_ENUM.as_bytes(), &config).unwrap();
        assert!(source.contains("\npub mod satori {\n"));
        assert!(source.trim_end().ends_with("}\n}"));

        config.sub_namespace = Some(String::new());
        assert!(matches!(render(SESSION_ENUM.as_bytes(), &config), Err(Error::Config(_))));
    }

    #[test]
    fn test_render_rejects_malformed_document() {
        let result = render(br#"{"definitions": [1, 2]}"#, &Config::new("api.json"));
        assert!(matches!(result, Err(Error::OpenApi(_))));
    }

    #[tokio::test]
    async fn test_generate_writes_file() -> crate::Result<()> {
        let dir = tempdir()?;
        let schema = dir.path().join("api.json");
        tokio::fs::write(&schema, ACCOUNT).await?;

        let mut config = Config::new(schema.to_string_lossy());
        let output = dir.path().join("src").join("api.rs");
        config.output = Some(output.to_string_lossy().into_owned());

        let report = generate(&config).await?;
        assert_eq!(report.output.as_deref(), Some(output.as_path()));
        assert_eq!(report.definitions, 2);
        assert_eq!(report.operations, 1);
        assert!(report.diagnostics.is_empty());

        let written = tokio::fs::read_to_string(&output).await?;
        assert_eq!(written.len(), report.bytes);
        assert!(written.contains("pub struct ApiClient<A: HttpAdapter> {"));
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_rejects_unknown_template_kind() -> crate::Result<()> {
        let dir = tempdir()?;
        let schema = dir.path().join("api.json");
        tokio::fs::write(&schema, SESSION_ENUM).await?;

        let mut config = Config::new(schema.to_string_lossy());
        config.template_kind = "python".to_string();
        assert!(matches!(generate(&config).await, Err(Error::Config(_))));
        Ok(())
    }
}
