//! clientgen CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

// Internal imports (std, crate)
use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use clientgen_core::{Config, TemplateKind};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Generate a typed async Rust client from a Swagger 2.0 document
#[derive(Parser, Debug)]
#[command(name = "clientgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path or URL of the Swagger document (JSON or YAML)
    ///
    /// Example: clientgen apigrpc.swagger.json
    /// Example: clientgen https://example.com/api.swagger.json
    schema: Option<String>,
    /// Module to nest the generated items under
    sub_namespace: Option<String>,
    /// Output file for the generated source (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Load settings from a YAML, TOML or JSON file; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Template to use for code generation (rust, custom)
    #[arg(long)]
    template_kind: Option<String>,
    /// Custom template directory (only used with --template-kind=custom)
    #[arg(long)]
    template_dir: Option<PathBuf>,
    /// Prefix stripped from operation ids (default: Nakama_)
    #[arg(long)]
    operation_prefix: Option<String>,
    /// Base URL emitted as DEFAULT_BASE_URL, overriding the document
    #[arg(long)]
    base_url: Option<Url>,
    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Build the generator config from the optional config file and flags
    async fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .await
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => {
                let schema = self
                    .schema
                    .clone()
                    .context("A schema path or --config is required")?;
                Config::new(schema)
            }
        };

        if let Some(schema) = self.schema {
            config.schema_path = schema;
        }
        if let Some(sub_namespace) = self.sub_namespace {
            config.sub_namespace = Some(sub_namespace);
        }
        if let Some(output) = self.output {
            config.output = Some(output.to_string_lossy().into_owned());
        }
        if let Some(template_kind) = self.template_kind {
            let kind: TemplateKind = template_kind
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid template '{template_kind}': {e}"))?;
            config.template_kind = kind.to_string();
        }
        if let Some(template_dir) = self.template_dir {
            config.template_dir = Some(template_dir.to_string_lossy().into_owned());
        }
        if let Some(prefix) = self.operation_prefix {
            config.operation_prefix = prefix;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = Some(base_url);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for generated source
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config().await?;
    tracing::debug!(?config, "Resolved configuration");

    let report = clientgen_core::generate(&config)
        .await
        .with_context(|| format!("Failed to generate client from {}", config.schema_path))?;

    if !report.diagnostics.is_empty() {
        tracing::warn!(
            count = report.diagnostics.len(),
            "Generation finished with diagnostics"
        );
    }
    if let Some(path) = &report.output {
        tracing::info!(
            "Generated {} types and {} methods in {}",
            report.definitions,
            report.operations,
            path.display()
        );
    }
    Ok(())
}
