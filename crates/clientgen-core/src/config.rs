//! Configuration management for clientgen code generation.
//!
//! This module defines the `Config` struct and related functionality for managing
//! code generation settings. The configuration can be loaded from a YAML, TOML or
//! JSON file, created programmatically, or assembled from command-line arguments.
//!
//! # Examples
//!
//! ```no_run
//! use clientgen_core::config::Config;
//!
//! // Create a new config programmatically
//! let mut config = Config::new("nakama.swagger.json");
//! config.output = Some("src/api.rs".to_string());
//! config.sub_namespace = Some("satori".to_string());
//!
//! // Or load from a config file
//! # async fn load() -> clientgen_core::Result<()> {
//! let config = Config::from_file("clientgen.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::Path;

use crate::Error;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use tokio::fs;
use url::Url;

/// Configuration for client generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path or URL of the Swagger document
    pub schema_path: String,

    /// Output file for the generated source; stdout when absent
    #[serde(default)]
    pub output: Option<String>,

    /// Module to nest the generated items under
    #[serde(default)]
    pub sub_namespace: Option<String>,

    /// Prefix removed from operation ids before deriving method names
    #[serde(default = "default_operation_prefix")]
    pub operation_prefix: String,

    /// Name of the generated client type
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Name of the generated non-success response error type
    #[serde(default = "default_error_name")]
    pub error_name: String,

    /// Overrides the base URL derived from the document
    #[serde(default)]
    pub base_url: Option<Url>,

    /// Template to use for code generation
    #[serde(default = "default_template")]
    pub template_kind: String,

    /// Optional path to a custom template directory
    #[serde(default)]
    pub template_dir: Option<String>,
}

impl Config {
    /// Create a new Config with default values
    pub fn new(schema_path: impl Into<String>) -> Self {
        Self {
            schema_path: schema_path.into(),
            output: None,
            sub_namespace: None,
            operation_prefix: default_operation_prefix(),
            client_name: default_client_name(),
            error_name: default_error_name(),
            base_url: None,
            template_kind: default_template(),
            template_dir: None,
        }
    }

    /// Check values that cannot be expressed by the type alone
    pub fn validate(&self) -> crate::Result<()> {
        if matches!(self.sub_namespace.as_deref(), Some(ns) if ns.trim().is_empty()) {
            return Err(Error::config("Empty sub-namespace provided"));
        }
        if self.client_name == self.error_name {
            return Err(Error::config(format!(
                "client_name and error_name are both '{}'",
                self.client_name
            )));
        }
        for (field, value) in [("client_name", &self.client_name), ("error_name", &self.error_name)] {
            let valid = value.starts_with(|c: char| c.is_ascii_alphabetic())
                && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(Error::config(format!(
                    "{} '{}' is not a valid type name",
                    field, value
                )));
            }
        }
        Ok(())
    }

    /// Load configuration from a file, choosing the format by extension
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let config = match ConfigFormat::of(path) {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(&content)?,
        };
        Ok(config)
    }

    /// Save configuration to a file, choosing the format by extension
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::of(path) {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
        };
        fs::write(path, content).await?;
        Ok(())
    }
}

enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

fn default_operation_prefix() -> String {
    "Nakama_".to_string()
}

fn default_client_name() -> String {
    "ApiClient".to_string()
}

fn default_error_name() -> String {
    "ApiResponseException".to_string()
}

fn default_template() -> String {
    "rust".to_string()
}
