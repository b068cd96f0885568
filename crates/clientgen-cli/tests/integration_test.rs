//! End-to-end integration tests for the clientgen CLI

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FIXTURE: &str = "tests/fixtures/nakama.swagger.json";

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(FIXTURE)
}

fn clientgen() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_clientgen"));
    command.env_remove("RUST_LOG").env_remove("CLIENTGEN_TEMPLATE_DIR");
    command
}

/// Run the binary and fail with its stderr when it exits unsuccessfully
fn run_ok(command: &mut Command) -> Result<Output> {
    let output = command.output()?;
    if !output.status.success() {
        bail!(
            "clientgen failed with {}:\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(output)
}

fn read(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generates_to_stdout() -> Result<()> {
        let output = run_ok(clientgen().arg(fixture_path()))?;
        let source = String::from_utf8(output.stdout)?;

        assert!(source.starts_with("// Code generated by clientgen. DO NOT EDIT.\n// Nakama API v2 (version 2.0)\n"));
        assert!(!source.contains("// warning:"), "unexpected diagnostics:\n{}", source);
        assert!(source.contains("pub const DEFAULT_BASE_URL: &str = \"http://127.0.0.1:7350\";"));

        // enum with positional docs and normalised member names
        assert!(source.contains("pub enum ApiStoreProvider {"));
        assert!(source.contains("    /// - APPLE_APP_STORE: Apple App Store\n    #[default]\n    AppleAppStore = 0,"));
        assert!(source.contains("    FacebookInstantStore = 3,"));

        // object referencing the enum through a PascalCase $ref
        assert!(source.contains("    #[serde(rename = \"provider\")]\n    provider: ApiStoreProvider,"));
        assert!(source.contains("    #[serde(rename = \"edge_count\")]\n    edge_count: i64,"));
        assert!(source.contains("    user: Option<Box<ApiUser>>,"));
        assert!(source.contains("pub fn user(&self) -> Option<&ApiUser> {"));
        assert!(source.contains("    vars: HashMap<String, String>,"));

        // methods
        assert!(source.contains("pub async fn healthcheck_async("));
        assert!(source.contains("pub async fn rpc_func2_async("));
        assert!(source.contains(
            "        basic_auth_username: &str,\n        basic_auth_password: &str,\n        // The device account details.\n        account: Option<&ApiAccountDevice>,"
        ));
        assert!(source.contains("query_params.push_str(&format!(\"{}={}&\", \"http_key\", urlencoding::encode(http_key)));"));
        assert!(source.contains("query_params.push_str(&format!(\"{}={}&\", \"create\", create));"));
        assert!(source.contains("            for value in ids {"));
        assert!(source.contains("url_path = url_path.replace(\"{groupId}\", &urlencoding::encode(&group_id.to_string()));"));
        assert!(source.contains(") -> Result<ApiSession, ApiError> {"));
        Ok(())
    }

    #[test]
    fn test_writes_output_file_with_sub_namespace() -> Result<()> {
        let dir = tempdir()?;
        let output_path = dir.path().join("generated").join("nakama.rs");

        let output = run_ok(
            clientgen()
                .arg(fixture_path())
                .arg("Satori")
                .arg("-o")
                .arg(&output_path),
        )?;
        assert!(output.stdout.is_empty());

        let source = read(&output_path)?;
        assert!(source.contains("\npub mod satori {\n"));
        assert!(source.trim_end().ends_with("}\n}"));
        Ok(())
    }

    #[test]
    fn test_config_file_with_flag_overrides() -> Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join("clientgen.toml");
        std::fs::write(
            &config_path,
            format!(
                "schema_path = {:?}\noperation_prefix = \"\"\nclient_name = \"NakamaClient\"\n",
                fixture_path().to_string_lossy()
            ),
        )?;

        let output = run_ok(
            clientgen()
                .arg("--config")
                .arg(&config_path)
                .arg("--base-url")
                .arg("https://nakama.example.com/"),
        )?;
        let source = String::from_utf8(output.stdout)?;
        assert!(source.contains("pub struct NakamaClient<A: HttpAdapter> {"));
        assert!(source.contains("pub async fn nakama_get_account_async("));
        assert!(source.contains("pub const DEFAULT_BASE_URL: &str = \"https://nakama.example.com\";"));
        Ok(())
    }

    #[test]
    fn test_custom_template_dir() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join("client.rs.tera"),
            "{% for method in methods %}{{ method.fn_name }} {{ method.auth }}\n{% endfor %}",
        )?;

        let output = run_ok(
            clientgen()
                .arg(fixture_path())
                .arg("--template-kind")
                .arg("custom")
                .arg("--template-dir")
                .arg(dir.path()),
        )?;
        let listing = String::from_utf8(output.stdout)?;
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines.contains(&"authenticate_device_async basic"));
        assert!(lines.contains(&"get_account_async bearer"));
        Ok(())
    }

    #[test]
    fn test_failures_exit_nonzero() -> Result<()> {
        let missing = clientgen().arg("does-not-exist.swagger.json").output()?;
        assert!(!missing.status.success());
        assert!(String::from_utf8_lossy(&missing.stderr).contains("Failed to generate client"));

        let empty_namespace = clientgen().arg(fixture_path()).arg("").output()?;
        assert!(!empty_namespace.status.success());
        assert!(String::from_utf8_lossy(&empty_namespace.stderr).contains("sub-namespace"));

        let bad_kind = clientgen()
            .arg(fixture_path())
            .arg("--template-kind")
            .arg("python")
            .output()?;
        assert!(!bad_kind.status.success());

        let no_schema = clientgen().output()?;
        assert!(!no_schema.status.success());
        Ok(())
    }
}
