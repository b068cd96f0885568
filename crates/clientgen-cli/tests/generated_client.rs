//! Builds the client generated from the Nakama fixture and runs it against a
//! recording transport

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

const FIXTURE: &str = "tests/fixtures/nakama.swagger.json";

const MANIFEST: &str = r#"[package]
name = "nakama-client-check"
version = "0.0.0"
edition = "2021"
publish = false

[dependencies]
base64 = "0.22"
serde = { version = "1.0", features = ["derive"] }
serde_json = "1.0"
serde_repr = "0.1"
tokio = { version = "1.0", features = ["rt", "macros"] }
tokio-util = "0.7"
urlencoding = "2.1"

[workspace]
"#;

const MAIN: &str = r##"#[allow(dead_code)]
mod api;

use api::*;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

struct Request {
    method: String,
    uri: String,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

struct Recorder {
    sends: AtomicUsize,
    requests: Mutex<Vec<Request>>,
    reply: Result<Vec<u8>, ApiResponseException>,
}

impl HttpAdapter for Recorder {
    fn send(
        &self,
        method: &str,
        uri: &str,
        headers: HashMap<String, String>,
        body: Option<Vec<u8>>,
        _timeout: Duration,
        _cancellation: Option<CancellationToken>,
    ) -> impl Future<Output = Result<Vec<u8>, ApiResponseException>> + Send {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(Request {
            method: method.to_string(),
            uri: uri.to_string(),
            headers,
            body,
        });
        let reply = self.reply.clone();
        async move { reply }
    }
}

fn client(reply: &str) -> ApiClient<Recorder> {
    ApiClient::new(
        "http://h/",
        Recorder {
            sends: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            reply: Ok(reply.as_bytes().to_vec()),
        },
    )
}

fn last(client: &ApiClient<Recorder>) -> Request {
    client.adapter().requests.lock().unwrap().pop().expect("a request was sent")
}

fn sends(client: &ApiClient<Recorder>) -> usize {
    client.adapter().sends.load(Ordering::SeqCst)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // missing required arguments fail before anything is sent
    let c = client("");
    match c.delete_group_async("tok", None, None).await {
        Err(ApiError::InvalidArgument(message)) => {
            assert_eq!(message, "'groupId' is required but was None.")
        }
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
    match c.update_account_async("tok", None, None).await {
        Err(ApiError::InvalidArgument(message)) => {
            assert_eq!(message, "'body' is required but was None.")
        }
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
    assert_eq!(sends(&c), 0);

    // path values are percent-encoded; the implicit bearer header is always sent
    c.delete_group_async("tok", Some("a b/c"), None).await.unwrap();
    let request = last(&c);
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.uri, "http://h/v2/group/a%20b%2Fc");
    assert_eq!(request.headers["Authorization"], "Bearer tok");
    assert!(request.body.is_none());

    let c = client("{}");
    let account = c.get_account_async("", None).await.unwrap();
    assert_eq!(last(&c).headers["Authorization"], "Bearer ");
    assert!(account.devices().is_empty());
    assert!(account.user().is_none());
    assert_eq!(account.wallet(), "");
    assert!(account.to_string().starts_with("CustomId: , Devices: [], "));

    // repeated query keys
    let c = client("");
    let ids = vec!["a".to_string(), "b c".to_string()];
    c.delete_friends_async("t", Some(ids.as_slice()), None, None).await.unwrap();
    assert_eq!(last(&c).uri, "http://h/v2/friend?ids=a&ids=b%20c");

    // basic auth, query encoding and typed responses
    let c = client(r#"{"id": "fn", "http_key": "k"}"#);
    let rpc = c
        .rpc_func2_async("user", "pass", Some("fn"), Some("{}"), Some("k y"), None)
        .await
        .unwrap();
    let request = last(&c);
    assert_eq!(request.uri, "http://h/v2/rpc/fn?payload=%7B%7D&http_key=k%20y");
    assert_eq!(request.headers["Authorization"], "Basic dXNlcjpwYXNz");
    assert_eq!(rpc.id(), "fn");
    assert_eq!(rpc.http_key(), "k");

    // body parameters are sent as JSON under their wire names
    let c = client(r#"{"created": true, "token": "tok"}"#);
    let device = ApiAccountDevice::default().with_id("dev");
    let session = c
        .authenticate_device_async("u", "p", Some(&device), Some(true), None, None)
        .await
        .unwrap();
    let request = last(&c);
    assert_eq!(request.method, "POST");
    assert_eq!(request.uri, "http://h/v2/account/authenticate/device?create=true");
    let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({"id": "dev", "vars": {}}));
    assert!(session.created());
    assert_eq!(session.token(), "tok");

    // non-success responses surface as the error type
    let failing = ApiClient::new(
        "http://h",
        Recorder {
            sends: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            reply: Err(ApiResponseException::new(404, "not found", 5)),
        },
    );
    match failing.healthcheck_async("t", None).await {
        Err(ApiError::Response(error)) => {
            assert_eq!(error.status_code, 404);
            assert_eq!(error.grpc_status_code, 5);
        }
        other => panic!("expected Response, got {:?}", other),
    }

    // enums travel as their declaration index
    assert_eq!(serde_json::to_string(&ApiStoreProvider::AppleAppStore).unwrap(), "0");
    assert_eq!(serde_json::to_string(&ApiStoreProvider::GooglePlayStore).unwrap(), "1");
    assert_eq!(
        serde_json::from_str::<ApiStoreProvider>("3").unwrap(),
        ApiStoreProvider::FacebookInstantStore
    );
    let user: ApiUser = serde_json::from_str(r#"{"provider": 2, "edge_count": 5}"#).unwrap();
    assert_eq!(user.provider(), ApiStoreProvider::HuaweiAppGallery);
    assert_eq!(user.provider().to_string(), "HuaweiAppGallery");
    assert_eq!(user.edge_count(), 5);
    assert_eq!(ApiStoreProvider::default(), ApiStoreProvider::AppleAppStore);

    // fields serialize under the original keys
    let encoded = serde_json::to_value(ApiAccount::default().with_custom_id("x")).unwrap();
    assert_eq!(encoded["custom_id"], "x");
    assert_eq!(encoded["devices"], serde_json::json!([]));

    println!("generated client ok");
}
"##;

fn cargo() -> Command {
    Command::new(std::env::var_os("CARGO").unwrap_or_else(|| "cargo".into()))
}

fn write_crate(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root.join("src"))?;
    std::fs::write(root.join("Cargo.toml"), MANIFEST)?;
    std::fs::write(root.join("src").join("main.rs"), MAIN)?;

    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(FIXTURE);
    let output = Command::new(env!("CARGO_BIN_EXE_clientgen"))
        .env_remove("RUST_LOG")
        .arg(&fixture)
        .arg("-o")
        .arg(root.join("src").join("api.rs"))
        .output()?;
    if !output.status.success() {
        bail!("clientgen failed:\n{}", String::from_utf8_lossy(&output.stderr));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generated_client_builds_and_runs() -> Result<()> {
        let dir = tempdir()?;
        write_crate(dir.path())?;

        let output = cargo()
            .arg("run")
            .arg("--quiet")
            .current_dir(dir.path())
            .env("CARGO_TARGET_DIR", Path::new(env!("CARGO_TARGET_TMPDIR")).join("generated-client"))
            .output()
            .context("Failed to run cargo for the generated client")?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            bail!(
                "generated client failed with {}:\n{}\n{}",
                output.status,
                stdout,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        assert!(stdout.contains("generated client ok"));
        Ok(())
    }
}
