//! Client for the local aria2 download-queue daemon (JSON-RPC over HTTP).
//!
//! The session creates at most one of these, lazily, the first time a bulk
//! download uses the builtin downloader.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SeedrError};

/// Sent with every enqueued URI; the service rejects the default reqwest
/// agent on direct file fetches.
const DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0";

pub struct DaemonClient {
    client: reqwest::Client,
    endpoint: String,
    secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl DaemonClient {
    /// `host` carries the scheme (`http://localhost` by default).
    pub fn new(host: &str, port: u16, secret: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}:{}/jsonrpc", host.trim_end_matches('/'), port),
            secret,
        }
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let mut all_params = Vec::with_capacity(params.len() + 1);
        if let Some(secret) = &self.secret {
            all_params.push(json!(format!("token:{}", secret)));
        }
        all_params.extend(params);

        let request = json!({
            "jsonrpc": "2.0",
            "id": Uuid::new_v4().to_string(),
            "method": method,
            "params": all_params,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;
        let envelope: RpcResponse = response.json().await?;

        if let Some(error) = envelope.error {
            return Err(SeedrError::Daemon {
                reason: format!("{} (code {})", error.message, error.code),
            });
        }
        envelope.result.ok_or_else(|| SeedrError::Daemon {
            reason: format!("{} returned neither result nor error", method),
        })
    }

    /// Enqueue a URI for download into `directory` at the given queue
    /// position. Returns the daemon's gid for the new download.
    pub async fn add_uri(&self, uri: &str, directory: &Path, position: usize) -> Result<String> {
        let options = json!({
            "dir": directory.to_string_lossy(),
            "user-agent": DOWNLOAD_USER_AGENT,
        });
        let result = self
            .call("aria2.addUri", vec![json!([uri]), options, json!(position)])
            .await?;

        let gid = result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SeedrError::Daemon {
                reason: "addUri returned no gid".to_string(),
            })?;
        debug!(%gid, position, "enqueued download");
        Ok(gid)
    }

    /// Whether the download behind `gid` has finished.
    ///
    /// A download the daemon gave up on would otherwise keep the drain loop
    /// spinning forever, so `error`/`removed` statuses are failures.
    pub async fn is_complete(&self, gid: &str) -> Result<bool> {
        let result = self
            .call("aria2.tellStatus", vec![json!(gid), json!(["status"])])
            .await?;
        let status = result
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| SeedrError::Daemon {
                reason: format!("tellStatus for {} carried no status", gid),
            })?;

        match status {
            "complete" => Ok(true),
            "error" | "removed" => Err(SeedrError::Daemon {
                reason: format!("download {} ended in status {}", gid, status),
            }),
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer, secret: Option<&str>) -> DaemonClient {
        DaemonClient::new(
            &format!("http://{}", server.host()),
            server.port(),
            secret.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_add_uri_sends_secret_and_returns_gid() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/jsonrpc")
                .body_includes("aria2.addUri")
                .body_includes("token:hunter2")
                .body_includes("\"dir\":\"/downloads\"");
            then.status(200)
                .json_body(serde_json::json!({"jsonrpc": "2.0", "id": "1", "result": "2089b05ecca3d829"}));
        });

        let client = client_for(&server, Some("hunter2"));
        let gid = client
            .add_uri("https://example.com/file.bin", Path::new("/downloads"), 0)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(gid, "2089b05ecca3d829");
    }

    #[tokio::test]
    async fn test_tell_status_maps_statuses() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/jsonrpc").body_includes("done");
            then.status(200).json_body(
                serde_json::json!({"jsonrpc": "2.0", "id": "1", "result": {"status": "complete"}}),
            );
        });
        server.mock(|when, then| {
            when.method(POST).path("/jsonrpc").body_includes("pending");
            then.status(200).json_body(
                serde_json::json!({"jsonrpc": "2.0", "id": "1", "result": {"status": "active"}}),
            );
        });
        server.mock(|when, then| {
            when.method(POST).path("/jsonrpc").body_includes("broken");
            then.status(200).json_body(
                serde_json::json!({"jsonrpc": "2.0", "id": "1", "result": {"status": "error"}}),
            );
        });

        let client = client_for(&server, None);
        assert!(client.is_complete("done").await.unwrap());
        assert!(!client.is_complete("pending").await.unwrap());
        assert!(matches!(
            client.is_complete("broken").await,
            Err(SeedrError::Daemon { .. })
        ));
    }

    #[tokio::test]
    async fn test_rpc_error_envelope_becomes_daemon_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/jsonrpc");
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": "1",
                "error": {"code": 1, "message": "Unauthorized"},
            }));
        });

        let client = client_for(&server, None);
        let result = client
            .add_uri("https://example.com/file.bin", Path::new("/tmp"), 0)
            .await;

        match result {
            Err(SeedrError::Daemon { reason }) => assert!(reason.contains("Unauthorized")),
            other => panic!("expected daemon error, got {:?}", other.map(|_| ())),
        }
    }
}
