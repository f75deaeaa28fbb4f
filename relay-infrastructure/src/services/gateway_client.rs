use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use relay_domain::{GameCommand, GatewayClientConfig};

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueResponse {
    queue_length: usize,
}

/// Operator-side client for a running ingestion gateway.
pub struct GatewayClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GatewayClient {
    pub fn new(config: &GatewayClientConfig, request_timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("api_key is required to reach the gateway")?;
        Ok(Self {
            http: Client::builder().timeout(request_timeout).build()?,
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Returns the queue length the gateway reports after accepting.
    pub async fn queue_command(&self, command: &GameCommand) -> Result<usize> {
        let response: QueueResponse = self
            .http
            .post(format!("{}/queue-command", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(command)
            .send()
            .await?
            .error_for_status()
            .context("gateway rejected the command")?
            .json()
            .await?;
        Ok(response.queue_length)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    async fn queue(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("secret") {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
        }
        assert_eq!(body, json!({ "type": "announce", "message": "restart in 5" }));
        (
            StatusCode::CREATED,
            Json(json!({ "success": true, "queueLength": 3 })),
        )
    }

    async fn spawn_fake() -> String {
        let app = Router::new().route("/queue-command", post(queue));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{}", addr)
    }

    fn client(base: &str, key: &str) -> GatewayClient {
        let config = GatewayClientConfig {
            gateway_url: format!("{}/", base),
            api_key: Some(key.to_string()),
        };
        GatewayClient::new(&config, Duration::from_secs(5)).expect("client")
    }

    #[tokio::test]
    async fn queued_command_reports_length() {
        let base = spawn_fake().await;
        let length = client(&base, "secret")
            .queue_command(&GameCommand::announce("restart in 5"))
            .await
            .expect("queued");
        assert_eq!(length, 3);
    }

    #[tokio::test]
    async fn wrong_key_is_an_error() {
        let base = spawn_fake().await;
        assert!(client(&base, "nope")
            .queue_command(&GameCommand::announce("restart in 5"))
            .await
            .is_err());
    }

    #[test]
    fn missing_key_fails_fast() {
        let config = GatewayClientConfig {
            gateway_url: "http://127.0.0.1:3000".to_string(),
            api_key: None,
        };
        assert!(GatewayClient::new(&config, Duration::from_secs(1)).is_err());
    }
}
