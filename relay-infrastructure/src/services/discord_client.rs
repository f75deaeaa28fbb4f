use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use relay_domain::ports::MessagingPlatform;
use relay_domain::{MessageRef, OutgoingMessage};

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
    channel_id: String,
}

/// Bot-token client for the Discord channel message REST endpoints.
pub struct DiscordClient {
    http: Client,
    api_base: String,
    token: String,
}

impl DiscordClient {
    pub fn new(api_base: &str, token: &str, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("scum-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{}/messages", self.api_base, channel_id)
    }

    fn message_url(&self, channel_id: &str, message_id: &str) -> String {
        format!("{}/channels/{}/messages/{}", self.api_base, channel_id, message_id)
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl MessagingPlatform for DiscordClient {
    async fn send_message(&self, channel_id: &str, message: &OutgoingMessage) -> Result<MessageRef> {
        let response: MessageResponse = self
            .http
            .post(self.messages_url(channel_id))
            .header(AUTHORIZATION, self.auth())
            .json(message)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("send to channel {} rejected", channel_id))?
            .json()
            .await?;
        Ok(MessageRef {
            channel_id: response.channel_id,
            message_id: response.id,
        })
    }

    async fn edit_message(&self, target: &MessageRef, message: &OutgoingMessage) -> Result<()> {
        self.http
            .patch(self.message_url(&target.channel_id, &target.message_id))
            .header(AUTHORIZATION, self.auth())
            .json(message)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("edit of message {} rejected", target.message_id))?;
        Ok(())
    }

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<Option<MessageRef>> {
        let response = self
            .http
            .get(self.message_url(channel_id, message_id))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let found: MessageResponse = response
            .error_for_status()
            .with_context(|| format!("fetch of message {} rejected", message_id))?
            .json()
            .await?;
        Ok(Some(MessageRef {
            channel_id: found.channel_id,
            message_id: found.id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Clone, Default)]
    struct FakeDiscord {
        bodies: Arc<Mutex<Vec<Value>>>,
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some("Bot test-token")
    }

    async fn create(
        State(fake): State<FakeDiscord>,
        Path(channel): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, AxumStatus> {
        if !authorized(&headers) {
            return Err(AxumStatus::UNAUTHORIZED);
        }
        fake.bodies.lock().expect("lock").push(body);
        Ok(Json(json!({ "id": "900", "channel_id": channel })))
    }

    async fn fetch(Path((channel, id)): Path<(String, String)>) -> Result<Json<Value>, AxumStatus> {
        match id.as_str() {
            "900" => Ok(Json(json!({ "id": id, "channel_id": channel }))),
            "broken" => Err(AxumStatus::INTERNAL_SERVER_ERROR),
            _ => Err(AxumStatus::NOT_FOUND),
        }
    }

    async fn edit(
        State(fake): State<FakeDiscord>,
        Path((channel, id)): Path<(String, String)>,
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, AxumStatus> {
        if id != "900" {
            return Err(AxumStatus::NOT_FOUND);
        }
        fake.bodies.lock().expect("lock").push(body);
        Ok(Json(json!({ "id": id, "channel_id": channel })))
    }

    async fn spawn_fake() -> (String, FakeDiscord) {
        let fake = FakeDiscord::default();
        let app = Router::new()
            .route("/channels/:channel/messages", post(create))
            .route("/channels/:channel/messages/:id", get(fetch).patch(edit))
            .with_state(fake.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        (format!("http://{}", addr), fake)
    }

    #[tokio::test]
    async fn send_edit_and_fetch_round_trip() {
        let (base, fake) = spawn_fake().await;
        let client = DiscordClient::new(&base, "test-token", Duration::from_secs(5)).expect("client");

        let sent = client
            .send_message("42", &OutgoingMessage::text("hello"))
            .await
            .expect("send");
        assert_eq!(sent.channel_id, "42");
        assert_eq!(sent.message_id, "900");

        client
            .edit_message(&sent, &OutgoingMessage::text("edited"))
            .await
            .expect("edit");
        let bodies = fake.bodies.lock().expect("lock").clone();
        assert_eq!(bodies[0]["content"], "hello");
        assert_eq!(bodies[1]["content"], "edited");

        assert_eq!(client.fetch_message("42", "900").await.expect("fetch"), Some(sent));
    }

    #[tokio::test]
    async fn missing_message_is_none_but_server_error_is_err() {
        let (base, _) = spawn_fake().await;
        let client = DiscordClient::new(&base, "test-token", Duration::from_secs(5)).expect("client");

        assert_eq!(client.fetch_message("42", "gone").await.expect("fetch"), None);
        assert!(client.fetch_message("42", "broken").await.is_err());
    }

    #[tokio::test]
    async fn bad_token_surfaces_as_error() {
        let (base, _) = spawn_fake().await;
        let client = DiscordClient::new(&base, "wrong", Duration::from_secs(5)).expect("client");
        let err = client
            .send_message("42", &OutgoingMessage::text("hello"))
            .await
            .expect_err("unauthorized");
        assert!(err.to_string().contains("channel 42"));
    }
}
