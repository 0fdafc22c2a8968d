use std::future::Future;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::reply::AssistantReply;
use crate::state::{ChatId, ChatMessage, ChatRole};

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct CreateChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// A chat thread as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ChatSummary {
    pub fn chat_id(&self) -> ChatId {
        ChatId::new(self.id.to_string())
    }
}

/// A chat thread with its stored messages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatHistory {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl StoredMessage {
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage {
            role: ChatRole::from_str(&self.role),
            content: self.content.clone(),
        }
    }
}

/// Sends a user message to a chat and yields the decoded reply.
///
/// The composer only depends on this trait so it can run against an
/// in-memory transport in tests.
pub trait ChatTransport {
    fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
    ) -> impl Future<Output = Result<AssistantReply, ClientError>> + Send;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: Url,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `<base>/<segments...>`, escaping each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `POST /api/chats/{id}/message`.
    ///
    /// The body is decoded whatever the status: the server reports unknown
    /// chats and empty text as `{"error": ...}` with a 4xx status, and those
    /// are shown to the user as replies rather than treated as failures.
    pub async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
    ) -> Result<AssistantReply, ClientError> {
        let url = self.endpoint(&["api", "chats", chat_id.as_str(), "message"])?;
        debug!(%url, chars = text.chars().count(), "sending message");

        let response = self
            .client
            .post(url)
            .json(&SendMessageRequest { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%status, chat_id = %chat_id, "message endpoint returned an error status");
        }

        let reply = AssistantReply::from_json(&body)?;
        debug!(structured = reply.is_structured(), "reply decoded");
        Ok(reply)
    }

    /// `POST /api/chats`. The server picks a default title when none is given.
    pub async fn create_chat(&self, title: Option<&str>) -> Result<ChatSummary, ClientError> {
        let url = self.endpoint(&["api", "chats"])?;
        let response = self
            .client
            .post(url)
            .json(&CreateChatRequest { title })
            .send()
            .await?;

        read_json(response).await
    }

    /// `GET /api/chats`, newest first as served.
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>, ClientError> {
        let url = self.endpoint(&["api", "chats"])?;
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    /// `GET /api/chats/{id}`.
    pub async fn get_chat(&self, chat_id: &ChatId) -> Result<ChatHistory, ClientError> {
        let url = self.endpoint(&["api", "chats", chat_id.as_str()])?;
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }
}

impl ChatTransport for ChatClient {
    async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
    ) -> Result<AssistantReply, ClientError> {
        ChatClient::send_message(self, chat_id, text).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        return Err(ClientError::Server {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let client = ChatClient::new("http://localhost:5000").unwrap();
        let url = client.endpoint(&["api", "chats", "12", "message"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/chats/12/message");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = ChatClient::new("https://example.com/health/").unwrap();
        let url = client.endpoint(&["api", "chats"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/health/api/chats");
    }

    #[test]
    fn test_endpoint_escapes_chat_id() {
        let client = ChatClient::new("http://localhost:5000").unwrap();
        let url = client.endpoint(&["api", "chats", "a/b c", "message"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/chats/a%2Fb%20c/message");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ChatClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            ChatClient::new("mailto:someone@example.com"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_history_decoding() {
        let history: ChatHistory = serde_json::from_str(
            r#"{"id":3,"title":"New Symptom Check","messages":[
                {"id":1,"role":"user","content":"headache","created_at":"2024-01-01T00:00:00"},
                {"id":2,"role":"assistant","content":"Possible conditions:","created_at":"2024-01-01T00:00:01"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(history.messages.len(), 2);
        assert_eq!(history.messages[0].to_message(), ChatMessage::user("headache"));
        assert_eq!(history.messages[1].to_message().role, ChatRole::Assistant);
    }

    #[test]
    fn test_created_chat_without_timestamp() {
        let chat: ChatSummary = serde_json::from_str(r#"{"id":9,"title":"Cough"}"#).unwrap();
        assert_eq!(chat.chat_id(), ChatId::new("9"));
        assert_eq!(chat.created_at, None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_transport_error() {
        // nothing listens on port 1
        let client = ChatClient::new("http://127.0.0.1:1").unwrap();
        let result = client.send_message(&ChatId::new("1"), "hello").await;
        assert!(matches!(result, Err(ClientError::Http(_))));
    }
}
