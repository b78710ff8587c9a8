//! WhatsApp adapter for a whatsapp-web.js HTTP gateway (WAHA-style).
//!
//! - `WhatsAppInboundAdapter`: parses gateway webhook payloads into
//!   `InboundEvent` values.
//! - `WhatsAppHttpProvider`: sends replies and resolves chat/contact
//!   metadata through the gateway's REST API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::{
    ChatMetadata, InboundEvent, MessagingProvider, ProviderError, SendReceipt, SenderContact,
};

const GROUP_SUFFIX: &str = "@g.us";

/// Timeout for gateway requests
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

/// Adapter for parsing gateway webhook payloads.
#[derive(Debug, Clone, Default)]
pub struct WhatsAppInboundAdapter;

impl WhatsAppInboundAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Parse a webhook body into an inbound event. Non-message events and
    /// messages sent by this account are rejected.
    pub fn parse(&self, raw_payload: &[u8]) -> Result<InboundEvent, ProviderError> {
        let webhook: WebhookEnvelope = serde_json::from_slice(raw_payload)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if webhook.event != "message" {
            return Err(ProviderError::Parse(format!(
                "ignoring event kind '{}'",
                webhook.event
            )));
        }

        let payload = webhook
            .payload
            .ok_or_else(|| ProviderError::Parse("no payload in webhook".to_string()))?;

        if payload.from_me {
            return Err(ProviderError::Parse(
                "message sent by this account".to_string(),
            ));
        }
        if payload.from.is_empty() {
            return Err(ProviderError::Parse("message has no origin".to_string()));
        }

        let is_group_origin = payload.from.ends_with(GROUP_SUFFIX);

        Ok(InboundEvent {
            origin: payload.from,
            body: payload.body.unwrap_or_default(),
            is_group_origin,
            sender_name: payload.notify_name,
        })
    }
}

/// Provider that talks to the gateway's REST API with a blocking client.
/// Only ever called from the event worker thread.
#[derive(Debug, Clone)]
pub struct WhatsAppHttpProvider {
    base_url: String,
    session: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl WhatsAppHttpProvider {
    pub fn new(base_url: String, session: String, api_key: Option<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            api_key,
            client,
        }
    }

    fn get(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }
        request
    }

    fn post(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        let mut request = self.client.post(url);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }
        request
    }
}

impl MessagingProvider for WhatsAppHttpProvider {
    fn fetch_chat_metadata(&self, event: &InboundEvent) -> Result<ChatMetadata, ProviderError> {
        let url = format!(
            "{}/api/{}/chats/{}",
            self.base_url, self.session, event.origin
        );
        let response = self
            .get(&url)
            .send()
            .map_err(|e| ProviderError::Metadata(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Metadata(format!(
                "gateway returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| ProviderError::Metadata(e.to_string()))?;

        Ok(ChatMetadata {
            is_group: chat
                .is_group
                .unwrap_or_else(|| event.origin.ends_with(GROUP_SUFFIX)),
            name: chat.name.unwrap_or_else(|| event.origin.clone()),
            id: serialized_id(&chat.id).unwrap_or_else(|| event.origin.clone()),
        })
    }

    fn fetch_sender_contact(&self, event: &InboundEvent) -> Result<SenderContact, ProviderError> {
        let url = format!(
            "{}/api/contacts?contactId={}&session={}",
            self.base_url, event.origin, self.session
        );
        let response = self
            .get(&url)
            .send()
            .map_err(|e| ProviderError::Metadata(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Metadata(format!(
                "gateway returned {}: {}",
                status, body
            )));
        }

        let contact: ContactResponse = response
            .json()
            .map_err(|e| ProviderError::Metadata(e.to_string()))?;

        Ok(SenderContact {
            display_name: contact.name.or(contact.pushname),
            phone_number: contact
                .number
                .unwrap_or_else(|| event.sender_id().to_string()),
        })
    }

    fn send_reply(&self, event: &InboundEvent, text: &str) -> Result<SendReceipt, ProviderError> {
        let url = format!("{}/api/sendText", self.base_url);
        let request = SendTextRequest {
            session: self.session.clone(),
            chat_id: event.origin.clone(),
            text: text.to_string(),
        };

        debug!("sending reply to {} via {}", event.origin, url);

        let response = self
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| ProviderError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Send(format!(
                "gateway returned {}: {}",
                status, body
            )));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| ProviderError::Send(e.to_string()))?;
        let message_id = serialized_id(&body["id"]).unwrap_or_default();

        Ok(SendReceipt { message_id })
    }
}

/// Gateway ids come either as a plain string or as `{"_serialized": "..."}`.
fn serialized_id(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .or_else(|| value["_serialized"].as_str())
        .map(|id| id.to_string())
}

// ============================================================================
// Webhook types (inbound)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub payload: Option<WebhookPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub id: Option<String>,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "fromMe", default)]
    pub from_me: bool,
    #[serde(rename = "notifyName", default)]
    pub notify_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

// ============================================================================
// Gateway API types (outbound)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct SendTextRequest {
    session: String,
    #[serde(rename = "chatId")]
    chat_id: String,
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "isGroup", default)]
    is_group: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContactResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pushname: Option<String>,
    #[serde(default)]
    number: Option<String>,
}
