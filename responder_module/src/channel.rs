//! Seam between the message router and the messaging transport.
//!
//! The router only sees `InboundEvent` values and a `MessagingProvider`
//! handle; everything gateway-specific lives in `adapters`.

use serde::{Deserialize, Serialize};

/// An inbound message event delivered by the messaging gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Raw origin address, e.g. `6281234567890@c.us` or `1234-5678@g.us`.
    pub origin: String,
    /// Message text.
    pub body: String,
    /// Whether the origin is a group chat rather than a one-to-one chat.
    pub is_group_origin: bool,
    /// Display name reported by the gateway, when available.
    pub sender_name: Option<String>,
}

impl InboundEvent {
    /// Sender identifier with the transport suffix stripped
    /// (`"123@c.us"` -> `"123"`).
    pub fn sender_id(&self) -> &str {
        self.origin.split('@').next().unwrap_or(&self.origin)
    }
}

/// Chat metadata resolved for a group origin.
#[derive(Debug, Clone)]
pub struct ChatMetadata {
    pub is_group: bool,
    pub name: String,
    pub id: String,
}

/// Contact details for a message sender.
#[derive(Debug, Clone)]
pub struct SenderContact {
    pub display_name: Option<String>,
    pub phone_number: String,
}

/// Acknowledgement for a delivered reply.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("send error: {0}")]
    Send(String),
    #[error("metadata fetch error: {0}")]
    Metadata(String),
    #[error("provider config error: {0}")]
    Config(String),
}

/// Messaging transport as seen by the router: one send operation plus the
/// two metadata lookups used when logging group messages.
pub trait MessagingProvider: Send + Sync {
    fn fetch_chat_metadata(&self, event: &InboundEvent) -> Result<ChatMetadata, ProviderError>;
    fn fetch_sender_contact(&self, event: &InboundEvent) -> Result<SenderContact, ProviderError>;
    fn send_reply(&self, event: &InboundEvent, text: &str) -> Result<SendReceipt, ProviderError>;
}
