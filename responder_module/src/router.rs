//! Classifies inbound events and drives the reply flow.
//!
//! Each event takes exactly one path: exempt senders are dropped with a
//! notice, group messages are logged (never replied to), direct messages go
//! through the gatekeeper and, on approval, out through the provider.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::channel::{InboundEvent, MessagingProvider};
use crate::gatekeeper::Gatekeeper;
use crate::working_hours::WorkingHours;

/// Terminal state for one processed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Sender is on the exemption list; dropped without a reply.
    ExemptDropped,
    /// Group message logged with chat and sender metadata.
    GroupLogged,
    /// Group message dropped because a metadata lookup failed.
    GroupLogFailed,
    /// Direct message inside working hours or already replied today.
    Declined,
    /// Auto-reply sent and recorded.
    Replied,
    /// Reply delivery failed; nothing recorded.
    SendFailed,
}

pub struct MessageRouter {
    gatekeeper: Gatekeeper,
    provider: Arc<dyn MessagingProvider>,
    hours: WorkingHours,
    reply_text: String,
}

impl MessageRouter {
    pub fn new(
        gatekeeper: Gatekeeper,
        provider: Arc<dyn MessagingProvider>,
        hours: WorkingHours,
        reply_text: String,
    ) -> Self {
        Self {
            gatekeeper,
            provider,
            hours,
            reply_text,
        }
    }

    pub fn handle_event(&mut self, event: &InboundEvent) -> RouteOutcome {
        self.handle_event_at(event, Local::now())
    }

    /// Same as `handle_event` with an explicit clock reading.
    pub fn handle_event_at(&mut self, event: &InboundEvent, now: DateTime<Local>) -> RouteOutcome {
        let sender_id = event.sender_id().to_string();

        if self.gatekeeper.is_exempt(&sender_id) {
            info!("ignoring message from exempt sender {}", sender_id);
            return RouteOutcome::ExemptDropped;
        }

        if event.is_group_origin {
            return self.log_group_message(event, now);
        }

        let outside = self.hours.is_outside(now);
        if !self.gatekeeper.decide(&sender_id, now, outside) {
            return RouteOutcome::Declined;
        }

        if let Err(err) = self.provider.send_reply(event, &self.reply_text) {
            error!("failed to send auto-reply to {}: {}", sender_id, err);
            return RouteOutcome::SendFailed;
        }

        if let Err(err) = self.gatekeeper.record_sent(&sender_id, now) {
            warn!(
                "auto-reply to {} sent but not persisted: {}",
                sender_id, err
            );
        }
        info!("auto-reply sent to {}", sender_id);
        RouteOutcome::Replied
    }

    fn log_group_message(&self, event: &InboundEvent, now: DateTime<Local>) -> RouteOutcome {
        let chat = match self.provider.fetch_chat_metadata(event) {
            Ok(chat) => chat,
            Err(err) => {
                error!(
                    "failed to fetch chat metadata for {}: {}",
                    event.origin, err
                );
                return RouteOutcome::GroupLogFailed;
            }
        };
        let sender = match self.provider.fetch_sender_contact(event) {
            Ok(sender) => sender,
            Err(err) => {
                error!(
                    "failed to fetch sender contact for {}: {}",
                    event.origin, err
                );
                return RouteOutcome::GroupLogFailed;
            }
        };

        let sender_label = sender
            .display_name
            .unwrap_or_else(|| sender.phone_number.clone());
        info!(
            "[{}] group message: group={} id={} sender={} body={}",
            now.format("%Y-%m-%d %H:%M:%S"),
            chat.name,
            chat.id,
            sender_label,
            event.body
        );
        RouteOutcome::GroupLogged
    }
}
