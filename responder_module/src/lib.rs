pub mod adapters;
pub mod channel;
pub mod config;
pub mod gatekeeper;
pub mod notify_store;
pub mod router;
pub mod working_hours;

pub use channel::{ChatMetadata, InboundEvent, MessagingProvider, ProviderError, SenderContact};
pub use gatekeeper::Gatekeeper;
pub use notify_store::{NotificationStore, NotifyStoreError};
pub use router::{MessageRouter, RouteOutcome};
pub use working_hours::WorkingHours;
