use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, error, info, warn};

use responder_module::adapters::whatsapp::{WhatsAppHttpProvider, WhatsAppInboundAdapter};
use responder_module::channel::InboundEvent;
use responder_module::config::ResponderConfig;
use responder_module::gatekeeper::Gatekeeper;
use responder_module::notify_store::NotificationStore;
use responder_module::router::MessageRouter;

const EVENT_QUEUE_CAPACITY: usize = 100;

struct AppState {
    adapter: WhatsAppInboundAdapter,
    events: Sender<InboundEvent>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = ResponderConfig::from_env()?;

    let provider = Arc::new(WhatsAppHttpProvider::new(
        config.gateway.base_url.clone(),
        config.gateway.session.clone(),
        config.gateway.api_key.clone(),
    ));

    let store = NotificationStore::open(&config.storage_path);
    info!(
        "notification store at {} ({} senders on record)",
        store.path().display(),
        store.len()
    );

    let gatekeeper = Gatekeeper::new(store, config.exempt_senders.clone());
    let router = MessageRouter::new(
        gatekeeper,
        provider,
        config.working_hours,
        config.reply_text.clone(),
    );

    // Single worker thread owns the router, so decide + send + record are
    // serialized and no lock is held across gateway I/O.
    let (events_tx, events_rx) = bounded::<InboundEvent>(EVENT_QUEUE_CAPACITY);
    thread::spawn(move || run_event_loop(events_rx, router));

    let state = Arc::new(AppState {
        adapter: WhatsAppInboundAdapter::new(),
        events: events_tx,
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/webhook", post(ingest_whatsapp))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        "responder listening on {}, working hours {:02}:00-{:02}:00, {} exempt senders",
        addr,
        config.working_hours.start_hour,
        config.working_hours.end_hour,
        config.exempt_senders.len()
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn run_event_loop(events: Receiver<InboundEvent>, mut router: MessageRouter) {
    info!("event worker started");
    for event in events {
        let outcome = router.handle_event(&event);
        debug!("event from {} handled: {:?}", event.origin, outcome);
    }
    info!("event worker stopped");
}

async fn health() -> &'static str {
    "ok"
}

async fn ingest_whatsapp(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let event = match state.adapter.parse(&body) {
        Ok(event) => event,
        Err(err) => {
            // Acks, own messages and other non-message payloads land here;
            // the gateway must not retry them.
            debug!("ignoring webhook payload: {}", err);
            return StatusCode::OK;
        }
    };

    match state.events.try_send(event) {
        Ok(()) => StatusCode::OK,
        Err(TrySendError::Full(event)) => {
            warn!("event queue full, dropping message from {}", event.origin);
            StatusCode::OK
        }
        Err(TrySendError::Disconnected(_)) => {
            error!("event worker is gone, rejecting webhook");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
