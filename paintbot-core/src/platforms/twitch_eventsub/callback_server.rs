// File: paintbot-core/src/platforms/twitch_eventsub/callback_server.rs

//! Inbound webhook endpoint for EventSub.
//!
//! Every POST is authenticated before it is parsed. Verification challenges
//! are echoed back verbatim; notifications are acknowledged with 204 right
//! away and reconciled on their own task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_server::Handle;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::Error;
use crate::services::reconciler::EventReconciler;

use super::dedupe::DeliveryDedupe;
use super::events::{NotificationEnvelope, RevocationEnvelope, VerificationEnvelope, parse_notification};
use super::signature::verify_signature;

pub const HEADER_MESSAGE_ID: &str = "twitch-eventsub-message-id";
pub const HEADER_MESSAGE_TIMESTAMP: &str = "twitch-eventsub-message-timestamp";
pub const HEADER_MESSAGE_SIGNATURE: &str = "twitch-eventsub-message-signature";
pub const HEADER_MESSAGE_TYPE: &str = "twitch-eventsub-message-type";

pub const MESSAGE_TYPE_NOTIFICATION: &str = "notification";
pub const MESSAGE_TYPE_VERIFICATION: &str = "webhook_callback_verification";
pub const MESSAGE_TYPE_REVOCATION: &str = "revocation";

/// Messages older than this are treated as replays.
pub const MAX_MESSAGE_AGE_SECS: i64 = 600;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid message timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("message too old")]
    StaleMessage,

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_)
            | WebhookError::InvalidTimestamp(_)
            | WebhookError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature | WebhookError::StaleMessage => StatusCode::FORBIDDEN,
        };
        (status, self.to_string()).into_response()
    }
}

/// Shared state for the Axum routes.
#[derive(Clone)]
pub struct CallbackServerState {
    pub secret: Arc<String>,
    pub reconciler: Arc<EventReconciler>,
    pub dedupe: Arc<DeliveryDedupe>,
    pub max_message_age: chrono::Duration,
}

impl CallbackServerState {
    pub fn new(secret: impl Into<String>, reconciler: Arc<EventReconciler>) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            reconciler,
            dedupe: Arc::new(DeliveryDedupe::default()),
            max_message_age: chrono::Duration::seconds(MAX_MESSAGE_AGE_SECS),
        }
    }
}

pub fn router(state: CallbackServerState) -> Router {
    Router::new()
        .route("/", get(handle_status))
        .route("/notify", post(handle_notify).fallback(reject_method))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn handle_status() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn reject_method() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, "only POST is accepted here")
}

async fn handle_notify(
    State(state): State<CallbackServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let message_id = get_header(&headers, HEADER_MESSAGE_ID)?;
    let timestamp = get_header(&headers, HEADER_MESSAGE_TIMESTAMP)?;
    let signature = get_header(&headers, HEADER_MESSAGE_SIGNATURE)?;
    let message_type = get_header(&headers, HEADER_MESSAGE_TYPE)?;

    if !verify_signature(state.secret.as_bytes(), &message_id, &timestamp, &body, &signature) {
        warn!("[EventSub] rejecting message {} with a bad signature", message_id);
        return Err(WebhookError::InvalidSignature);
    }
    check_freshness(&timestamp, state.max_message_age)?;

    debug!("[EventSub] message id={} type={}", message_id, message_type);

    match message_type.as_str() {
        MESSAGE_TYPE_VERIFICATION => {
            let envelope: VerificationEnvelope = serde_json::from_slice(&body)?;
            info!(
                "[EventSub] answering verification challenge for {} ({})",
                envelope.subscription.sub_type, envelope.subscription.id
            );
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain")],
                envelope.challenge,
            )
                .into_response())
        }
        MESSAGE_TYPE_REVOCATION => {
            match serde_json::from_slice::<RevocationEnvelope>(&body) {
                Ok(env) => warn!(
                    "[EventSub] subscription {} ({}) revoked: status={}",
                    env.subscription.id, env.subscription.sub_type, env.subscription.status
                ),
                Err(e) => warn!("[EventSub] unreadable revocation message: {}", e),
            }
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        MESSAGE_TYPE_NOTIFICATION => {
            accept_notification(&state, &message_id, &body);
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        other => {
            warn!("[EventSub] unhandled message_type={}", other);
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

/// Decodes and hands the event to the reconciler on a separate task.
/// Malformed or duplicate messages are dropped with a log line.
fn accept_notification(state: &CallbackServerState, message_id: &str, body: &[u8]) {
    if !state.dedupe.first_seen(message_id) {
        debug!("[EventSub] duplicate delivery {} - already handled", message_id);
        return;
    }

    let envelope: NotificationEnvelope = match serde_json::from_slice(body) {
        Ok(env) => env,
        Err(e) => {
            warn!("[EventSub] dropping malformed notification {}: {}", message_id, e);
            return;
        }
    };

    let event = match parse_notification(&envelope.subscription.sub_type, &envelope.event) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!("[EventSub] ignoring notification of type {}", envelope.subscription.sub_type);
            return;
        }
        Err(e) => {
            warn!(
                "[EventSub] dropping malformed {} event {}: {}",
                envelope.subscription.sub_type, message_id, e
            );
            return;
        }
    };

    let reconciler = state.reconciler.clone();
    let message_id = message_id.to_string();
    tokio::spawn(async move {
        match reconciler.apply(event).await {
            Ok(outcome) => debug!("[EventSub] message {} => {:?}", message_id, outcome),
            Err(e) => error!("[EventSub] reconciling message {} failed: {}", message_id, e),
        }
    });
}

fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}

fn check_freshness(timestamp: &str, max_age: chrono::Duration) -> Result<(), WebhookError> {
    let sent: DateTime<Utc> = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| WebhookError::InvalidTimestamp(e.to_string()))?
        .with_timezone(&Utc);
    if Utc::now() - sent > max_age {
        return Err(WebhookError::StaleMessage);
    }
    Ok(())
}

/// A running listener. Dropping it leaves the server running.
pub struct CallbackServer {
    pub addr: SocketAddr,
    handle: Handle,
    task: JoinHandle<()>,
}

impl CallbackServer {
    pub async fn shutdown(self, grace: Duration) {
        self.handle.graceful_shutdown(Some(grace));
        let _ = self.task.await;
        info!("[EventSub] callback server shut down.");
    }
}

pub async fn start_callback_server(
    addr: SocketAddr,
    state: CallbackServerState,
) -> Result<CallbackServer, Error> {
    let app = router(state);
    let handle = Handle::new();

    let server = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service());

    let task = tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("[EventSub] callback server error: {}", e);
        }
    });

    match handle.listening().await {
        Some(bound) => {
            info!("[EventSub] callback server listening on http://{}", bound);
            Ok(CallbackServer { addr: bound, handle, task })
        }
        None => Err(Error::Config(format!("could not listen on {addr}"))),
    }
}
