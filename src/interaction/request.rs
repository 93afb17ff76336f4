//! The per-request pipeline: authenticate, drop retries, decode, dispatch.

use axum::{body::Bytes, http::HeaderMap};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    event::{Event, InnerEvent},
    runtime::Runtime,
};

use super::{
    auth::{self, AuthError},
    chat_event,
};

/// Present when Slack redelivers a request.
pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";
pub const RETRY_REASON_HEADER: &str = "x-slack-retry-reason";
/// Asks Slack not to redeliver a request.
pub const NO_RETRY_HEADER: &str = "x-slack-no-retry";

/// A raw request to the event endpoint.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub headers: HeaderMap,
    pub body: Bytes,
    pub received_at: DateTime<Utc>,
}

impl IncomingRequest {
    /// Wraps a request received now.
    pub fn new(headers: HeaderMap, body: Bytes) -> Self {
        Self {
            headers,
            body,
            received_at: Utc::now(),
        }
    }
}

/// What handling a request amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A URL verification; the challenge is echoed back.
    Challenge(String),
    /// A redelivery that was acknowledged without processing.
    RetrySuppressed,
    /// A reply was posted.
    Replied { text: String, response: String },
    /// The event was handled and nothing was posted.
    NoReply,
}

/// Failures of the request pipeline.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("failed to decode event: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("received unknown event kind `{0}`")]
    UnknownEventKind(String),
    #[error("received unknown inner event kind `{0}`")]
    UnknownInnerEventKind(String),
    #[error("failed to deliver reply: {0:#}")]
    Delivery(anyhow::Error),
}

/// Runs one request through the pipeline.
#[instrument(skip_all)]
pub async fn handle_request(runtime: &Runtime, request: IncomingRequest) -> Result<Outcome, HandlerError> {
    auth::authenticate(&runtime.config.slack_signing_secret, &request.headers, &request.body, request.received_at, runtime.config.max_request_age_secs)?;

    // Slack retries slow deliveries up to three times. The first delivery is
    // already being handled, so redeliveries are only acknowledged.
    if let Some(retry_num) = request.headers.get(RETRY_NUM_HEADER) {
        let reason = request.headers.get(RETRY_REASON_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("unknown");
        info!(retry_num = ?retry_num, reason, "Ignoring a retry from Slack.");
        return Ok(Outcome::RetrySuppressed);
    }

    match Event::from_slice(&request.body)? {
        Event::UrlVerification { challenge } => {
            info!("URL verification request.");
            Ok(Outcome::Challenge(challenge))
        }
        Event::EventCallback(callback) => match callback.event {
            InnerEvent::Message(message) => chat_event::handle_chat_message(&runtime.engine, &runtime.chat, &message).await,
            InnerEvent::Unknown { kind } => Err(HandlerError::UnknownInnerEventKind(kind)),
        },
        Event::Unknown { kind } => Err(HandlerError::UnknownEventKind(kind)),
    }
}
