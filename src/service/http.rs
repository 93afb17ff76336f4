//! The HTTP surface: a single `POST` endpoint receiving Slack events.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{error, instrument, warn};

use crate::{
    interaction::request::{self, HandlerError, IncomingRequest, NO_RETRY_HEADER, Outcome},
    runtime::Runtime,
};

/// Builds the router serving the configured event path.
pub fn router(runtime: Runtime) -> Router {
    let path = runtime.config.event_path.clone();

    Router::new().route(&path, post(event_handler)).with_state(runtime)
}

#[instrument(skip_all)]
async fn event_handler(State(runtime): State<Runtime>, headers: HeaderMap, body: Bytes) -> Response {
    let result = request::handle_request(&runtime, IncomingRequest::new(headers, body)).await;

    respond(result)
}

/// Maps a pipeline result onto the status codes and headers Slack understands.
fn respond(result: Result<Outcome, HandlerError>) -> Response {
    let no_retry = [(NO_RETRY_HEADER, "1")];

    match result {
        Ok(Outcome::Challenge(challenge)) => (StatusCode::OK, challenge).into_response(),
        Ok(Outcome::RetrySuppressed) => (StatusCode::OK, no_retry).into_response(),
        Ok(Outcome::Replied { .. } | Outcome::NoReply) => StatusCode::OK.into_response(),
        Err(HandlerError::Auth(e)) => {
            // If this really was Slack, a bug on our side should not cause retries.
            warn!("Unauthorized request: {}", e);
            (StatusCode::FORBIDDEN, no_retry).into_response()
        }
        Err(e @ (HandlerError::UnknownEventKind(_) | HandlerError::UnknownInnerEventKind(_))) => {
            warn!("{}", e);
            (StatusCode::OK, no_retry).into_response()
        }
        Err(e @ HandlerError::Decode(_)) => {
            warn!("{}", e);
            (StatusCode::BAD_REQUEST, no_retry).into_response()
        }
        Err(e @ HandlerError::Delivery(_)) => {
            error!("Error while handling: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
