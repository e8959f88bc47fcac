//! Request handlers for the streaming endpoints.
//!
//! A streaming GET parses the optional `offset` query parameter, starts a
//! consumer for the connection and then streams envelopes to the client as
//! they arrive. Status semantics are settled before any byte of the body:
//! 400 for a malformed offset, 500 when the partition cannot be subscribed,
//! 200 once the consumer has confirmed its subscription. After 200, errors
//! are logged but never surfaced to the client.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::Stream;
use serde::Deserialize;
use tracing::{error, info};

use streambridge_consumer::{ConsumerController, ConsumerStarter};

/// Newest-message offset, used when the client does not ask for a position.
const DEFAULT_OFFSET: i64 = -1;

/// Per-route state: the runner for this route's topic.
#[derive(Clone)]
pub struct StreamState {
    pub runner: Arc<dyn ConsumerStarter>,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    offset: Option<String>,
}

/// `GET /healthcheck`
pub async fn healthcheck() -> StatusCode {
    StatusCode::OK
}

/// A streaming GET on one of the topic paths.
pub async fn stream_changes(
    State(state): State<StreamState>,
    Query(query): Query<StreamQuery>,
) -> Response {
    info!("user connected");

    let offset = match query.offset.as_deref() {
        None | Some("") => DEFAULT_OFFSET,
        Some(raw) => match raw.parse::<i64>() {
            Ok(offset) => offset,
            Err(err) => {
                error!(offset = raw, error = %err, "invalid offset parameter");
                return StatusCode::BAD_REQUEST.into_response();
            }
        },
    };

    let controller = match state.runner.start_consumer(offset).await {
        Ok(controller) => controller,
        Err(err) => {
            error!(error = %err, "could not start consumer for connection");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    Body::from_stream(EnvelopeStream { controller }).into_response()
}

/// Adapts a consumer's data channel into a chunked response body.
///
/// Dropping the stream is how the HTTP server signals that the client went
/// away; the drop shuts the consumer down so the log subscription is closed.
struct EnvelopeStream {
    controller: ConsumerController,
}

impl Stream for EnvelopeStream {
    type Item = Result<String, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().controller.poll_recv(cx).map(|msg| msg.map(Ok))
    }
}

impl Drop for EnvelopeStream {
    fn drop(&mut self) {
        self.controller.stop("user disconnected");
        info!("user disconnected");
    }
}
