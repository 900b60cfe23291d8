//! Notification stream endpoint
//!
//! Server-sent events: one stream per user, drained from the user's
//! mailbox. When the client disconnects the response body is dropped,
//! which releases the mailbox.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Extension;
use futures_util::stream::Stream;
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::interfaces::http::state::ApiState;
use crate::notifications::NotificationStream;

#[utoipa::path(
    get,
    path = "/api/v1/notifications/stream",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "SSE stream of push events", content_type = "text/event-stream")
    )
)]
pub async fn notification_stream(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    info!(user_id = user.user_id, "Opening notification stream");
    let stream = state.hub.attach(user.user_id);
    Sse::new(into_sse(stream)).keep_alive(KeepAlive::default())
}

fn into_sse(stream: NotificationStream) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    futures_util::stream::unfold(stream, |mut stream| async move {
        loop {
            let envelope = stream.next_event().await?;
            match serde_json::to_string(&envelope) {
                Ok(payload) => {
                    let event = SseEvent::default()
                        .event(envelope.event.event_type())
                        .id(envelope.id.clone())
                        .data(payload);
                    return Some((Ok(event), stream));
                }
                Err(e) => {
                    // Skip the unserializable event, keep the stream.
                    error!(error = %e, "Failed to serialize push event");
                    continue;
                }
            }
        }
    })
}
