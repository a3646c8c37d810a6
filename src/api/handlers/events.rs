//! Server-sent event stream of live log/alert notifications

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;

use crate::api::AppState;

/// GET /api/events
///
/// One SSE channel per connected client. Dropping the stream (client went
/// away) drops the subscription, which removes the observer from the bus.
pub async fn event_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let subscription = state.events.subscribe();

    let stream = stream::unfold(subscription, |mut subscription| async move {
        loop {
            let event = subscription.recv().await?;
            match SseEvent::default().json_data(&event) {
                Ok(msg) => return Some((Ok::<SseEvent, Infallible>(msg), subscription)),
                Err(err) => {
                    tracing::warn!("Dropping unserializable event: {}", err);
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
