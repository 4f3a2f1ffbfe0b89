//! Live change feed over server-sent events

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::error::{AppError, AppResult};
use crate::feed::{ChangeEvent, Collection};
use crate::middleware::AuthUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Comma-separated collection names; all collections when omitted
    pub collections: Option<String>,
}

/// Subscribe to change events. Dropping the connection unsubscribes.
///
/// A subscriber that falls behind the broadcast buffer gets one `resync`
/// event and should refetch everything it shows.
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StreamQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let collections = Collection::parse_list(query.collections.as_deref()).map_err(|name| {
        AppError::validation(
            "collections",
            &format!("Unknown collection: {}", name),
            &format!("Colección desconocida: {}", name),
        )
    })?;

    let mut receiver = state.feed.subscribe();
    tracing::debug!(
        user_id = %user.user_id,
        subscribers = state.feed.subscriber_count(),
        "Change feed subscriber connected"
    );

    let events = stream! {
        loop {
            match receiver.recv().await {
                Ok(event) if collections.contains(&event.collection) => {
                    yield Ok(change_event(&event));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change feed subscriber lagged");
                    yield Ok(Event::default().event("resync").data(skipped.to_string()));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn change_event(event: &ChangeEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_default();
    Event::default()
        .event(event.collection.as_str())
        .id(event.document_id.clone())
        .data(data)
}
