use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use warp::http;
use warp::reply::{self, Response};
use warp::sse;
use warp::Reply;

use crate::errors::IntoErrorResponse;
use crate::events::{EventSubscription, TableEvent};
use crate::lobby::{Lobby, TableId};

/// Server-sent event stream of a table's [`TableEvent`]s. The subscription
/// stays registered for as long as the client holds the connection.
pub async fn stream_events(lobby: Arc<Lobby>, table_id: TableId) -> Response {
    // Reject unknown tables up front so clients get a 404 instead of a
    // stream that never produces anything.
    if let Err(e) = lobby.table_view(&table_id, None).await {
        return e.into_response();
    }

    let subscription = lobby.event_bus().subscribe(table_id);
    let stream = subscription_stream(subscription);
    let keep_alive = sse::keep_alive()
        .interval(Duration::from_secs(15))
        .text(":keep-alive\n");

    let reply = sse::reply(keep_alive.stream(stream));
    reply::with_header(reply, http::header::CACHE_CONTROL, "no-cache").into_response()
}

fn subscription_stream(
    mut subscription: EventSubscription,
) -> impl tokio_stream::Stream<Item = Result<sse::Event, Infallible>> {
    // Move the receiver into the stream while keeping the subscription
    // alive alongside it; dropping the subscription unregisters it.
    let (_placeholder_tx, placeholder_rx) = mpsc::channel(1);
    let receiver = std::mem::replace(&mut subscription.receiver, placeholder_rx);
    let subscription = Arc::new(subscription);

    ReceiverStream::new(receiver).map(move |event| {
        let _keep_alive = Arc::clone(&subscription);
        Ok(render_event(event))
    })
}

fn render_event(event: TableEvent) -> sse::Event {
    match serde_json::to_string(&event) {
        Ok(json) => sse::Event::default().event("table_event").data(json),
        Err(err) => {
            let fallback = serde_json::json!({
                "type": "error",
                "message": format!("failed to serialize table event: {err}")
            })
            .to_string();
            sse::Event::default().event("table_event").data(fallback)
        }
    }
}
