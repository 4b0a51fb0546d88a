use std::sync::Arc;

use axum::extract::ws::Message;
use encodrop_events::StatusDispatcher;
use tokio::sync::broadcast::error::RecvError;

use crate::ws::manager::WsManager;

/// Spawn the task that relays every status event to all UI clients as a
/// JSON text frame.
///
/// The dispatcher is subscribed before this returns, so no event emitted
/// afterwards is missed. The task ends when the dispatcher is dropped.
pub fn start_status_forwarder(
    dispatcher: &StatusDispatcher,
    ws_manager: Arc<WsManager>,
) -> tokio::task::JoinHandle<()> {
    let mut rx = dispatcher.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let text = event.to_ui_message().to_string();
                    let delivered = ws_manager.broadcast(Message::Text(text.into())).await;
                    tracing::trace!(
                        job_index = %event.index,
                        status = event.status.label(),
                        delivered,
                        "Forwarded status event",
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Status forwarder lagged; events dropped");
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Status dispatcher closed, forwarder exiting");
                    break;
                }
            }
        }
    })
}
