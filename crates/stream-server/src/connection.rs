//! One WebSocket client connection.
//!
//! A connection is a task pair: the writer drains the client's queue into
//! the socket, the reader answers pings and enforces the idle timeout.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use holo_gesture_model::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::registry::{ClientId, ClientRegistry};

/// Why the reader stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// The client closed the socket or the stream ended.
    Closed,
    /// No inbound message within the idle timeout.
    IdleTimeout,
    /// Transport error.
    Error(String),
}

/// Serve an upgraded socket until it disconnects.
pub async fn handle_socket(
    socket: WebSocket,
    registry: Arc<ClientRegistry>,
    idle_timeout: Duration,
) {
    let (sink, stream) = socket.split();
    let (id, queue) = registry.register();
    tracing::info!(client = id, clients = registry.len(), "Client connected");

    let writer = tokio::spawn(write_loop(sink, queue));
    let reason = read_loop(stream, &registry, id, idle_timeout).await;

    if reason == Disconnect::IdleTimeout {
        registry.send_to(id, Message::Close(None));
    }
    registry.unregister(id);
    // The writer ends once the queue is drained and its sender is gone.
    if !join_writer(writer, idle_timeout).await {
        tracing::warn!(client = id, "Client writer stalled, aborted");
    }

    match reason {
        Disconnect::Error(err) => {
            tracing::warn!(
                client = id,
                error = %err,
                clients = registry.len(),
                "Client connection failed"
            )
        }
        reason => {
            tracing::info!(client = id, ?reason, clients = registry.len(), "Client disconnected")
        }
    }
}

/// Wait up to `grace` for the writer to finish, aborting it otherwise.
///
/// Returns false when the writer had to be aborted.
async fn join_writer(mut writer: JoinHandle<()>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, &mut writer).await {
        Ok(_) => true,
        Err(_) => {
            writer.abort();
            false
        }
    }
}

/// Forward queued messages to the socket until the queue closes, a close
/// frame is sent, or the socket fails.
pub async fn write_loop<S>(mut sink: S, mut queue: mpsc::Receiver<Message>)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(message) = queue.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(err) = sink.send(message).await {
            tracing::debug!(error = %err, "Socket write failed");
            return;
        }
        if closing {
            break;
        }
    }
    let _ = sink.close().await;
}

/// Read inbound frames, answering pings through the client's queue.
///
/// Any inbound frame resets the idle timer. Unknown or malformed text is
/// ignored.
pub async fn read_loop<S, E>(
    mut stream: S,
    registry: &ClientRegistry,
    id: ClientId,
    idle_timeout: Duration,
) -> Disconnect
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        let next = match tokio::time::timeout(idle_timeout, stream.next()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::info!(
                    client = id,
                    timeout_secs = idle_timeout.as_secs_f64(),
                    "Client idle timeout"
                );
                return Disconnect::IdleTimeout;
            }
        };

        match next {
            None | Some(Ok(Message::Close(_))) => return Disconnect::Closed,
            Some(Err(err)) => return Disconnect::Error(err.to_string()),
            Some(Ok(Message::Text(text))) => {
                if let Some(ClientMessage::Ping) = ClientMessage::parse(&text) {
                    match ServerMessage::pong().to_json() {
                        Ok(pong) => {
                            registry.send_to(id, Message::Text(pong));
                        }
                        Err(err) => tracing::error!(error = %err, "Failed to encode pong"),
                    }
                } else {
                    tracing::trace!(client = id, "Ignoring client message");
                }
            }
            Some(Ok(_)) => {}
        }
    }
}
