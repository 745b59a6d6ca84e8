//! One bidder's WebSocket connection, bridged to a coordinator.

use std::fmt::Display;

use axum::extract::ws::{CloseFrame, Message};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::auction::{ClientCommand, ServerFrame};
use crate::config::{INVALID_MESSAGE, SESSION_OUTBOUND_CAPACITY};
use crate::coordinator::{CoordinatorHandle, Outbound};

/// Pumps frames between a socket and the auction's coordinator.
///
/// Inbound text frames are parsed and answered in order. Frames pushed by
/// the coordinator (snapshot, updates, the final result, the close request)
/// are forwarded as they arrive.
pub struct Session<S> {
    socket: S,
    handle: CoordinatorHandle,
}

impl<S, E> Session<S>
where
    S: Sink<Message, Error = E> + Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    pub const fn new(socket: S, handle: CoordinatorHandle) -> Self {
        Self { socket, handle }
    }

    /// Run until either side closes.
    pub async fn run(mut self) {
        let (tx, mut outbound) = mpsc::channel(SESSION_OUTBOUND_CAPACITY);
        let session_id = match self.handle.attach(tx).await {
            Ok(id) => id,
            Err(e) => {
                debug!("Attach to auction {} refused: {}", self.handle.auction_id(), e);
                self.send_frame(&ServerFrame::Error { message: e.to_string() }).await;
                let _ = self.socket.close().await;
                return;
            }
        };

        let detach = loop {
            tokio::select! {
                pushed = outbound.recv() => match pushed {
                    Some(Outbound::Frame(frame)) => {
                        if !self.send_frame(&frame).await {
                            break true;
                        }
                    }
                    Some(Outbound::Close { code, reason }) => {
                        let _ = self
                            .socket
                            .send(Message::Close(Some(CloseFrame {
                                code,
                                reason: reason.into(),
                            })))
                            .await;
                        break false;
                    }
                    // Dropped by the coordinator as a failed target.
                    None => break false,
                },
                incoming = self.socket.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = answer_text(&self.handle, &text).await;
                        if !self.send_frame(&reply).await {
                            break true;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        let reply = ServerFrame::Error { message: INVALID_MESSAGE.into() };
                        if !self.send_frame(&reply).await {
                            break true;
                        }
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break true,
                    Some(Err(e)) => {
                        debug!("Session {} read error: {}", session_id, e);
                        break true;
                    }
                },
            }
        };

        if detach {
            self.handle.detach(session_id).await;
        }
        debug!(
            "Session {} on auction {} finished",
            session_id,
            self.handle.auction_id()
        );
    }

    /// Write one frame. Returns `false` once the socket is unusable.
    async fn send_frame(&mut self, frame: &ServerFrame) -> bool {
        let text = match frame.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("Dropping unserializable frame: {}", e);
                return true;
            }
        };
        match self.socket.send(Message::Text(text)).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Socket write failed: {}", e);
                false
            }
        }
    }
}

/// Reply to one inbound text frame.
async fn answer_text(handle: &CoordinatorHandle, text: &str) -> ServerFrame {
    match ClientCommand::parse(text) {
        Ok(ClientCommand::Bid { user_id, amount }) => {
            ServerFrame::bid_result(&handle.place_bid(&user_id, amount).await)
        }
        Err(e) => {
            debug!("Rejected frame on auction {}: {}", handle.auction_id(), e);
            ServerFrame::Error {
                message: INVALID_MESSAGE.into(),
            }
        }
    }
}

/// Convenience for callers that do not need the session value.
pub async fn serve_session<S, E>(socket: S, handle: CoordinatorHandle)
where
    S: Sink<Message, Error = E> + Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    Session::new(socket, handle).run().await;
}
