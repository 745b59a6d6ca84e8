//! In-memory WebSocket double for driving sessions without a network.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::{Sink, Stream};
use tokio::sync::mpsc;

use crate::auction::ServerFrame;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Server side of the pair: what a session reads from and writes to.
#[derive(Debug)]
pub struct MockSocket {
    incoming: mpsc::UnboundedReceiver<Message>,
    outgoing: mpsc::UnboundedSender<Message>,
}

/// Client side of the pair, used by tests to play the bidder.
#[derive(Debug)]
pub struct MockClient {
    to_server: mpsc::UnboundedSender<Message>,
    from_server: mpsc::UnboundedReceiver<Message>,
}

impl MockSocket {
    pub fn pair() -> (Self, MockClient) {
        let (to_server, incoming) = mpsc::unbounded_channel();
        let (outgoing, from_server) = mpsc::unbounded_channel();
        (
            Self { incoming, outgoing },
            MockClient {
                to_server,
                from_server,
            },
        )
    }
}

impl Stream for MockSocket {
    type Item = Result<Message, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.incoming.poll_recv(cx).map(|m| m.map(Ok))
    }
}

impl Sink<Message> for MockSocket {
    type Error = Infallible;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        // A dropped client just loses the frame.
        let _ = self.outgoing.send(item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

impl MockClient {
    pub fn send(&self, message: Message) {
        let _ = self.to_server.send(message);
    }

    pub fn send_text(&self, text: &str) {
        self.send(Message::Text(text.to_string()));
    }

    /// Send a bid command as a bidder would.
    pub fn bid(&self, user_id: &str, amount: f64) {
        let frame = serde_json::json!({ "type": "bid", "userId": user_id, "amount": amount });
        self.send_text(&frame.to_string());
    }

    /// Next raw message, or `None` if the server side is gone.
    ///
    /// # Panics
    ///
    /// Panics if nothing arrives within a couple of seconds.
    pub async fn next_message(&mut self) -> Option<Message> {
        match tokio::time::timeout(RECV_TIMEOUT, self.from_server.recv()).await {
            Ok(message) => message,
            Err(_) => panic!("timed out waiting for a server message"),
        }
    }

    /// Next message decoded as a [`ServerFrame`].
    ///
    /// # Panics
    ///
    /// Panics on timeout, on a non-text message, or on undecodable JSON.
    pub async fn next_frame(&mut self) -> ServerFrame {
        match self.next_message().await {
            Some(Message::Text(text)) => match serde_json::from_str(&text) {
                Ok(frame) => frame,
                Err(e) => panic!("undecodable server frame {text}: {e}"),
            },
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    /// True if the server sent nothing further (without waiting).
    pub fn is_idle(&mut self) -> bool {
        self.from_server.try_recv().is_err()
    }
}
