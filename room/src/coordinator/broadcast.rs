//! Live session set and best-effort fan-out.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::auction::ServerFrame;

/// Identifier the coordinator assigns to each attached session.
pub type SessionId = u64;

/// What a coordinator pushes down a session's outbound queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Frame(ServerFrame),
    /// Close the connection with this WebSocket close code and reason.
    Close { code: u16, reason: &'static str },
}

/// Sessions attached to one auction, in attach order.
///
/// Owned by the coordinator task; nothing else ever touches it. A send
/// failure (receiver gone or queue full) drops the session on the spot.
#[derive(Debug, Default)]
pub(super) struct SessionSet {
    next_id: SessionId,
    sessions: BTreeMap<SessionId, mpsc::Sender<Outbound>>,
}

impl SessionSet {
    pub(super) fn attach(&mut self, outbound: mpsc::Sender<Outbound>) -> SessionId {
        self.next_id += 1;
        let id = self.next_id;
        self.sessions.insert(id, outbound);
        id
    }

    pub(super) fn detach(&mut self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Deliver to one session. Returns `false` (and drops it) on failure.
    pub(super) fn send_to(&mut self, id: SessionId, frame: ServerFrame) -> bool {
        let delivered = self
            .sessions
            .get(&id)
            .is_some_and(|tx| tx.try_send(Outbound::Frame(frame)).is_ok());
        if !delivered && self.sessions.remove(&id).is_some() {
            debug!("Session {} unreachable, detached", id);
        }
        delivered
    }

    /// Deliver to every live session; returns how many accepted the frame.
    pub(super) fn broadcast(&mut self, frame: &ServerFrame) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, tx| {
            let ok = tx.try_send(Outbound::Frame(frame.clone())).is_ok();
            if !ok {
                debug!("Broadcast to session {} failed, detaching", id);
            }
            ok
        });
        let delivered = self.sessions.len();
        if delivered < before {
            debug!(
                "Broadcast dropped {} unreachable session(s)",
                before - delivered
            );
        }
        delivered
    }

    /// Ask every session to close, then forget them all.
    pub(super) fn close_all(&mut self, code: u16, reason: &'static str) {
        for tx in self.sessions.values() {
            let _ = tx.try_send(Outbound::Close { code, reason });
        }
        self.sessions.clear();
    }

    pub(super) fn len(&self) -> usize {
        self.sessions.len()
    }
}
