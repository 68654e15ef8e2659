//! Session notification channel
//!
//! The session layer hands each logged-in player a [`SessionSink`]; the
//! player pushes status changes and room contents through it without
//! waiting for the connection to write them.

use tokio::sync::mpsc;
use tracing::warn;

/// Push channel into a connected session
pub trait SessionSink: Send + Sync {
    /// Current health and the gold just credited
    fn send_status(&self, health: u32, gold_delta: u32);

    /// Description lines of the room the player is in
    fn send_room_info(&self, lines: &[String]);
}

/// Notification queued for a session's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Status { health: u32, gold_delta: u32 },
    RoomInfo(Vec<String>),
}

/// Sink backed by a bounded tokio channel
///
/// Sends never block; when the session's queue is full or its writer has
/// gone away the event is dropped and logged.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<SessionEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the session writer drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    fn push(&self, event: SessionEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!(error = %e, "Dropped session notification");
        }
    }
}

impl SessionSink for ChannelSink {
    fn send_status(&self, health: u32, gold_delta: u32) {
        self.push(SessionEvent::Status { health, gold_delta });
    }

    fn send_room_info(&self, lines: &[String]) {
        self.push(SessionEvent::RoomInfo(lines.to_vec()));
    }
}
