use super::commands::{hex, CommandResponse};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Debug)]
struct Pending {
    command_id: u8,
    tx: oneshot::Sender<Vec<u8>>,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<Pending>,
    closed: bool,
}

/// Single-slot "response outstanding" signal shared with the notification
/// listener.
///
/// [`AckSlot::arm`] clears any previous state and hands back the receiver
/// for the response to one command id; [`AckSlot::resolve`] fires it at most
/// once, and only for a response carrying that id. Once [`AckSlot::close`]d
/// (the link dropped) every waiter sees a closed channel.
#[derive(Debug, Default)]
pub struct AckSlot {
    slot: Mutex<Slot>,
}

impl AckSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the slot and wait for a fresh response to `command_id`.
    pub fn arm(&self, command_id: u8) -> oneshot::Receiver<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        let mut slot = self.lock();
        // Closed: tx is dropped here and rx resolves to an error at once.
        slot.pending = if slot.closed {
            None
        } else {
            Some(Pending { command_id, tx })
        };
        rx
    }

    /// Whether a command is awaiting its response
    pub fn is_armed(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Deliver a response; returns false when nothing was waiting for it.
    ///
    /// A response for another command id (e.g. a late answer to a command
    /// that already timed out) leaves the slot armed.
    pub fn resolve(&self, value: Vec<u8>) -> bool {
        let mut slot = self.lock();
        let expected = match slot.pending.as_ref() {
            Some(pending) => pending.command_id,
            None => return false,
        };

        match CommandResponse::parse(&value) {
            Some(rsp) if rsp.command_id == expected => {}
            _ => {
                debug!(
                    "Ignoring response {} while awaiting command 0x{:02x}",
                    hex(&value),
                    expected
                );
                return false;
            }
        }

        match slot.pending.take() {
            Some(pending) => pending.tx.send(value).is_ok(),
            None => false,
        }
    }

    /// Drop the waiting sender without closing the slot.
    pub fn disarm(&self) {
        self.lock().pending.take();
    }

    /// The listener is gone; fail the current and every later waiter.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        slot.pending.take();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // The slot holds no invariant a panic could break.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}
