//! The injected event-source handle.
//!
//! Producers get an [`EventSender`] and push `(code, payload)` pairs into it
//! fire-and-forget; the visualizer owns the matching [`EventSource`] and
//! drains it on its own loop. No global callback slot: several independent
//! visualizers can each own their own source.

use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};

/// One raw notification, exactly as the engine emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub code: i32,
    pub payload: String,
}

/// The receiving end, owned by the visualizer.
#[derive(Debug)]
pub struct EventSource {
    tx: Sender<RawEvent>,
    rx: Receiver<RawEvent>,
}

/// Cloneable producer handle. `emit` never blocks and never fails from the
/// producer's point of view; a gone visualizer just drops the event.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<RawEvent>,
}

impl EventSource {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Pop one pending event, if any. Never blocks.
    pub fn try_recv(&self) -> Option<RawEvent> {
        match self.rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Default for EventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSender {
    pub fn emit(&self, code: i32, payload: impl Into<String>) {
        let _ = self.tx.send(RawEvent {
            code,
            payload: payload.into(),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
