//! Drain barrier: counts critical participants that must finish before the
//! process may exit.

use std::sync::Arc;

use tokio::sync::watch;

/// Counter-based barrier. Participants enlist and receive a [`DrainSlot`];
/// [`DrainBarrier::drained`] resolves once every slot has been released.
#[derive(Debug, Clone)]
pub struct DrainBarrier {
    pending: Arc<watch::Sender<usize>>,
}

impl DrainBarrier {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            pending: Arc::new(tx),
        }
    }

    /// Register a participant. The barrier stays closed until the slot drops.
    pub fn enlist(&self, participant: impl Into<String>) -> DrainSlot {
        self.pending.send_modify(|pending| *pending += 1);
        DrainSlot {
            pending: Arc::clone(&self.pending),
            participant: participant.into(),
        }
    }

    /// Number of participants not yet released.
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Wait until every enlisted participant has been released.
    pub async fn drained(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|pending| *pending == 0).await;
    }
}

impl Default for DrainBarrier {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by a drain participant; releases its slot when dropped.
#[derive(Debug)]
pub struct DrainSlot {
    pending: Arc<watch::Sender<usize>>,
    participant: String,
}

impl DrainSlot {
    pub fn participant(&self) -> &str {
        &self.participant
    }
}

impl Drop for DrainSlot {
    fn drop(&mut self) {
        self.pending
            .send_modify(|pending| *pending = pending.saturating_sub(1));
        tracing::debug!(participant = %self.participant, "Drain participant released");
    }
}
