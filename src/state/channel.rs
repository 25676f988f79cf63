use crate::state::{StateSink, StateUpdate};
use tokio::sync::mpsc;

/// Forwards updates to a subscriber over an unbounded channel
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StateUpdate>,
}

impl ChannelSink {
    /// Create a sink and the receiver a front end should drain
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StateUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StateSink for ChannelSink {
    fn apply(&self, update: StateUpdate) {
        if self.tx.send(update).is_err() {
            tracing::debug!("State subscriber dropped; update discarded");
        }
    }
}
