use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

use super::{BuildOrder, OrderQueue, QueueError};

/// In-process bounded queue feeding a [`crate::render::RenderWorker`].
///
/// `submit` never blocks: a full or closed queue is reported immediately.
#[derive(Debug, Clone)]
pub struct ChannelOrderQueue {
    tx: SyncSender<BuildOrder>,
}

/// Receiving half of a [`ChannelOrderQueue`].
#[derive(Debug)]
pub struct OrderReceiver {
    rx: Receiver<BuildOrder>,
}

impl ChannelOrderQueue {
    pub fn bounded(capacity: usize) -> (Self, OrderReceiver) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        (Self { tx }, OrderReceiver { rx })
    }
}

impl OrderQueue for ChannelOrderQueue {
    fn submit(&self, order: BuildOrder) -> Result<(), QueueError> {
        self.tx.try_send(order).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Disconnected(_) => QueueError::Closed,
        })
    }
}

impl OrderReceiver {
    /// `Ok(None)` on timeout, `Err(Closed)` once every sender is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<BuildOrder>, QueueError> {
        match self.rx.recv_timeout(timeout) {
            Ok(order) => Ok(Some(order)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(QueueError::Closed),
        }
    }

    pub fn try_recv(&self) -> Option<BuildOrder> {
        self.rx.try_recv().ok()
    }
}
