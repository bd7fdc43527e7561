//! Build-order hand-off to the renderer.
//!
//! The renderer runs out of band. Handing it an order is a message-passing
//! step with an acknowledgment: [`OrderQueue::submit`] returns `Ok` only once
//! the order has been accepted (spooled to disk or queued in a channel).

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use printmaps_core::{JobId, MapMetadata};

pub mod channel;
pub mod spool;

pub use channel::{ChannelOrderQueue, OrderReceiver};
pub use spool::FileOrderSpool;

/// Work item for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOrder {
    pub id: JobId,
    pub submitted_at: DateTime<Utc>,
    pub metadata: MapMetadata,
}

impl BuildOrder {
    pub fn new(metadata: MapMetadata, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: metadata.id,
            submitted_at,
            metadata,
        }
    }
}

/// Build-order queue abstraction.
pub trait OrderQueue: Send + Sync {
    /// Hand an order over; `Ok` means the renderer side has accepted it.
    fn submit(&self, order: BuildOrder) -> Result<(), QueueError>;
}

impl<Q> OrderQueue for Arc<Q>
where
    Q: OrderQueue + ?Sized,
{
    fn submit(&self, order: BuildOrder) -> Result<(), QueueError> {
        (**self).submit(order)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("order for job {id} could not be encoded: {source}")]
    Encode {
        id: JobId,
        #[source]
        source: serde_json::Error,
    },
    #[error("order queue is full")]
    Full,
    #[error("order queue is closed")]
    Closed,
}
