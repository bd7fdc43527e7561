//! Infrastructure layer: record storage, identifiers, build-order hand-off and
//! the job lifecycle controller that ties them together.

pub mod ids;
pub mod lifecycle;
pub mod locks;
pub mod orders;
pub mod render;
pub mod store;

pub use ids::{IdGenerationError, IdGenerator, RandomIdGenerator};
pub use lifecycle::{BuildReporter, InternalError, LifecycleController, LifecycleError};
pub use locks::JobLocks;
pub use orders::{BuildOrder, ChannelOrderQueue, FileOrderSpool, OrderQueue, OrderReceiver, QueueError};
pub use render::{RenderStats, RenderWorker, RenderWorkerConfig, RenderWorkerHandle, Renderer};
pub use store::{FileRecordStore, InMemoryRecordStore, RecordStore, StoreError};
