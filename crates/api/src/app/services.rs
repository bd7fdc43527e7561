//! Service wiring: record store, order spool and lifecycle controller.

use std::sync::Arc;

use anyhow::Context;

use printmaps_infra::{
    FileOrderSpool, FileRecordStore, InMemoryRecordStore, LifecycleController, OrderQueue,
    RandomIdGenerator, RecordStore,
};

use crate::config::{Config, StoreBackend};

pub type DynStore = Arc<dyn RecordStore>;
pub type DynQueue = Arc<dyn OrderQueue>;
pub type AppController = LifecycleController<DynStore, DynQueue, RandomIdGenerator>;

/// Shared, request-independent services.
pub struct AppServices {
    pub controller: AppController,
}

impl AppServices {
    pub fn new(store: DynStore, queue: DynQueue, config: &Config) -> Self {
        Self {
            controller: LifecycleController::new(
                store,
                queue,
                RandomIdGenerator,
                config.validation_rules(),
            ),
        }
    }
}

pub fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    let store: DynStore = match config.store {
        StoreBackend::File => {
            let store = FileRecordStore::open(&config.data_dir)
                .with_context(|| format!("opening record store at {}", config.data_dir.display()))?;
            tracing::info!(root = %config.data_dir.display(), "using file record store");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory record store; jobs are lost on restart");
            Arc::new(InMemoryRecordStore::new())
        }
    };

    let spool = FileOrderSpool::open(&config.orders_dir)
        .with_context(|| format!("opening order spool at {}", config.orders_dir.display()))?;
    tracing::info!(dir = %config.orders_dir.display(), "spooling build orders");

    Ok(AppServices::new(store, Arc::new(spool), config))
}
