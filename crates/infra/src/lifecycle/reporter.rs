use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use printmaps_core::{BuildReport, MapState};

use super::InternalError;
use crate::locks::JobLocks;
use crate::orders::BuildOrder;
use crate::store::RecordStore;

/// Renderer-side write-back into the state record.
///
/// Only the build-result fields are touched, with the same whole-record
/// overwrite the controller uses, under the same per-job lock. A report is
/// accepted only for the order the state record currently points at; an
/// order superseded by a resubmission yields [`InternalError::StaleOrder`].
#[derive(Debug, Clone)]
pub struct BuildReporter<S> {
    store: S,
    locks: Arc<JobLocks>,
}

impl<S: RecordStore> BuildReporter<S> {
    pub fn new(store: S, locks: Arc<JobLocks>) -> Self {
        Self { store, locks }
    }

    pub fn build_started(&self, order: &BuildOrder) -> Result<MapState, InternalError> {
        self.update(order, |state| state.begin_build(Utc::now()))
    }

    pub fn build_completed(
        &self,
        order: &BuildOrder,
        report: BuildReport,
    ) -> Result<MapState, InternalError> {
        let successful = report.successful;
        let state = self.update(order, |state| state.complete_build(report, Utc::now()))?;
        info!(job_id = %order.id, successful, "build completed");
        Ok(state)
    }

    fn update(
        &self,
        order: &BuildOrder,
        apply: impl FnOnce(&mut MapState) -> printmaps_core::DomainResult<()>,
    ) -> Result<MapState, InternalError> {
        let id = order.id;
        self.locks.with_job(id, || -> Result<MapState, InternalError> {
            let mut state = self
                .store
                .get_state(id)
                .map_err(InternalError::store(id))?
                .ok_or(InternalError::MissingState { id })?;

            if let Some(current) = state.attributes.order_submitted_at {
                if current != order.submitted_at {
                    warn!(
                        job_id = %id,
                        order_submitted_at = %order.submitted_at,
                        current = %current,
                        "ignoring write-back of a superseded order"
                    );
                    return Err(InternalError::StaleOrder {
                        id,
                        submitted_at: order.submitted_at,
                    });
                }
            }

            apply(&mut state).map_err(|source| InternalError::Lifecycle { id, source })?;
            self.store.put_state(&state).map_err(InternalError::store(id))?;
            Ok(state)
        })
    }
}
