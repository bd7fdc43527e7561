//! Job lifecycle controller.
//!
//! States per job: `nonexistent → created → order-submitted → build-started →
//! build-completed`. The request path (this controller) drives the first two
//! transitions; the renderer reports the rest through [`BuildReporter`].
//!
//! Ordering rules:
//! - an id is generated before anything is written, so a generator failure
//!   leaves nothing behind
//! - metadata is written before state; a failed state write after a
//!   successful metadata write is reported as [`InternalError::OrphanedMetadata`]
//! - the build order is accepted by the queue before `orderSubmittedAt` is
//!   stamped

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use printmaps_core::validation::{self, TransportHeaders, ValidationRules};
use printmaps_core::{
    DomainError, ErrorCode, ErrorEntry, ErrorList, JobId, MapMetadata, MapState,
};

use crate::ids::{IdGenerationError, IdGenerator, RandomIdGenerator};
use crate::locks::JobLocks;
use crate::orders::{BuildOrder, OrderQueue, QueueError};
use crate::store::{RecordStore, StoreError};

mod reporter;

pub use reporter::BuildReporter;

/// Why a lifecycle operation did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The client's request is invalid; nothing was changed.
    #[error("request rejected: {0}")]
    Rejected(ErrorList),
    /// Something failed on our side.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<ErrorList> for LifecycleError {
    fn from(errors: ErrorList) -> Self {
        Self::Rejected(errors)
    }
}

/// Server-side failures. Never the client's fault.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("identifier generation failed: {0}")]
    IdGeneration(#[from] IdGenerationError),

    #[error("record store failure for job {id}: {source}")]
    Store {
        id: JobId,
        #[source]
        source: StoreError,
    },

    #[error("orphaned metadata record for job {id}: state write failed: {source}")]
    OrphanedMetadata {
        id: JobId,
        #[source]
        source: StoreError,
    },

    #[error("job {id} has metadata but no state record")]
    MissingState { id: JobId },

    #[error("build order hand-off failed for job {id}: {source}")]
    OrderHandOff {
        id: JobId,
        #[source]
        source: QueueError,
    },

    #[error("lifecycle violation for job {id}: {source}")]
    Lifecycle {
        id: JobId,
        #[source]
        source: DomainError,
    },

    #[error("write-back for job {id} refers to order {submitted_at}, which was superseded")]
    StaleOrder {
        id: JobId,
        submitted_at: DateTime<Utc>,
    },

    #[error("request worker failed: {0}")]
    Worker(String),
}

impl InternalError {
    fn store(id: JobId) -> impl FnOnce(StoreError) -> InternalError {
        move |source| InternalError::Store { id, source }
    }
}

fn not_found(id: JobId) -> ErrorEntry {
    ErrorEntry::new(ErrorCode::NotFound, format!("requested ID not found: {id}")).with_id(id)
}

/// Orchestrates validation, identity, persistence and the renderer hand-off.
pub struct LifecycleController<S, Q, G = RandomIdGenerator> {
    store: S,
    queue: Q,
    ids: G,
    rules: ValidationRules,
    locks: Arc<JobLocks>,
}

impl<S, Q, G> LifecycleController<S, Q, G>
where
    S: RecordStore,
    Q: OrderQueue,
    G: IdGenerator,
{
    pub fn new(store: S, queue: Q, ids: G, rules: ValidationRules) -> Self {
        Self {
            store,
            queue,
            ids,
            rules,
            locks: Arc::new(JobLocks::new()),
        }
    }

    /// Write-back handle for the renderer, sharing this controller's store
    /// and per-job locks.
    pub fn reporter(&self) -> BuildReporter<S>
    where
        S: Clone,
    {
        BuildReporter::new(self.store.clone(), self.locks.clone())
    }

    /// CreateJob: validate, assign a fresh id, persist metadata then state.
    pub fn create_job(
        &self,
        headers: &TransportHeaders,
        body: &[u8],
    ) -> Result<MapMetadata, LifecycleError> {
        let mut errors = ErrorList::new();
        headers.check_request(&mut errors);
        let doc = validation::decode_document(body, &mut errors);
        if let Some(doc) = &doc {
            validation::check_metadata_document(doc, &self.rules, &mut errors);
        }
        errors.into_result()?;

        let attributes = doc.and_then(|d| d.data.attributes).unwrap_or_default();
        let id = self.ids.generate().map_err(InternalError::from)?;
        let metadata = MapMetadata::new(id, attributes);

        self.store
            .put_metadata(&metadata)
            .map_err(InternalError::store(id))?;

        let state = MapState::created(id, Utc::now());
        if let Err(source) = self.store.put_state(&state) {
            error!(job_id = %id, error = %source, "orphaned metadata record: state write failed");
            return Err(InternalError::OrphanedMetadata { id, source }.into());
        }

        info!(job_id = %id, "map job created");
        Ok(metadata)
    }

    /// SubmitBuildOrder: validate id, existence and completeness, hand the
    /// order to the renderer, then reset the state record for the new cycle.
    pub fn submit_build_order(
        &self,
        headers: &TransportHeaders,
        body: &[u8],
    ) -> Result<MapMetadata, LifecycleError> {
        let mut errors = ErrorList::new();
        headers.check_request(&mut errors);
        let doc = validation::decode_document(body, &mut errors);
        let raw_id = doc.as_ref().and_then(|d| d.data.id.as_deref());
        let Some(id) = validation::parse_job_id(raw_id, &mut errors) else {
            return Err(errors.into());
        };

        self.locks.with_job(id, || self.submit_locked(id, errors))
    }

    fn submit_locked(&self, id: JobId, mut errors: ErrorList) -> Result<MapMetadata, LifecycleError> {
        let metadata = match self.load_existing(id)? {
            Some(m) => m,
            None => {
                errors.push(not_found(id));
                return Err(errors.into());
            }
        };
        validation::check_required_for_build(&metadata.attributes, &mut errors);
        errors.into_result()?;

        let now = Utc::now();
        self.queue
            .submit(BuildOrder::new(metadata.clone(), now))
            .map_err(|source| InternalError::OrderHandOff { id, source })?;

        let mut state = match self.store.get_state(id).map_err(InternalError::store(id))? {
            Some(state) => state,
            None => {
                warn!(job_id = %id, "state record missing, starting from an empty one");
                MapState::empty(id)
            }
        };
        state.submit_order(now);
        self.store
            .put_state(&state)
            .map_err(InternalError::store(id))?;

        info!(job_id = %id, "build order accepted");
        Ok(metadata)
    }

    /// UpdateMetadata: replace the attributes of a job that has no build
    /// order yet. The state record is not touched.
    pub fn update_metadata(
        &self,
        headers: &TransportHeaders,
        body: &[u8],
    ) -> Result<MapMetadata, LifecycleError> {
        let mut errors = ErrorList::new();
        headers.check_request(&mut errors);
        let doc = validation::decode_document(body, &mut errors);
        if let Some(doc) = &doc {
            validation::check_metadata_document(doc, &self.rules, &mut errors);
        }
        let raw_id = doc.as_ref().and_then(|d| d.data.id.as_deref());
        let Some(id) = validation::parse_job_id(raw_id, &mut errors) else {
            return Err(errors.into());
        };

        self.locks.with_job(id, || -> Result<MapMetadata, LifecycleError> {
            if self.load_existing(id)?.is_none() {
                errors.push(not_found(id));
                return Err(errors.into());
            }

            let state = self.store.get_state(id).map_err(InternalError::store(id))?;
            if state.is_some_and(|s| s.attributes.order_submitted_at.is_some()) {
                errors.push(
                    ErrorEntry::new(
                        ErrorCode::MetadataLocked,
                        format!("metadata of {id} is locked: a build order was already submitted"),
                    )
                    .with_id(id),
                );
            }
            errors.into_result()?;

            let attributes = doc.and_then(|d| d.data.attributes).unwrap_or_default();
            let metadata = MapMetadata::new(id, attributes);
            self.store
                .put_metadata(&metadata)
                .map_err(InternalError::store(id))?;

            info!(job_id = %id, "map metadata updated");
            Ok(metadata)
        })
    }

    /// ReadMetadata.
    pub fn metadata(&self, headers: &TransportHeaders, raw_id: &str) -> Result<MapMetadata, LifecycleError> {
        let (id, mut errors) = self.query_preamble(headers, raw_id)?;
        match self.store.get_metadata(id).map_err(InternalError::store(id))? {
            Some(metadata) => {
                errors.into_result()?;
                Ok(metadata)
            }
            None => {
                errors.push(not_found(id));
                Err(errors.into())
            }
        }
    }

    /// ReadState.
    pub fn state(&self, headers: &TransportHeaders, raw_id: &str) -> Result<MapState, LifecycleError> {
        let (id, mut errors) = self.query_preamble(headers, raw_id)?;
        if !self.store.exists(id).map_err(InternalError::store(id))? {
            errors.push(not_found(id));
            return Err(errors.into());
        }
        errors.into_result()?;
        match self.store.get_state(id).map_err(InternalError::store(id))? {
            Some(state) => Ok(state),
            None => {
                error!(job_id = %id, "orphaned metadata record: no state record");
                Err(InternalError::MissingState { id }.into())
            }
        }
    }

    fn query_preamble(
        &self,
        headers: &TransportHeaders,
        raw_id: &str,
    ) -> Result<(JobId, ErrorList), LifecycleError> {
        let mut errors = ErrorList::new();
        headers.check_query(&mut errors);
        match validation::parse_job_id(Some(raw_id), &mut errors) {
            Some(id) => Ok((id, errors)),
            None => Err(errors.into()),
        }
    }

    /// Existence check followed by a read; a record that vanishes between the
    /// two counts as not found.
    fn load_existing(&self, id: JobId) -> Result<Option<MapMetadata>, InternalError> {
        if !self.store.exists(id).map_err(InternalError::store(id))? {
            return Ok(None);
        }
        self.store.get_metadata(id).map_err(InternalError::store(id))
    }
}
