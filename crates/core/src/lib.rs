//! `printmaps-core`: domain foundation for map build jobs.
//!
//! This crate contains **pure domain** types: identifiers, the metadata and
//! state records of a job, the structured error list returned to clients and
//! the validation engine. No I/O happens here.

pub mod error;
pub mod id;
pub mod metadata;
pub mod state;
pub mod validation;

pub use error::{DomainError, DomainResult, ErrorCode, ErrorEntry, ErrorList};
pub use id::JobId;
pub use metadata::{DOCUMENT_TYPE, MapAttributes, MapData, MapDocument, MapMetadata};
pub use state::{BoundingBox, BuildReport, JobPhase, MapState, StateAttributes};
pub use validation::{MEDIA_TYPE, TransportHeaders, ValidationRules};
