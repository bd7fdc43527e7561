//! State record: lifecycle facts and build result of a job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::JobId;
use crate::metadata::DOCUMENT_TYPE;

/// Axis-aligned box describing the extent of a rendered map in one unit system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Lifecycle phase derived from the timestamps of a [`MapState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Metadata written, no build order yet.
    Created,
    /// A build order was handed to the renderer.
    OrderSubmitted,
    /// The renderer picked the order up.
    BuildStarted,
    /// The renderer finished.
    BuildCompleted { successful: bool },
}

/// Result written back by the renderer when a build finishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub successful: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub extent_millimeter: Option<BoundingBox>,
    #[serde(default)]
    pub extent_pixel: Option<BoundingBox>,
    #[serde(default)]
    pub extent_projection: Option<BoundingBox>,
    #[serde(default)]
    pub extent_geographic: Option<BoundingBox>,
}

/// Attributes of the state record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateAttributes {
    pub metadata_written_at: Option<DateTime<Utc>>,
    pub order_submitted_at: Option<DateTime<Utc>>,
    pub build_started_at: Option<DateTime<Utc>>,
    pub build_completed_at: Option<DateTime<Utc>>,
    pub build_successful: Option<bool>,
    pub build_message: Option<String>,
    pub build_extent_millimeter: Option<BoundingBox>,
    pub build_extent_pixel: Option<BoundingBox>,
    pub build_extent_projection: Option<BoundingBox>,
    pub build_extent_geographic: Option<BoundingBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateData {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: JobId,
    pub attributes: StateAttributes,
}

/// Wire/persisted form of a state record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDocument {
    pub data: StateData,
}

/// State record of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StateDocument", from = "StateDocument")]
pub struct MapState {
    pub id: JobId,
    pub attributes: StateAttributes,
}

impl From<MapState> for StateDocument {
    fn from(value: MapState) -> Self {
        StateDocument {
            data: StateData {
                kind: DOCUMENT_TYPE.to_string(),
                id: value.id,
                attributes: value.attributes,
            },
        }
    }
}

impl From<StateDocument> for MapState {
    fn from(doc: StateDocument) -> Self {
        MapState {
            id: doc.data.id,
            attributes: doc.data.attributes,
        }
    }
}

impl MapState {
    /// Empty record, as if nothing had ever happened to the job.
    pub fn empty(id: JobId) -> Self {
        Self {
            id,
            attributes: StateAttributes::default(),
        }
    }

    /// Record for a job whose metadata was just written.
    pub fn created(id: JobId, now: DateTime<Utc>) -> Self {
        let mut state = Self::empty(id);
        state.attributes.metadata_written_at = Some(now);
        state
    }

    pub fn phase(&self) -> JobPhase {
        let a = &self.attributes;
        if a.build_completed_at.is_some() {
            JobPhase::BuildCompleted {
                successful: a.build_successful.unwrap_or(false),
            }
        } else if a.build_started_at.is_some() {
            JobPhase::BuildStarted
        } else if a.order_submitted_at.is_some() {
            JobPhase::OrderSubmitted
        } else {
            JobPhase::Created
        }
    }

    /// Start a fresh build cycle: stamps the order time and drops any
    /// result of an earlier build. `metadata_written_at` is left alone.
    pub fn submit_order(&mut self, now: DateTime<Utc>) {
        self.attributes.order_submitted_at = Some(now);
        self.clear_build_result();
    }

    pub fn clear_build_result(&mut self) {
        let a = &mut self.attributes;
        a.build_started_at = None;
        a.build_completed_at = None;
        a.build_successful = None;
        a.build_message = None;
        a.build_extent_millimeter = None;
        a.build_extent_pixel = None;
        a.build_extent_projection = None;
        a.build_extent_geographic = None;
    }

    pub fn has_build_result(&self) -> bool {
        let a = &self.attributes;
        a.build_started_at.is_some()
            || a.build_completed_at.is_some()
            || a.build_successful.is_some()
            || a.build_message.is_some()
            || a.build_extent_millimeter.is_some()
            || a.build_extent_pixel.is_some()
            || a.build_extent_projection.is_some()
            || a.build_extent_geographic.is_some()
    }

    /// Renderer picked up the current order. Any result still on the record
    /// belongs to an earlier build and is dropped.
    pub fn begin_build(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.attributes.order_submitted_at.is_none() {
            return Err(DomainError::invariant(format!(
                "build started for job {} without a submitted order",
                self.id
            )));
        }
        self.clear_build_result();
        self.attributes.build_started_at = Some(now);
        Ok(())
    }

    /// Renderer finished the current order.
    pub fn complete_build(&mut self, report: BuildReport, now: DateTime<Utc>) -> DomainResult<()> {
        if self.attributes.order_submitted_at.is_none() {
            return Err(DomainError::invariant(format!(
                "build completed for job {} without a submitted order",
                self.id
            )));
        }
        let a = &mut self.attributes;
        if a.build_started_at.is_none() {
            a.build_started_at = Some(now);
        }
        a.build_completed_at = Some(now);
        a.build_successful = Some(report.successful);
        a.build_message = Some(report.message);
        a.build_extent_millimeter = report.extent_millimeter;
        a.build_extent_pixel = report.extent_pixel;
        a.build_extent_projection = report.extent_projection;
        a.build_extent_geographic = report.extent_geographic;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn id() -> JobId {
        "3d0c1a52-7c1e-4b53-8d0e-7f5a4c2b1e90".parse().unwrap()
    }

    fn report() -> BuildReport {
        BuildReport {
            successful: true,
            message: "ok".into(),
            extent_millimeter: Some(BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 420.0,
                max_y: 297.0,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn created_state_only_has_metadata_timestamp() {
        let now = Utc::now();
        let state = MapState::created(id(), now);
        assert_eq!(state.attributes.metadata_written_at, Some(now));
        assert!(state.attributes.order_submitted_at.is_none());
        assert!(!state.has_build_result());
        assert_eq!(state.phase(), JobPhase::Created);
    }

    #[test]
    fn lifecycle_walks_through_phases() {
        let t0 = Utc::now();
        let mut state = MapState::created(id(), t0);

        state.submit_order(t0 + Duration::seconds(1));
        assert_eq!(state.phase(), JobPhase::OrderSubmitted);

        state.begin_build(t0 + Duration::seconds(2)).unwrap();
        assert_eq!(state.phase(), JobPhase::BuildStarted);

        state.complete_build(report(), t0 + Duration::seconds(3)).unwrap();
        assert_eq!(state.phase(), JobPhase::BuildCompleted { successful: true });
        assert_eq!(state.attributes.build_message.as_deref(), Some("ok"));
    }

    #[test]
    fn resubmission_resets_result_but_keeps_creation_time() {
        let t0 = Utc::now();
        let mut state = MapState::created(id(), t0);
        state.submit_order(t0);
        state.complete_build(report(), t0).unwrap();
        assert!(state.has_build_result());

        let t1 = t0 + Duration::minutes(5);
        state.submit_order(t1);

        assert_eq!(state.attributes.metadata_written_at, Some(t0));
        assert_eq!(state.attributes.order_submitted_at, Some(t1));
        assert!(!state.has_build_result());
        assert_eq!(state.phase(), JobPhase::OrderSubmitted);
    }

    #[test]
    fn begin_build_drops_leftover_result() {
        let t0 = Utc::now();
        let mut state = MapState::created(id(), t0);
        state.submit_order(t0);
        state.complete_build(report(), t0).unwrap();

        state.begin_build(t0 + Duration::seconds(1)).unwrap();

        assert_eq!(state.phase(), JobPhase::BuildStarted);
        assert!(state.attributes.build_completed_at.is_none());
        assert!(state.attributes.build_successful.is_none());
        assert!(state.attributes.build_message.is_none());
        assert!(state.attributes.build_extent_millimeter.is_none());
        assert_eq!(state.attributes.build_started_at, Some(t0 + Duration::seconds(1)));
    }

    #[test]
    fn build_without_order_is_rejected() {
        let mut state = MapState::created(id(), Utc::now());
        assert!(state.begin_build(Utc::now()).is_err());
        assert!(state.complete_build(report(), Utc::now()).is_err());
    }

    #[test]
    fn state_serializes_as_document() {
        let state = MapState::created(id(), Utc::now());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["data"]["type"], "maps");
        assert_eq!(json["data"]["id"], id().to_string());
        assert!(json["data"]["attributes"]["metadataWrittenAt"].is_string());
        assert!(json["data"]["attributes"]["buildSuccessful"].is_null());

        let back: MapState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
