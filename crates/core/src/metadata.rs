//! Metadata record: the client's description of the map to render.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::JobId;

/// JSON:API resource type of every map document.
pub const DOCUMENT_TYPE: &str = "maps";

/// Map attributes supplied by the client.
///
/// Every field is optional on the wire; which ones must be present depends on
/// the operation (see `validation`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fileformat: Option<String>,
    /// Map scale denominator (1:scale).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Printed width in millimeters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_width: Option<f64>,
    /// Printed height in millimeters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_height: Option<f64>,
    /// Center latitude (WGS84).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Center longitude (WGS84).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// EPSG code of the output projection, e.g. `"3857"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
    /// Comma separated layer names to suppress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_layers: Option<String>,
    /// Free-form overlay objects, passed through to the renderer untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_objects: Option<Vec<serde_json::Value>>,
}

/// `data` member of a map document as received on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<MapAttributes>,
}

/// Top-level map document (`{"data": {...}}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    #[serde(default)]
    pub data: MapData,
}

/// Stored metadata of a job: an accepted document with an assigned id.
///
/// Serializes as a full [`MapDocument`], which is both the persisted form and
/// the success payload returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "MapDocument", try_from = "MapDocument")]
pub struct MapMetadata {
    pub id: JobId,
    pub attributes: MapAttributes,
}

impl MapMetadata {
    pub fn new(id: JobId, attributes: MapAttributes) -> Self {
        Self { id, attributes }
    }
}

impl From<MapMetadata> for MapDocument {
    fn from(value: MapMetadata) -> Self {
        MapDocument {
            data: MapData {
                kind: DOCUMENT_TYPE.to_string(),
                id: Some(value.id.to_string()),
                attributes: Some(value.attributes),
            },
        }
    }
}

impl TryFrom<MapDocument> for MapMetadata {
    type Error = DomainError;

    fn try_from(doc: MapDocument) -> Result<Self, Self::Error> {
        let id = doc
            .data
            .id
            .as_deref()
            .ok_or_else(|| DomainError::invalid_id("metadata document has no id"))?
            .parse()?;
        Ok(Self {
            id,
            attributes: doc.data.attributes.unwrap_or_default(),
        })
    }
}
