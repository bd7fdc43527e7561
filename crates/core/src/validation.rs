//! Validation engine.
//!
//! Pure checks over transport facts and decoded documents. Each check appends
//! to an [`ErrorList`] and never stops at the first problem, so a single
//! response reports everything wrong with a request.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ErrorEntry, ErrorList};
use crate::id::JobId;
use crate::metadata::{DOCUMENT_TYPE, MapAttributes, MapDocument};

/// JSON:API media type, required for request bodies and accepted responses.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Header values relevant to the job protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportHeaders {
    pub content_type: Option<String>,
    pub accept: Option<String>,
}

impl TransportHeaders {
    pub fn new(content_type: Option<&str>, accept: Option<&str>) -> Self {
        Self {
            content_type: content_type.map(str::to_owned),
            accept: accept.map(str::to_owned),
        }
    }

    /// Checks for requests that carry a body.
    pub fn check_request(&self, errors: &mut ErrorList) {
        check_content_type(self.content_type.as_deref(), errors);
        check_accept(self.accept.as_deref(), errors);
    }

    /// Checks for body-less requests.
    pub fn check_query(&self, errors: &mut ErrorList) {
        check_accept(self.accept.as_deref(), errors);
    }
}

/// Limits applied to map attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub fileformats: Vec<String>,
    pub styles: Vec<String>,
    pub min_scale: u32,
    pub max_scale: u32,
    /// Smallest printable edge in millimeters.
    pub min_print_mm: f64,
    /// Largest printable edge in millimeters.
    pub max_print_mm: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            fileformats: vec!["png".into(), "pdf".into(), "svg".into()],
            styles: vec![
                "osm-carto".into(),
                "osm-carto-mono".into(),
                "osm-carto-ele20".into(),
                "schwarzplan".into(),
                "schwarzplan+".into(),
                "raster10".into(),
            ],
            min_scale: 5_000,
            max_scale: 50_000,
            min_print_mm: 50.0,
            max_print_mm: 1_000.0,
        }
    }
}

/// Web Mercator latitude limit.
const MAX_LATITUDE: f64 = 85.0511;

fn media_type_of(value: &str) -> &str {
    value.split(';').next().unwrap_or("").trim()
}

pub fn check_content_type(value: Option<&str>, errors: &mut ErrorList) {
    match value {
        None => errors.append(
            ErrorCode::ContentType,
            format!("missing header 'Content-Type', expected '{MEDIA_TYPE}'"),
        ),
        Some(v) if !media_type_of(v).eq_ignore_ascii_case(MEDIA_TYPE) => errors.append(
            ErrorCode::ContentType,
            format!("unexpected header 'Content-Type: {v}', expected '{MEDIA_TYPE}'"),
        ),
        Some(_) => {}
    }
}

pub fn check_accept(value: Option<&str>, errors: &mut ErrorList) {
    let acceptable = match value {
        None => false,
        Some(v) => v.split(',').any(|part| {
            let media = media_type_of(part);
            media.eq_ignore_ascii_case(MEDIA_TYPE) || media == "*/*"
        }),
    };
    if !acceptable {
        errors.append(
            ErrorCode::Accept,
            format!(
                "header 'Accept: {}' does not allow '{MEDIA_TYPE}'",
                value.unwrap_or("")
            ),
        );
    }
}

/// Decode a request body; a decode failure becomes one `2001` entry.
pub fn decode_document(body: &[u8], errors: &mut ErrorList) -> Option<MapDocument> {
    match serde_json::from_slice::<MapDocument>(body) {
        Ok(doc) => Some(doc),
        Err(e) => {
            errors.append(ErrorCode::BodyDecode, format!("error = {e}"));
            None
        }
    }
}

pub fn check_document_type(doc: &MapDocument, errors: &mut ErrorList) {
    if doc.data.kind != DOCUMENT_TYPE {
        errors.append(
            ErrorCode::DocumentType,
            format!(
                "data.type is '{}', expected '{DOCUMENT_TYPE}'",
                doc.data.kind
            ),
        );
    }
}

/// Parse the job id of a request; absent or malformed ids become one `4001` entry.
pub fn parse_job_id(raw: Option<&str>, errors: &mut ErrorList) -> Option<JobId> {
    match raw {
        None | Some("") => {
            errors.append(ErrorCode::MalformedId, "missing job id");
            None
        }
        Some(s) => match s.parse::<JobId>() {
            Ok(id) => Some(id),
            Err(e) => {
                errors.append(ErrorCode::MalformedId, format!("error = {e}"));
                None
            }
        },
    }
}

/// Structural checks for a document that creates or replaces metadata:
/// type must be `maps` and `attributes` must be present and well formed.
pub fn check_metadata_document(doc: &MapDocument, rules: &ValidationRules, errors: &mut ErrorList) {
    check_document_type(doc, errors);
    match &doc.data.attributes {
        None => errors.append(ErrorCode::MissingAttribute, "missing member 'data.attributes'"),
        Some(attrs) => check_attributes(attrs, rules, errors),
    }
}

/// Value checks for every attribute that is present.
pub fn check_attributes(attrs: &MapAttributes, rules: &ValidationRules, errors: &mut ErrorList) {
    if let Some(format) = &attrs.fileformat {
        if !rules.fileformats.iter().any(|f| f.eq_ignore_ascii_case(format)) {
            invalid(
                errors,
                "fileformat",
                format!("'{format}' not one of {}", rules.fileformats.join(", ")),
            );
        }
    }

    if let Some(scale) = attrs.scale {
        if scale < rules.min_scale || scale > rules.max_scale {
            invalid(
                errors,
                "scale",
                format!("{scale} outside [{}, {}]", rules.min_scale, rules.max_scale),
            );
        }
    }

    for (name, value) in [("printWidth", attrs.print_width), ("printHeight", attrs.print_height)] {
        if let Some(mm) = value {
            if !mm.is_finite() || mm < rules.min_print_mm || mm > rules.max_print_mm {
                invalid(
                    errors,
                    name,
                    format!("{mm} mm outside [{}, {}]", rules.min_print_mm, rules.max_print_mm),
                );
            }
        }
    }

    if let Some(lat) = attrs.latitude {
        if !lat.is_finite() || lat.abs() > MAX_LATITUDE {
            invalid(errors, "latitude", format!("{lat} outside [-{MAX_LATITUDE}, {MAX_LATITUDE}]"));
        }
    }

    if let Some(lon) = attrs.longitude {
        if !lon.is_finite() || lon.abs() > 180.0 {
            invalid(errors, "longitude", format!("{lon} outside [-180, 180]"));
        }
    }

    if let Some(style) = &attrs.style {
        if !rules.styles.iter().any(|s| s == style) {
            invalid(errors, "style", format!("unknown style '{style}'"));
        }
    }

    if let Some(projection) = &attrs.projection {
        if projection.is_empty() || !projection.chars().all(|c| c.is_ascii_digit()) {
            invalid(
                errors,
                "projection",
                format!("'{projection}' is not an EPSG code"),
            );
        }
    }
}

/// Presence checks for the attributes the renderer needs; one `3002` entry
/// per missing attribute.
pub fn check_required_for_build(attrs: &MapAttributes, errors: &mut ErrorList) {
    let required = [
        ("fileformat", attrs.fileformat.is_some()),
        ("scale", attrs.scale.is_some()),
        ("printWidth", attrs.print_width.is_some()),
        ("printHeight", attrs.print_height.is_some()),
        ("latitude", attrs.latitude.is_some()),
        ("longitude", attrs.longitude.is_some()),
        ("style", attrs.style.is_some()),
        ("projection", attrs.projection.is_some()),
    ];

    for (name, present) in required {
        if !present {
            errors.push(ErrorEntry::new(
                ErrorCode::MissingAttribute,
                format!("missing required attribute '{name}'"),
            ));
        }
    }
}

fn invalid(errors: &mut ErrorList, name: &str, why: String) {
    errors.append(ErrorCode::InvalidAttribute, format!("invalid attribute '{name}': {why}"));
}
