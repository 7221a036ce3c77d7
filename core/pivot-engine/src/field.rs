//! FILENAME: core/pivot-engine/src/field.rs
//! Field Codec - Column identifiers used as grid column ids and map keys.
//!
//! A column identifier is the path from the root of the column header tree to
//! a column, encoded as dash-separated segments:
//! - `a_<attributeId>` or `a_<attributeId>_<valueId>` for attributes
//! - `m_<measureIndex>` for measures
//! - `t_<totalType>` for total headers
//!
//! Ids taken from object uris are sanitized so they never contain a separator
//! or a dot (the grid cannot address fields containing dots).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use execution::{AttributeDescriptor, DimensionHeader, ResultHeader};

use crate::error::{PivotError, PivotResult};

pub const FIELD_SEPARATOR: char = '-';
pub const FIELD_SEPARATOR_PLACEHOLDER: &str = "DASH";
pub const ID_SEPARATOR: char = '_';
pub const ID_SEPARATOR_PLACEHOLDER: &str = "UNDERSCORE";
pub const DOT_PLACEHOLDER: &str = "DOT";
/// Marks a placeholder, so a literal `DOT` in an id never decodes to `.`.
pub const PLACEHOLDER_ESCAPE: char = '~';

pub const FIELD_TYPE_ATTRIBUTE: &str = "a";
pub const FIELD_TYPE_MEASURE: &str = "m";
pub const FIELD_TYPE_TOTAL: &str = "t";

static OBJECT_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"obj/([^/]*)(/elements\?id=)?(.*)?$").expect("object uri pattern is valid")
});

// ============================================================================
// SANITIZATION
// ============================================================================

/// Replaces `.`, `-` and `_` with escaped placeholders.
/// Must be applied exactly once per raw id.
pub fn sanitize_field(raw: &str) -> String {
    let mut sanitized = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '.' => push_placeholder(&mut sanitized, DOT_PLACEHOLDER),
            FIELD_SEPARATOR => push_placeholder(&mut sanitized, FIELD_SEPARATOR_PLACEHOLDER),
            ID_SEPARATOR => push_placeholder(&mut sanitized, ID_SEPARATOR_PLACEHOLDER),
            PLACEHOLDER_ESCAPE => {
                sanitized.push(PLACEHOLDER_ESCAPE);
                sanitized.push(PLACEHOLDER_ESCAPE);
            }
            other => sanitized.push(other),
        }
    }
    sanitized
}

fn push_placeholder(target: &mut String, placeholder: &str) {
    target.push(PLACEHOLDER_ESCAPE);
    target.push_str(placeholder);
}

/// Exact inverse of [`sanitize_field`].
pub fn desanitize_field(sanitized: &str) -> PivotResult<String> {
    let mut raw = String::with_capacity(sanitized.len());
    let mut rest = sanitized;

    while let Some(pos) = rest.find(PLACEHOLDER_ESCAPE) {
        raw.push_str(&rest[..pos]);
        let escaped = &rest[pos + PLACEHOLDER_ESCAPE.len_utf8()..];

        let (decoded, consumed) = if escaped.starts_with(PLACEHOLDER_ESCAPE) {
            (PLACEHOLDER_ESCAPE, PLACEHOLDER_ESCAPE.len_utf8())
        } else if escaped.starts_with(DOT_PLACEHOLDER) {
            ('.', DOT_PLACEHOLDER.len())
        } else if escaped.starts_with(FIELD_SEPARATOR_PLACEHOLDER) {
            (FIELD_SEPARATOR, FIELD_SEPARATOR_PLACEHOLDER.len())
        } else if escaped.starts_with(ID_SEPARATOR_PLACEHOLDER) {
            (ID_SEPARATOR, ID_SEPARATOR_PLACEHOLDER.len())
        } else {
            return Err(PivotError::InvalidField(sanitized.to_string()));
        };

        raw.push(decoded);
        rest = &escaped[consumed..];
    }

    raw.push_str(rest);
    Ok(raw)
}

// ============================================================================
// URI IDS
// ============================================================================

/// Returns `(attribute_id, attribute_value_id)` from an attribute or attribute
/// element uri. The value id is `None` for plain attribute uris.
pub fn ids_from_uri(uri: &str, sanitize: bool) -> PivotResult<(String, Option<String>)> {
    let captures = OBJECT_URI
        .captures(uri)
        .ok_or_else(|| PivotError::InvalidUri(uri.to_string()))?;

    let clean = |id: &str| {
        if sanitize {
            sanitize_field(id)
        } else {
            id.to_string()
        }
    };

    let attribute_id = captures.get(1).map(|m| clean(m.as_str())).unwrap_or_default();
    let value_id = match (captures.get(2), captures.get(3)) {
        (Some(_), Some(value)) if !value.as_str().is_empty() => Some(clean(value.as_str())),
        _ => None,
    };

    Ok((attribute_id, value_id))
}

/// Element uri of an attribute value, built from the attribute uri and a
/// sanitized value id taken from a column field.
pub fn element_uri(attribute_uri: &str, sanitized_value_id: &str) -> PivotResult<String> {
    Ok(format!(
        "{}/elements?id={}",
        attribute_uri,
        desanitize_field(sanitized_value_id)?
    ))
}

/// Sanitized attribute id of an attribute descriptor.
pub fn descriptor_attribute_id(descriptor: &AttributeDescriptor) -> PivotResult<String> {
    Ok(ids_from_uri(&descriptor.uri, true)?.0)
}

// ============================================================================
// SEGMENTS
// ============================================================================

/// One parsed segment of a column identifier. Ids are kept sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldSegment {
    Attribute {
        attribute_id: String,
        value_id: Option<String>,
    },
    Measure {
        index: usize,
    },
    Total {
        total_type: String,
    },
}

impl FieldSegment {
    pub fn attribute(attribute_id: impl Into<String>, value_id: Option<&str>) -> Self {
        FieldSegment::Attribute {
            attribute_id: attribute_id.into(),
            value_id: value_id.map(str::to_string),
        }
    }

    pub fn measure(index: usize) -> Self {
        FieldSegment::Measure { index }
    }

    pub fn field_type(&self) -> &'static str {
        match self {
            FieldSegment::Attribute { .. } => FIELD_TYPE_ATTRIBUTE,
            FieldSegment::Measure { .. } => FIELD_TYPE_MEASURE,
            FieldSegment::Total { .. } => FIELD_TYPE_TOTAL,
        }
    }

    /// Encodes this single segment.
    pub fn encode(&self) -> String {
        match self {
            FieldSegment::Attribute {
                attribute_id,
                value_id: Some(value_id),
            } => format!(
                "{}{}{}{}{}",
                FIELD_TYPE_ATTRIBUTE, ID_SEPARATOR, attribute_id, ID_SEPARATOR, value_id
            ),
            FieldSegment::Attribute {
                attribute_id,
                value_id: None,
            } => format!("{}{}{}", FIELD_TYPE_ATTRIBUTE, ID_SEPARATOR, attribute_id),
            FieldSegment::Measure { index } => {
                format!("{}{}{}", FIELD_TYPE_MEASURE, ID_SEPARATOR, index)
            }
            FieldSegment::Total { total_type } => {
                format!("{}{}{}", FIELD_TYPE_TOTAL, ID_SEPARATOR, total_type)
            }
        }
    }

    fn parse(segment: &str, column_id: &str) -> PivotResult<Self> {
        let invalid = || PivotError::InvalidField(column_id.to_string());
        let parts: SmallVec<[&str; 3]> = segment.split(ID_SEPARATOR).collect();

        match parts.as_slice() {
            [FIELD_TYPE_ATTRIBUTE, attribute_id] if !attribute_id.is_empty() => {
                Ok(FieldSegment::attribute(*attribute_id, None))
            }
            [FIELD_TYPE_ATTRIBUTE, attribute_id, value_id]
                if !attribute_id.is_empty() && !value_id.is_empty() =>
            {
                Ok(FieldSegment::attribute(*attribute_id, Some(value_id)))
            }
            [FIELD_TYPE_MEASURE, index] => index
                .parse()
                .map(FieldSegment::measure)
                .map_err(|_| invalid()),
            [FIELD_TYPE_TOTAL, total_type] if !total_type.is_empty() => Ok(FieldSegment::Total {
                total_type: total_type.to_string(),
            }),
            _ => Err(invalid()),
        }
    }
}

/// Parsed column identifier. Most identifiers are only a few segments deep.
pub type ParsedField = SmallVec<[FieldSegment; 4]>;

/// Splits a column identifier into its segments.
/// Supported ids are e.g. `a_2009`, `a_2009_4-a_2071_12`, `a_2009_4-a_2071_12-m_3`.
pub fn parse_field(column_id: &str) -> PivotResult<ParsedField> {
    if column_id.is_empty() {
        return Err(PivotError::InvalidField(column_id.to_string()));
    }
    column_id
        .split(FIELD_SEPARATOR)
        .map(|segment| FieldSegment::parse(segment, column_id))
        .collect()
}

/// Joins segments into a column identifier.
pub fn encode_fields(segments: &[FieldSegment]) -> String {
    segments
        .iter()
        .map(FieldSegment::encode)
        .collect::<Vec<_>>()
        .join(&FIELD_SEPARATOR.to_string())
}

/// The segment that determines the column type (the last one).
pub fn last_field(column_id: &str) -> PivotResult<FieldSegment> {
    parse_field(column_id)?
        .pop()
        .ok_or_else(|| PivotError::InvalidField(column_id.to_string()))
}

/// Appends a child segment to a parent field.
pub fn join_field(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", prefix, FIELD_SEPARATOR, segment)
    }
}

// ============================================================================
// HEADER IDENTIFICATION
// ============================================================================

/// Identifier of a result header item.
pub fn identify_header(header: &ResultHeader) -> PivotResult<String> {
    let segment = match header {
        ResultHeader::Attribute(item) => {
            let (attribute_id, value_id) = ids_from_uri(&item.uri, true)?;
            FieldSegment::Attribute {
                attribute_id,
                value_id,
            }
        }
        ResultHeader::Measure(item) => FieldSegment::measure(item.order),
        ResultHeader::Total(item) => FieldSegment::Total {
            total_type: item.total_type.as_str().to_string(),
        },
    };
    Ok(segment.encode())
}

/// Identifier of a dimension descriptor. Attribute descriptors have no value
/// id; a measure group can't be identified unambiguously and yields `None`.
pub fn identify_response_header(header: &DimensionHeader) -> PivotResult<Option<String>> {
    match header {
        DimensionHeader::Attribute(descriptor) => Ok(Some(
            FieldSegment::attribute(descriptor_attribute_id(descriptor)?, None).encode(),
        )),
        DimensionHeader::MeasureGroup(_) => Ok(None),
    }
}
