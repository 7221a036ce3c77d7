//! FILENAME: core/execution/src/header.rs
//! PURPOSE: Result headers and dimension descriptors returned by the query engine.
//! CONTEXT: Result headers describe concrete data (one item per row or column),
//! dimension descriptors describe the shape of a dimension independent of data.
//! Both are closed enums so consumers match on them exhaustively.

use serde::{Deserialize, Serialize};

use crate::definition::AggregationType;

// ============================================================================
// RESULT HEADER ITEMS
// ============================================================================

/// A concrete attribute value (e.g. "West" of attribute "Region").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeHeaderItem {
    /// Attribute element uri, `/gdc/md/<project>/obj/<attr>/elements?id=<value>`.
    pub uri: String,
    /// Display name of the value.
    pub name: String,
}

/// A measure column header; `order` indexes into the measure group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasureHeaderItem {
    pub name: String,
    pub order: usize,
}

/// A total marker in the row dimension (subtotal or grand total).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TotalHeaderItem {
    #[serde(rename = "type")]
    pub total_type: AggregationType,
    pub name: String,
}

/// One header item of the execution result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultHeader {
    #[serde(rename = "attributeHeaderItem")]
    Attribute(AttributeHeaderItem),
    #[serde(rename = "measureHeaderItem")]
    Measure(MeasureHeaderItem),
    #[serde(rename = "totalHeaderItem")]
    Total(TotalHeaderItem),
}

impl ResultHeader {
    pub fn attribute(uri: impl Into<String>, name: impl Into<String>) -> Self {
        ResultHeader::Attribute(AttributeHeaderItem {
            uri: uri.into(),
            name: name.into(),
        })
    }

    pub fn measure(name: impl Into<String>, order: usize) -> Self {
        ResultHeader::Measure(MeasureHeaderItem {
            name: name.into(),
            order,
        })
    }

    pub fn total(total_type: AggregationType, name: impl Into<String>) -> Self {
        ResultHeader::Total(TotalHeaderItem {
            total_type,
            name: name.into(),
        })
    }

    /// Display name regardless of the header kind.
    pub fn name(&self) -> &str {
        match self {
            ResultHeader::Attribute(item) => &item.name,
            ResultHeader::Measure(item) => &item.name,
            ResultHeader::Total(item) => &item.name,
        }
    }

    pub fn is_total(&self) -> bool {
        matches!(self, ResultHeader::Total(_))
    }
}

// ============================================================================
// DIMENSION DESCRIPTORS
// ============================================================================

/// The display form an attribute is rendered in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeForm {
    pub uri: String,
    pub identifier: String,
    pub name: String,
}

/// Describes one attribute of a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    /// Identifier of the attribute within the execution definition.
    pub local_identifier: String,
    /// Attribute uri, `/gdc/md/<project>/obj/<attr>`.
    pub uri: String,
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub form_of: AttributeForm,
    /// Totals requested on this attribute level, in totals-block order.
    #[serde(default)]
    pub total_items: Vec<TotalHeaderItem>,
}

/// Describes one measure of a measure group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDescriptor {
    pub local_identifier: String,
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeasureGroupDescriptor {
    pub items: Vec<MeasureDescriptor>,
}

/// One header of a result dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionHeader {
    #[serde(rename = "attributeHeader")]
    Attribute(AttributeDescriptor),
    #[serde(rename = "measureGroupHeader")]
    MeasureGroup(MeasureGroupDescriptor),
}

impl DimensionHeader {
    pub fn as_attribute(&self) -> Option<&AttributeDescriptor> {
        match self {
            DimensionHeader::Attribute(attribute) => Some(attribute),
            DimensionHeader::MeasureGroup(_) => None,
        }
    }

    pub fn as_measure_group(&self) -> Option<&MeasureGroupDescriptor> {
        match self {
            DimensionHeader::MeasureGroup(group) => Some(group),
            DimensionHeader::Attribute(_) => None,
        }
    }
}

/// Shape of one result dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultDimension {
    pub headers: Vec<DimensionHeader>,
}

impl ResultDimension {
    pub fn new(headers: Vec<DimensionHeader>) -> Self {
        ResultDimension { headers }
    }

    /// Attribute descriptors in dimension order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.headers.iter().filter_map(DimensionHeader::as_attribute)
    }

    /// The measure group of this dimension, if any.
    pub fn measure_group(&self) -> Option<&MeasureGroupDescriptor> {
        self.headers.iter().find_map(DimensionHeader::as_measure_group)
    }
}
