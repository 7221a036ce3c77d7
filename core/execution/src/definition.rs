//! FILENAME: core/execution/src/definition.rs
//! Execution Definition - The query-shaping parameters of an execution.
//!
//! These structures describe WHAT was asked of the query engine:
//! - Dimension layout (which attributes / measure group on which axis)
//! - Totals requested per dimension
//! - Sort items
//!
//! They are plain values: two definitions are the same execution exactly when
//! they compare equal.

use serde::{Deserialize, Serialize};

/// Item identifier that places the measure group into a dimension.
pub const MEASURE_GROUP: &str = "measureGroup";

// ============================================================================
// AGGREGATION
// ============================================================================

/// Aggregation functions available for totals and subtotals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    Sum,
    Max,
    Min,
    Avg,
    Med,
    /// Native (engine-computed, non-additive aware) total.
    Nat,
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Sum
    }
}

impl AggregationType {
    /// All types in the order the aggregations menu lists them.
    pub const ALL: [AggregationType; 6] = [
        AggregationType::Sum,
        AggregationType::Max,
        AggregationType::Min,
        AggregationType::Avg,
        AggregationType::Med,
        AggregationType::Nat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Max => "max",
            AggregationType::Min => "min",
            AggregationType::Avg => "avg",
            AggregationType::Med => "med",
            AggregationType::Nat => "nat",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        AggregationType::ALL
            .into_iter()
            .find(|aggregation| aggregation.as_str() == value)
    }
}

// ============================================================================
// TOTALS
// ============================================================================

/// One requested total: aggregate `measure_identifier` at the level of
/// `attribute_identifier`. A total on the first row attribute is a grand total,
/// a total on any later attribute is a subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalItem {
    #[serde(rename = "type")]
    pub total_type: AggregationType,
    pub measure_identifier: String,
    pub attribute_identifier: String,
}

impl TotalItem {
    pub fn new(
        total_type: AggregationType,
        measure_identifier: impl Into<String>,
        attribute_identifier: impl Into<String>,
    ) -> Self {
        TotalItem {
            total_type,
            measure_identifier: measure_identifier.into(),
            attribute_identifier: attribute_identifier.into(),
        }
    }
}

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Aggregation used by an "area" sort: attribute values are ordered by the
/// aggregate of their children rather than by their own labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortAggregation {
    Sum,
}

/// Points at one attribute value or one measure in a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorItem {
    #[serde(rename = "attributeLocatorItem", rename_all = "camelCase")]
    Attribute {
        attribute_identifier: String,
        /// Attribute element uri.
        element: String,
    },
    #[serde(rename = "measureLocatorItem", rename_all = "camelCase")]
    Measure { measure_identifier: String },
}

impl LocatorItem {
    pub fn attribute(attribute_identifier: impl Into<String>, element: impl Into<String>) -> Self {
        LocatorItem::Attribute {
            attribute_identifier: attribute_identifier.into(),
            element: element.into(),
        }
    }

    pub fn measure(measure_identifier: impl Into<String>) -> Self {
        LocatorItem::Measure {
            measure_identifier: measure_identifier.into(),
        }
    }
}

/// A query-level sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortItem {
    #[serde(rename = "attributeSortItem", rename_all = "camelCase")]
    Attribute {
        attribute_identifier: String,
        direction: SortDirection,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation: Option<SortAggregation>,
    },
    #[serde(rename = "measureSortItem", rename_all = "camelCase")]
    Measure {
        direction: SortDirection,
        locators: Vec<LocatorItem>,
    },
}

impl SortItem {
    pub fn direction(&self) -> SortDirection {
        match self {
            SortItem::Attribute { direction, .. } | SortItem::Measure { direction, .. } => *direction,
        }
    }
}

// ============================================================================
// DEFINITION
// ============================================================================

/// Layout of one dimension of the execution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSpec {
    /// Attribute local identifiers and/or [`MEASURE_GROUP`], in order.
    pub item_identifiers: Vec<String>,
    #[serde(default)]
    pub totals: Vec<TotalItem>,
}

impl DimensionSpec {
    pub fn new(item_identifiers: Vec<String>) -> Self {
        DimensionSpec {
            item_identifiers,
            totals: Vec::new(),
        }
    }
}

/// The complete, comparable description of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDefinition {
    pub dimensions: Vec<DimensionSpec>,
    #[serde(default)]
    pub sorts: Vec<SortItem>,
}

impl ExecutionDefinition {
    pub fn new(dimensions: Vec<DimensionSpec>) -> Self {
        ExecutionDefinition {
            dimensions,
            sorts: Vec::new(),
        }
    }

    /// Totals of the row dimension (the only dimension totals are requested on).
    pub fn row_totals(&self) -> &[TotalItem] {
        self.dimensions
            .first()
            .map(|dimension| dimension.totals.as_slice())
            .unwrap_or(&[])
    }

    /// Returns a copy with new sorts.
    pub fn with_sorts(&self, sorts: Vec<SortItem>) -> Self {
        ExecutionDefinition {
            dimensions: self.dimensions.clone(),
            sorts,
        }
    }

    /// Returns a copy with new row-dimension totals.
    pub fn with_row_totals(&self, totals: Vec<TotalItem>) -> Self {
        let mut dimensions = self.dimensions.clone();
        if let Some(rows) = dimensions.first_mut() {
            rows.totals = totals;
        }
        ExecutionDefinition {
            dimensions,
            sorts: self.sorts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_item_wire_format() {
        let area = SortItem::Attribute {
            attribute_identifier: "a1".to_string(),
            direction: SortDirection::Asc,
            aggregation: Some(SortAggregation::Sum),
        };
        let json = serde_json::to_value(&area).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "attributeSortItem": {
                    "attributeIdentifier": "a1",
                    "direction": "asc",
                    "aggregation": "sum"
                }
            })
        );

        let measure: SortItem = serde_json::from_value(serde_json::json!({
            "measureSortItem": {
                "direction": "desc",
                "locators": [
                    {"attributeLocatorItem": {"attributeIdentifier": "a2", "element": "/gdc/md/p/obj/2/elements?id=3"}},
                    {"measureLocatorItem": {"measureIdentifier": "m1"}}
                ]
            }
        }))
        .unwrap();
        assert_eq!(measure.direction(), SortDirection::Desc);
    }

    #[test]
    fn test_definition_copies_are_value_equal() {
        let mut rows = DimensionSpec::new(vec!["a1".to_string()]);
        rows.totals.push(TotalItem::new(AggregationType::Sum, "m1", "a1"));
        let definition = ExecutionDefinition::new(vec![
            rows,
            DimensionSpec::new(vec![MEASURE_GROUP.to_string()]),
        ]);

        assert_eq!(definition, definition.with_sorts(Vec::new()));
        assert_ne!(definition, definition.with_row_totals(Vec::new()));
        assert_eq!(definition.row_totals().len(), 1);
    }

    #[test]
    fn test_aggregation_names() {
        for aggregation in AggregationType::ALL {
            assert_eq!(AggregationType::parse(aggregation.as_str()), Some(aggregation));
        }
        assert_eq!(AggregationType::parse("stddev"), None);
    }
}
