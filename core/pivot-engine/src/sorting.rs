//! FILENAME: core/pivot-engine/src/sorting.rs
//! Sort Translator - Between column sort flags and query sort items.
//!
//! Backward: a sort requested on a grid column becomes an attribute sort (row
//! attribute columns) or a measure sort located by the attribute values on
//! the column's path (measure columns).
//! Forward: the sort items of an execution mark the columns they sort.

use rustc_hash::FxHashMap;

use execution::{
    AttributeDescriptor, LocatorItem, MeasureDescriptor, ResultDimension, SortDirection, SortItem,
};

use crate::error::{PivotError, PivotResult};
use crate::field::{
    descriptor_attribute_id, element_uri, encode_fields, ids_from_uri, parse_field, FieldSegment,
};
use crate::view::GridHeaderNode;

/// Column identifier to sort direction.
pub type SortingMap = FxHashMap<String, SortDirection>;

// ============================================================================
// DESCRIPTOR LOOKUPS
// ============================================================================

pub(crate) fn attribute_by_id<'a>(
    dimensions: &'a [ResultDimension],
    attribute_id: &str,
) -> PivotResult<&'a AttributeDescriptor> {
    for descriptor in dimensions.iter().flat_map(ResultDimension::attributes) {
        if descriptor_attribute_id(descriptor)? == attribute_id {
            return Ok(descriptor);
        }
    }
    Err(PivotError::HeaderNotFound(format!("attribute with id '{}'", attribute_id)))
}

pub(crate) fn attribute_by_local_identifier<'a>(
    dimensions: &'a [ResultDimension],
    local_identifier: &str,
) -> PivotResult<&'a AttributeDescriptor> {
    dimensions
        .iter()
        .flat_map(ResultDimension::attributes)
        .find(|descriptor| descriptor.local_identifier == local_identifier)
        .ok_or_else(|| {
            PivotError::HeaderNotFound(format!("attribute with local identifier '{}'", local_identifier))
        })
}

/// Measures of all measure groups, in order.
pub(crate) fn measure_items(dimensions: &[ResultDimension]) -> Vec<&MeasureDescriptor> {
    dimensions
        .iter()
        .filter_map(ResultDimension::measure_group)
        .flat_map(|group| group.items.iter())
        .collect()
}

// ============================================================================
// COLUMN -> SORT ITEM
// ============================================================================

/// Translates a sort requested on `column_id` into a query sort item.
/// Re-sorting an attribute that was area-sorted keeps the aggregation.
pub fn sort_item_for_column(
    column_id: &str,
    direction: SortDirection,
    dimensions: &[ResultDimension],
    prior_sorts: &[SortItem],
) -> PivotResult<SortItem> {
    let mut segments = parse_field(column_id)?;
    let last = segments
        .pop()
        .ok_or_else(|| PivotError::InvalidField(column_id.to_string()))?;

    match last {
        FieldSegment::Attribute { attribute_id, .. } => {
            let descriptor = attribute_by_id(dimensions, &attribute_id)?;
            let aggregation = prior_sorts.iter().find_map(|sort| match sort {
                SortItem::Attribute {
                    attribute_identifier,
                    aggregation,
                    ..
                } if *attribute_identifier == descriptor.local_identifier => *aggregation,
                _ => None,
            });
            Ok(SortItem::Attribute {
                attribute_identifier: descriptor.local_identifier.clone(),
                direction,
                aggregation,
            })
        }
        FieldSegment::Measure { index } => Ok(SortItem::Measure {
            direction,
            locators: measure_locators(&segments, index, dimensions, column_id)?,
        }),
        FieldSegment::Total { total_type } => Err(PivotError::UnknownHeaderKind(format!(
            "total column '{}' can't be sorted",
            total_type
        ))),
    }
}

// ============================================================================
// LOCATORS
// ============================================================================

/// Locators of a measure column: the attribute values on its path followed
/// by the measure.
pub fn column_locators(column_id: &str, dimensions: &[ResultDimension]) -> PivotResult<Vec<LocatorItem>> {
    let mut segments = parse_field(column_id)?;
    match segments.pop() {
        Some(FieldSegment::Measure { index }) => measure_locators(&segments, index, dimensions, column_id),
        _ => Err(PivotError::InvalidField(column_id.to_string())),
    }
}

fn measure_locators(
    path: &[FieldSegment],
    measure_index: usize,
    dimensions: &[ResultDimension],
    column_id: &str,
) -> PivotResult<Vec<LocatorItem>> {
    let mut locators = Vec::with_capacity(path.len() + 1);
    for segment in path {
        locators.push(attribute_locator(segment, dimensions, column_id)?);
    }

    let measure = measure_items(dimensions)
        .get(measure_index)
        .copied()
        .ok_or_else(|| PivotError::HeaderNotFound(format!("measure with order {}", measure_index)))?;
    locators.push(LocatorItem::measure(measure.local_identifier.as_str()));

    Ok(locators)
}

/// Column identifier addressed by a locator list.
pub fn locators_field(locators: &[LocatorItem], dimensions: &[ResultDimension]) -> PivotResult<String> {
    let measures = measure_items(dimensions);
    let segments = locators
        .iter()
        .map(|locator| match locator {
            LocatorItem::Attribute { element, .. } => {
                let (attribute_id, value_id) = ids_from_uri(element, true)?;
                Ok(FieldSegment::Attribute {
                    attribute_id,
                    value_id,
                })
            }
            LocatorItem::Measure { measure_identifier } => measures
                .iter()
                .position(|measure| measure.local_identifier == *measure_identifier)
                .map(FieldSegment::measure)
                .ok_or_else(|| PivotError::HeaderNotFound(format!("measure '{}'", measure_identifier))),
        })
        .collect::<PivotResult<Vec<_>>>()?;
    Ok(encode_fields(&segments))
}

fn attribute_locator(
    segment: &FieldSegment,
    dimensions: &[ResultDimension],
    column_id: &str,
) -> PivotResult<LocatorItem> {
    match segment {
        FieldSegment::Attribute {
            attribute_id,
            value_id: Some(value_id),
        } => {
            let descriptor = attribute_by_id(dimensions, attribute_id)?;
            Ok(LocatorItem::attribute(
                descriptor.local_identifier.as_str(),
                element_uri(&descriptor.uri, value_id)?,
            ))
        }
        _ => Err(PivotError::HeaderNotFound(format!(
            "attribute value on the path of '{}'",
            column_id
        ))),
    }
}

// ============================================================================
// SORT ITEMS -> COLUMNS
// ============================================================================

/// Column identifier and direction of one sort item.
pub fn sort_item_field(
    sort: &SortItem,
    dimensions: &[ResultDimension],
) -> PivotResult<(String, SortDirection)> {
    match sort {
        SortItem::Attribute {
            attribute_identifier,
            direction,
            ..
        } => {
            let descriptor = attribute_by_local_identifier(dimensions, attribute_identifier)?;
            let field = FieldSegment::attribute(descriptor_attribute_id(descriptor)?, None);
            Ok((field.encode(), *direction))
        }
        SortItem::Measure { direction, locators } => {
            Ok((locators_field(locators, dimensions)?, *direction))
        }
    }
}

/// Sorted columns of an execution.
pub fn sorting_map(sorts: &[SortItem], dimensions: &[ResultDimension]) -> PivotResult<SortingMap> {
    sorts
        .iter()
        .map(|sort| sort_item_field(sort, dimensions))
        .collect()
}

/// Marks every node whose field is sorted.
pub fn assign_sorting(nodes: Vec<GridHeaderNode>, sorting: &SortingMap) -> Vec<GridHeaderNode> {
    nodes
        .into_iter()
        .map(|node| {
            node.map_nodes(&mut |mut node| {
                if let Some(direction) = sorting.get(&node.field) {
                    node.sort = Some(*direction);
                }
                node
            })
        })
        .collect()
}
