//! FILENAME: core/pivot-engine/src/totals.rs
//! Totals Helper - Which aggregations are active where, and menu toggles.
//!
//! Totals are requested as a flat list of `(type, measure, attribute)` items.
//! A total on the first row attribute is a grand total, totals on later
//! attributes are subtotals. The aggregation menu works on a grouped view of
//! that list ([`ColumnTotal`]) and answers toggles with a new list.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use execution::{AggregationType, DimensionHeader, MeasureDescriptor, ResultDimension, TotalItem};

use crate::error::{PivotError, PivotResult};
use crate::field::FieldSegment;
use crate::view::SubtotalStyle;

/// Attributes on which one aggregation type is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTotal {
    #[serde(rename = "type")]
    pub total_type: AggregationType,
    pub attributes: Vec<String>,
}

/// A click on an aggregation menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuAggregationClick {
    pub attribute_identifier: String,
    pub measure_identifiers: Vec<String>,
    #[serde(rename = "type")]
    pub total_type: AggregationType,
    /// `true` adds the total, `false` removes it.
    pub include: bool,
}

/// One checkable entry of the aggregation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationMenuItem {
    #[serde(rename = "type")]
    pub total_type: AggregationType,
    pub attribute_identifier: String,
    pub checked: bool,
}

// ============================================================================
// GROUPING
// ============================================================================

/// Totals of one measure grouped by type. Types keep their first-seen order,
/// attributes their encounter order within a type.
pub fn totals_for_measure(totals: &[TotalItem], measure_identifier: &str) -> Vec<ColumnTotal> {
    let mut grouped: Vec<ColumnTotal> = Vec::new();
    let mut positions: FxHashMap<AggregationType, usize> = FxHashMap::default();

    for total in totals.iter().filter(|t| t.measure_identifier == measure_identifier) {
        let position = *positions.entry(total.total_type).or_insert_with(|| {
            grouped.push(ColumnTotal {
                total_type: total.total_type,
                attributes: Vec::new(),
            });
            grouped.len() - 1
        });
        let attributes = &mut grouped[position].attributes;
        if !attributes.contains(&total.attribute_identifier) {
            attributes.push(total.attribute_identifier.clone());
        }
    }

    grouped
}

/// Totals active for every measure in `measure_identifiers`. A `(type, attribute)`
/// pair is kept only if each measure has it.
pub fn totals_for_attribute_set(
    totals: &[TotalItem],
    measure_identifiers: &[String],
) -> Vec<ColumnTotal> {
    let Some((first, rest)) = measure_identifiers.split_first() else {
        return Vec::new();
    };

    let present: FxHashSet<(AggregationType, &str, &str)> = totals
        .iter()
        .map(|t| (t.total_type, t.measure_identifier.as_str(), t.attribute_identifier.as_str()))
        .collect();

    totals_for_measure(totals, first)
        .into_iter()
        .filter_map(|mut column_total| {
            column_total.attributes.retain(|attribute| {
                rest.iter().all(|measure| {
                    present.contains(&(column_total.total_type, measure.as_str(), attribute.as_str()))
                })
            });
            if column_total.attributes.is_empty() {
                None
            } else {
                Some(column_total)
            }
        })
        .collect()
}

pub fn is_total_enabled_for_attribute(
    attribute_identifier: &str,
    total_type: AggregationType,
    column_totals: &[ColumnTotal],
) -> bool {
    column_totals.iter().any(|column_total| {
        column_total.total_type == total_type
            && column_total.attributes.iter().any(|a| a == attribute_identifier)
    })
}

// ============================================================================
// TOGGLES
// ============================================================================

/// Applies a menu click. Adding appends the missing items and is idempotent;
/// removing drops exactly the matching items and keeps the order of the rest.
pub fn apply_toggle(totals: &[TotalItem], click: &MenuAggregationClick) -> Vec<TotalItem> {
    let matches = |total: &TotalItem| {
        total.total_type == click.total_type
            && total.attribute_identifier == click.attribute_identifier
            && click.measure_identifiers.contains(&total.measure_identifier)
    };

    if click.include {
        let mut updated = totals.to_vec();
        for measure in &click.measure_identifiers {
            let item = TotalItem::new(click.total_type, measure.as_str(), click.attribute_identifier.as_str());
            if !updated.contains(&item) {
                updated.push(item);
            }
        }
        updated
    } else {
        totals.iter().filter(|total| !matches(total)).cloned().collect()
    }
}

// ============================================================================
// HEADER MENU
// ============================================================================

/// Measures affected by the menu of a header: all measures for an attribute
/// header, the clicked measure for a measure header.
pub fn header_measure_local_identifiers(
    measures: &[MeasureDescriptor],
    last_field: &FieldSegment,
) -> PivotResult<Vec<String>> {
    match last_field {
        FieldSegment::Attribute { .. } => Ok(measures
            .iter()
            .map(|measure| measure.local_identifier.clone())
            .collect()),
        FieldSegment::Measure { index } => {
            if measures.is_empty() {
                return Err(PivotError::EmptyMeasureGroup);
            }
            measures
                .get(*index)
                .map(|measure| vec![measure.local_identifier.clone()])
                .ok_or_else(|| PivotError::HeaderNotFound(format!("measure with order {}", index)))
        }
        FieldSegment::Total { total_type } => Err(PivotError::UnknownHeaderKind(format!(
            "total header '{}' has no aggregation menu",
            total_type
        ))),
    }
}

/// Menu entries for the given measures. Grand totals are offered on the first
/// row attribute; with `sub_menu` subtotals are offered on the other ones.
pub fn aggregation_menu(
    totals: &[TotalItem],
    measure_identifiers: &[String],
    row_dimension: &ResultDimension,
    available: &[AggregationType],
    sub_menu: bool,
) -> Vec<AggregationMenuItem> {
    let active = totals_for_attribute_set(totals, measure_identifiers);
    let limit = if sub_menu { usize::MAX } else { 1 };
    let attributes: Vec<&str> = row_dimension
        .attributes()
        .take(limit)
        .map(|descriptor| descriptor.local_identifier.as_str())
        .collect();

    available
        .iter()
        .flat_map(|total_type| {
            let active = &active;
            attributes.iter().map(move |attribute| AggregationMenuItem {
                total_type: *total_type,
                attribute_identifier: attribute.to_string(),
                checked: is_total_enabled_for_attribute(attribute, *total_type, active),
            })
        })
        .collect()
}

// ============================================================================
// SUBTOTAL STYLES
// ============================================================================

/// Style per row attribute for subtotal rows. The first attribute is the grand
/// total level and has none; later attributes with totals alternate, starting
/// with [`SubtotalStyle::Even`].
pub fn subtotal_styles(row_dimension: &ResultDimension) -> Vec<Option<SubtotalStyle>> {
    let mut even = false;
    row_dimension
        .headers
        .iter()
        .enumerate()
        .map(|(index, header)| match header {
            DimensionHeader::Attribute(descriptor) if index > 0 && !descriptor.total_items.is_empty() => {
                even = !even;
                Some(if even { SubtotalStyle::Even } else { SubtotalStyle::Odd })
            }
            _ => None,
        })
        .collect()
}
