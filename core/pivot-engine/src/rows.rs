//! FILENAME: core/pivot-engine/src/rows.rs
//! Row Materializer - Row records from row headers and the data matrix.
//!
//! Every result row becomes one [`GridRow`] keyed by column identifier:
//! row header columns hold the attribute value names, leaf columns the data.
//! Rows whose headers contain a total marker are subtotals. Grand totals
//! arrive in a separate totals block and become [`GridTotalsRow`]s.

use std::borrow::Cow;

use rustc_hash::FxHashMap;

use execution::{DataValue, DimensionHeader, ExecutionResult, ResultDimension, ResultHeader};

use crate::error::{PivotError, PivotResult};
use crate::field::{last_field, FieldSegment};
use crate::view::{
    ColSpan, ColumnType, DrillRowValue, GridHeaderNode, GridRow, GridTotalsRow, RowType,
    SubtotalStyle,
};

// ============================================================================
// DATA ROWS
// ============================================================================

/// Data rows of the window. Without measures, one placeholder row per row
/// header item so attribute-only tables still get their rows.
pub fn minimal_row_data<'a>(
    data: &'a [Vec<DataValue>],
    row_header_items: &[Vec<ResultHeader>],
) -> Cow<'a, [Vec<DataValue>]> {
    if !data.is_empty() {
        return Cow::Borrowed(data);
    }
    let row_count = row_header_items.first().map(Vec::len).unwrap_or(0);
    Cow::Owned(vec![vec![None]; row_count])
}

/// Materializes one row.
pub fn grid_row(
    cells: &[DataValue],
    row_index: usize,
    column_fields: &[String],
    row_headers: &[GridHeaderNode],
    row_header_items: &[Vec<ResultHeader>],
    subtotal_styles: &[Option<SubtotalStyle>],
) -> PivotResult<GridRow> {
    let mut row = GridRow::new(RowType::Data);
    let mut first_total_seen = false;

    for (column, row_header) in row_headers.iter().enumerate() {
        let item = row_header_items
            .get(column)
            .and_then(|items| items.get(row_index))
            .ok_or_else(|| {
                PivotError::HeaderNotFound(format!(
                    "row header {} of row {} ('{}')",
                    column, row_index, row_header.field
                ))
            })?;

        match item {
            ResultHeader::Attribute(attribute) => {
                row.cells
                    .insert(row_header.field.clone(), Some(attribute.name.clone()));
            }
            ResultHeader::Total(total) => {
                row.row_type = RowType::Subtotal;
                let label = if first_total_seen {
                    None
                } else {
                    first_total_seen = true;
                    row.subtotal_style = subtotal_styles.get(column).copied().flatten();
                    Some(total.name.clone())
                };
                row.cells.insert(row_header.field.clone(), label);
            }
            ResultHeader::Measure(_) => {
                return Err(PivotError::UnknownHeaderKind(format!(
                    "measure header in row header column '{}'",
                    row_header.field
                )));
            }
        }
        row.header_item_map.insert(row_header.field.clone(), item.clone());
    }

    // Placeholder cells of attribute-only tables have no column to go to
    for (cell, field) in cells.iter().zip(column_fields) {
        row.cells.insert(field.clone(), cell.clone());
    }

    Ok(row)
}

/// Materializes every row of the window.
pub fn row_data(
    result: &ExecutionResult,
    row_headers: &[GridHeaderNode],
    column_fields: &[String],
    subtotal_styles: &[Option<SubtotalStyle>],
) -> PivotResult<Vec<GridRow>> {
    let row_header_items = result.dimension_headers(0);
    minimal_row_data(&result.data, row_header_items)
        .iter()
        .enumerate()
        .map(|(row_index, cells)| {
            grid_row(
                cells,
                row_index,
                column_fields,
                row_headers,
                row_header_items,
                subtotal_styles,
            )
        })
        .collect()
}

// ============================================================================
// GRAND TOTALS
// ============================================================================

/// Grand total rows from the row dimension's totals block, or `None` when no
/// totals were requested.
pub fn row_totals(
    totals: Option<&[Vec<Vec<DataValue>>]>,
    row_fields: &[String],
    column_fields: &[String],
    row_dimension: &ResultDimension,
) -> PivotResult<Option<Vec<GridTotalsRow>>> {
    let Some(row_block) = totals.and_then(|block| block.first()) else {
        return Ok(None);
    };

    let header_key = row_fields
        .first()
        .ok_or_else(|| PivotError::HeaderNotFound("row attribute for grand totals".to_string()))?;
    let total_attribute = match row_dimension.headers.first() {
        Some(DimensionHeader::Attribute(descriptor)) => descriptor,
        _ => {
            return Err(PivotError::HeaderNotFound(format!(
                "attribute header for '{}'",
                header_key
            )))
        }
    };

    let mut measure_keys = Vec::new();
    for field in column_fields {
        if let FieldSegment::Measure { .. } = last_field(field)? {
            measure_keys.push(field);
        }
    }

    row_block
        .iter()
        .enumerate()
        .map(|(total_index, values)| {
            let total_item = total_attribute.total_items.get(total_index).ok_or_else(|| {
                PivotError::HeaderNotFound(format!(
                    "total item {} of attribute '{}'",
                    total_index, total_attribute.local_identifier
                ))
            })?;

            let mut cells: FxHashMap<String, DataValue> = measure_keys
                .iter()
                .enumerate()
                .map(|(position, key)| ((*key).clone(), values.get(position).cloned().flatten()))
                .collect();
            cells.insert(header_key.clone(), Some(total_item.name.clone()));

            Ok(GridTotalsRow {
                col_span: ColSpan {
                    count: row_fields.len(),
                    header_key: header_key.clone(),
                },
                cells,
                row_type: RowType::GrandTotal,
            })
        })
        .collect::<PivotResult<Vec<_>>>()
        .map(Some)
}

// ============================================================================
// DRILLING
// ============================================================================

/// Values of a clicked row in leaf column order: measure values, and for
/// attribute columns the element id and label.
pub fn drill_row_data(leaf_columns: &[&GridHeaderNode], row: &GridRow) -> Vec<DrillRowValue> {
    leaf_columns
        .iter()
        .filter_map(|column| match column.column_type {
            ColumnType::Measure => Some(DrillRowValue::Measure(
                row.cells.get(&column.field).cloned().flatten(),
            )),
            ColumnType::RowAttribute | ColumnType::ColumnAttribute => {
                match row.header_item_map.get(&column.field) {
                    Some(ResultHeader::Attribute(item)) => Some(DrillRowValue::Attribute {
                        id: item
                            .uri
                            .split_once("?id=")
                            .map(|(_, id)| id.to_string())
                            .unwrap_or_default(),
                        title: row.cell(&column.field).unwrap_or_default().to_string(),
                    }),
                    _ => None,
                }
            }
            ColumnType::ColumnGroupLabel => None,
        })
        .collect()
}
