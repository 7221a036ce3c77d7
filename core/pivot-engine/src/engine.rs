//! FILENAME: core/pivot-engine/src/engine.rs
//! Grid Adapter - Turns one execution window into a renderable grid table.
//!
//! Algorithm:
//! 1. Build the column header tree from dimension 1 and wrap it in the
//!    group label node
//! 2. Prepend one flat column per row attribute (dimension 0)
//! 3. Number the top-level columns and flag the sorted ones
//! 4. Materialize the data rows and the grand total rows

use execution::{DataView, ResultDimension};

use crate::error::{PivotError, PivotResult};
use crate::headers::{assign_indexes, column_fields, column_headers, row_headers, with_column_group_label};
use crate::rows::{row_data, row_totals};
use crate::sorting::{assign_sorting, sorting_map};
use crate::totals::subtotal_styles;
use crate::view::GridTable;
use crate::widths::DEFAULT_COLUMN_WIDTH;

/// Number of dimensions of a pivot execution: rows and columns.
pub const PIVOT_DIMENSION_COUNT: usize = 2;

/// Options of the grid adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridAdapterOptions {
    /// Mark row attribute columns as row groups.
    pub make_row_groups: bool,
    /// Width of columns the width store knows nothing about.
    pub default_column_width: u32,
}

impl Default for GridAdapterOptions {
    fn default() -> Self {
        GridAdapterOptions {
            make_row_groups: false,
            default_column_width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

fn pivot_dimensions(view: &DataView) -> PivotResult<(&ResultDimension, &ResultDimension)> {
    match view.dimensions() {
        [rows, columns] => Ok((rows, columns)),
        dimensions => Err(PivotError::DimensionCountMismatch {
            expected: PIVOT_DIMENSION_COUNT,
            actual: dimensions.len(),
        }),
    }
}

/// Builds the column definitions, rows and grand totals of a window.
pub fn execution_to_grid(view: &DataView, options: &GridAdapterOptions) -> PivotResult<GridTable> {
    let (row_dimension, column_dimension) = pivot_dimensions(view)?;
    let column_header_items = view.result.dimension_headers(1);

    let column_tree = column_headers(column_header_items, &column_dimension.headers)?;
    let column_tree = with_column_group_label(&column_dimension.headers, column_tree);
    let row_columns = row_headers(&row_dimension.headers, options.make_row_groups)?;

    let sorting = sorting_map(&view.definition.sorts, view.dimensions())?;
    let column_defs: Vec<_> = row_columns.iter().cloned().chain(column_tree).collect();
    let column_defs = assign_sorting(assign_indexes(column_defs), &sorting);

    let leaf_fields = column_fields(column_header_items)?;
    let row_fields: Vec<String> = row_columns.iter().map(|column| column.field.clone()).collect();

    let rows = row_data(
        &view.result,
        &row_columns,
        &leaf_fields,
        &subtotal_styles(row_dimension),
    )?;
    let totals = row_totals(
        view.result.totals.as_deref(),
        &row_fields,
        &leaf_fields,
        row_dimension,
    )?;

    Ok(GridTable {
        column_defs,
        row_data: rows,
        row_totals: totals,
    })
}
