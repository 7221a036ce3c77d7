//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot grid pipeline.
//!
//! Turns an analytical execution window into grid column definitions and
//! row records, and translates grid interactions back into query shaping.
//! The crate is synchronous and pure; the asynchronous edge lives in
//! `grid-bridge`.
//!
//! Layers:
//! - `field`: Column identifier codec (how columns are NAMED)
//! - `headers`, `rows`: Column tree and row records (WHAT we display)
//! - `sorting`, `widths`, `totals`: Side tables and interaction translation
//! - `engine`: Grid adapter tying the layers together

pub mod error;
pub mod field;
pub mod view;
pub mod headers;
pub mod rows;
pub mod sorting;
pub mod widths;
pub mod totals;
pub mod engine;

#[cfg(test)]
mod test_support;

pub use error::{PivotError, PivotResult};
pub use field::{
    desanitize_field, encode_fields, identify_header, ids_from_uri, parse_field, sanitize_field,
    FieldSegment,
};
pub use view::*;
pub use headers::{column_headers, index_of_tree_node, row_headers, tree_leaves};
pub use rows::drill_row_data;
pub use sorting::{sort_item_for_column, sorting_map, SortingMap};
pub use widths::{
    ColumnWidth, ColumnWidthItem, ColumnWidthStore, ResolvedWidth, WidthColumn, WidthSource,
    DEFAULT_COLUMN_WIDTH,
};
pub use totals::{aggregation_menu, apply_toggle, AggregationMenuItem, ColumnTotal, MenuAggregationClick};
pub use engine::{execution_to_grid, GridAdapterOptions};
