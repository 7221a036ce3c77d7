//! FILENAME: core/pivot-engine/src/view.rs
//! Grid View - Column definitions and row records handed to the grid widget.
//!
//! These structures are the renderable output of the pipeline:
//! - Column header tree (row attribute columns, column attribute groups, measure leaves)
//! - Row records keyed by column identifier
//! - Grand total rows rendered as pinned rows
//!
//! They are recomputed from scratch for every execution result.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use execution::{
    AttributeDescriptor, AttributeHeaderItem, DataValue, MeasureDescriptor, ResultHeader,
    SortDirection,
};

/// Field of the wrapper node that labels the column attribute groups.
pub const COLUMN_GROUP_LABEL_FIELD: &str = "columnGroupLabel";

// ============================================================================
// COLUMN TYPES AND DRILL METADATA
// ============================================================================

/// The role of a column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Row header column (one per row attribute).
    #[serde(rename = "ROW_ATTRIBUTE_COLUMN")]
    RowAttribute,
    /// Column attribute value group.
    #[serde(rename = "COLUMN_ATTRIBUTE_COLUMN")]
    ColumnAttribute,
    /// Measure leaf column.
    #[serde(rename = "MEASURE_COLUMN")]
    Measure,
    /// Wrapper node labelling the column attributes.
    #[serde(rename = "COLUMN_GROUP_LABEL")]
    ColumnGroupLabel,
}

/// Identifies the attribute, attribute value or measure behind a header,
/// so a click can be resolved to what was clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_identifier: Option<String>,
    pub title: String,
}

impl DrillItem {
    /// A concrete attribute value.
    pub fn attribute_value(item: &AttributeHeaderItem) -> Self {
        DrillItem {
            uri: Some(item.uri.clone()),
            identifier: None,
            local_identifier: None,
            title: item.name.clone(),
        }
    }

    /// The attribute itself.
    pub fn attribute(descriptor: &AttributeDescriptor) -> Self {
        DrillItem {
            uri: Some(descriptor.uri.clone()),
            identifier: Some(descriptor.identifier.clone()),
            local_identifier: Some(descriptor.local_identifier.clone()),
            title: descriptor.name.clone(),
        }
    }

    pub fn measure(descriptor: &MeasureDescriptor) -> Self {
        DrillItem {
            uri: descriptor.uri.clone(),
            identifier: descriptor.identifier.clone(),
            local_identifier: Some(descriptor.local_identifier.clone()),
            title: descriptor.name.clone(),
        }
    }
}

// ============================================================================
// COLUMN HEADER TREE
// ============================================================================

/// One node of the column header tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridHeaderNode {
    /// Column identifier (dash-separated path from the root).
    pub field: String,

    /// Display name.
    pub header_name: String,

    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Child columns; empty for leaves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GridHeaderNode>,

    /// Drill metadata accumulated from the root.
    #[serde(default)]
    pub drill_items: Vec<DrillItem>,

    /// Position among the rendered columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,

    /// Resolved width in pixels, `None` when the grid decides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Whether the grid may widen this column to fill the container.
    #[serde(default = "default_true")]
    pub allow_grow_to_fit: bool,

    /// Order of the measure in the measure group (measure leaves only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_index: Option<usize>,

    /// Rendered by the grid's native row grouping.
    #[serde(default)]
    pub row_group: bool,
}

fn default_true() -> bool {
    true
}

impl GridHeaderNode {
    pub fn new(field: impl Into<String>, header_name: impl Into<String>, column_type: ColumnType) -> Self {
        GridHeaderNode {
            field: field.into(),
            header_name: header_name.into(),
            column_type,
            children: Vec::new(),
            drill_items: Vec::new(),
            index: None,
            sort: None,
            width: None,
            allow_grow_to_fit: true,
            measure_index: None,
            row_group: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Rebuilds this subtree, applying `f` to every leaf.
    pub fn map_leaves<F>(mut self, f: &mut F) -> Self
    where
        F: FnMut(GridHeaderNode) -> GridHeaderNode,
    {
        if self.is_leaf() {
            return f(self);
        }
        self.children = self
            .children
            .into_iter()
            .map(|child| child.map_leaves(f))
            .collect();
        self
    }

    /// Rebuilds this subtree, applying `f` to every node (parents first).
    pub fn map_nodes<F>(self, f: &mut F) -> Self
    where
        F: FnMut(GridHeaderNode) -> GridHeaderNode,
    {
        let mut node = f(self);
        node.children = node
            .children
            .into_iter()
            .map(|child| child.map_nodes(f))
            .collect();
        node
    }
}

// ============================================================================
// ROWS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowType {
    Data,
    Subtotal,
    #[serde(rename = "grandtotal")]
    GrandTotal,
}

/// Alternating style tag of subtotal rows, one per nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtotalStyle {
    Even,
    Odd,
}

/// One materialized row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    /// Row header labels and data cells, keyed by column identifier.
    pub cells: FxHashMap<String, DataValue>,
    /// Result header behind each row header cell.
    pub header_item_map: FxHashMap<String, ResultHeader>,
    #[serde(rename = "type")]
    pub row_type: RowType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal_style: Option<SubtotalStyle>,
}

impl GridRow {
    pub fn new(row_type: RowType) -> Self {
        GridRow {
            cells: FxHashMap::default(),
            header_item_map: FxHashMap::default(),
            row_type,
            subtotal_style: None,
        }
    }

    pub fn cell(&self, field: &str) -> Option<&str> {
        self.cells.get(field).and_then(|value| value.as_deref())
    }
}

/// How far the label of a total row spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColSpan {
    /// Number of row header columns covered by the label.
    pub count: usize,
    /// Column holding the label.
    pub header_key: String,
}

/// A grand total row, rendered pinned below the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridTotalsRow {
    pub col_span: ColSpan,
    pub cells: FxHashMap<String, DataValue>,
    #[serde(rename = "type")]
    pub row_type: RowType,
}

impl GridTotalsRow {
    pub fn cell(&self, field: &str) -> Option<&str> {
        self.cells.get(field).and_then(|value| value.as_deref())
    }
}

/// One value of a drilled row, in leaf column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrillRowValue {
    /// Attribute element clicked through a row header.
    Attribute { id: String, title: String },
    /// Measure cell value.
    Measure(DataValue),
}

// ============================================================================
// GRID TABLE
// ============================================================================

/// Everything the grid needs to render one execution result window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridTable {
    pub column_defs: Vec<GridHeaderNode>,
    pub row_data: Vec<GridRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_totals: Option<Vec<GridTotalsRow>>,
}
