//! FILENAME: core/pivot-engine/src/headers.rs
//! Header Tree Builder - Column definitions from the result headers.
//!
//! Column headers (dimension 1) form a tree: every header row is one nesting
//! level and consecutive items with the same identifier merge into one group.
//! Row headers (dimension 0) are flat, one column per row attribute.
//!
//! Merging is driven only by the encoded field, never by display names.

use std::collections::VecDeque;
use std::ops::Range;

use execution::{AttributeDescriptor, DimensionHeader, MeasureDescriptor, ResultHeader};

use crate::error::{PivotError, PivotResult};
use crate::field::{
    descriptor_attribute_id, identify_header, join_field, FieldSegment, FIELD_SEPARATOR,
};
use crate::view::{ColumnType, DrillItem, GridHeaderNode, COLUMN_GROUP_LABEL_FIELD};

/// Label segment used in the group name when several measures are shown.
const MEASURES_LABEL: &str = "measures";

// ============================================================================
// COLUMN HEADERS
// ============================================================================

/// Recursive builder over the column header rows.
struct ColumnTreeBuilder<'a> {
    header_rows: &'a [Vec<ResultHeader>],
    descriptors: &'a [DimensionHeader],
}

impl<'a> ColumnTreeBuilder<'a> {
    /// Builds the nodes of `row` for the items in `range`.
    fn build_level(
        &self,
        row: usize,
        range: Range<usize>,
        prefix: &str,
        parent_drill_items: &[DrillItem],
    ) -> PivotResult<Vec<GridHeaderNode>> {
        let headers = &self.header_rows[row];
        let is_last_row = row + 1 == self.header_rows.len();
        let mut nodes = Vec::new();
        let mut start = range.start;

        while start < range.end {
            let header = &headers[start];
            let field = join_field(prefix, &identify_header(header)?);

            let mut end = start + 1;
            while end < range.end && join_field(prefix, &identify_header(&headers[end])?) == field {
                end += 1;
            }

            let mut node = GridHeaderNode::new(field, header.name(), ColumnType::ColumnAttribute);
            let mut drill_items = parent_drill_items.to_vec();

            match header {
                ResultHeader::Attribute(item) => {
                    let descriptor = self.attribute_descriptor(row)?;
                    drill_items.push(DrillItem::attribute_value(item));
                    drill_items.push(DrillItem::attribute(descriptor));
                }
                ResultHeader::Measure(item) => {
                    let descriptor = self.measure_descriptor(item.order)?;
                    node.column_type = ColumnType::Measure;
                    node.measure_index = Some(item.order);
                    drill_items.push(DrillItem::measure(descriptor));
                }
                ResultHeader::Total(_) => {
                    return Err(PivotError::UnknownHeaderKind(format!(
                        "total header '{}' in the column dimension",
                        node.field
                    )));
                }
            }

            if !is_last_row {
                node.children = self.build_level(row + 1, start..end, &node.field, &drill_items)?;
            }
            node.drill_items = drill_items;
            nodes.push(node);
            start = end;
        }

        Ok(nodes)
    }

    fn attribute_descriptor(&self, row: usize) -> PivotResult<&'a AttributeDescriptor> {
        match self.descriptors.get(row) {
            Some(DimensionHeader::Attribute(descriptor)) => Ok(descriptor),
            Some(DimensionHeader::MeasureGroup(_)) => Err(PivotError::UnknownHeaderKind(format!(
                "attribute header in row {} describes a measure group",
                row
            ))),
            None => Err(PivotError::HeaderNotFound(format!(
                "no descriptor for column header row {}",
                row
            ))),
        }
    }

    fn measure_descriptor(&self, order: usize) -> PivotResult<&'a MeasureDescriptor> {
        self.descriptors
            .iter()
            .find_map(DimensionHeader::as_measure_group)
            .and_then(|group| group.items.get(order))
            .ok_or_else(|| PivotError::HeaderNotFound(format!("measure with order {}", order)))
    }
}

fn check_rectangular(header_rows: &[Vec<ResultHeader>]) -> PivotResult<usize> {
    let width = header_rows.first().map(Vec::len).unwrap_or(0);
    match header_rows.iter().position(|row| row.len() != width) {
        Some(row) => Err(PivotError::HeaderNotFound(format!(
            "column header row {} has {} items, expected {}",
            row,
            header_rows[row].len(),
            width
        ))),
        None => Ok(width),
    }
}

/// Builds the column header tree from `header_items[1]`.
pub fn column_headers(
    header_rows: &[Vec<ResultHeader>],
    descriptors: &[DimensionHeader],
) -> PivotResult<Vec<GridHeaderNode>> {
    let width = check_rectangular(header_rows)?;
    if width == 0 {
        return Ok(Vec::new());
    }

    let builder = ColumnTreeBuilder {
        header_rows,
        descriptors,
    };
    builder.build_level(0, 0..width, "", &[])
}

/// Leaf column identifiers, one per data column.
pub fn column_fields(header_rows: &[Vec<ResultHeader>]) -> PivotResult<Vec<String>> {
    let width = check_rectangular(header_rows)?;
    (0..width)
        .map(|column| {
            let segments = header_rows
                .iter()
                .map(|row| identify_header(&row[column]))
                .collect::<PivotResult<Vec<_>>>()?;
            Ok(segments.join(&FIELD_SEPARATOR.to_string()))
        })
        .collect()
}

/// Wraps the column headers in a label node naming the column attributes,
/// when the column dimension has any.
pub fn with_column_group_label(
    descriptors: &[DimensionHeader],
    column_headers: Vec<GridHeaderNode>,
) -> Vec<GridHeaderNode> {
    if !descriptors.iter().any(|header| header.as_attribute().is_some()) {
        return column_headers;
    }

    let name = descriptors
        .iter()
        .filter_map(|header| match header {
            DimensionHeader::Attribute(descriptor) => Some(descriptor.name.as_str()),
            DimensionHeader::MeasureGroup(group) if group.items.len() > 1 => Some(MEASURES_LABEL),
            DimensionHeader::MeasureGroup(_) => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    let mut label = GridHeaderNode::new(COLUMN_GROUP_LABEL_FIELD, name, ColumnType::ColumnGroupLabel);
    label.children = column_headers;
    vec![label]
}

// ============================================================================
// ROW HEADERS
// ============================================================================

/// One flat column per row attribute. The row dimension must not contain the
/// measure group.
pub fn row_headers(
    descriptors: &[DimensionHeader],
    make_row_groups: bool,
) -> PivotResult<Vec<GridHeaderNode>> {
    descriptors
        .iter()
        .map(|header| match header {
            DimensionHeader::Attribute(descriptor) => {
                let field = FieldSegment::attribute(descriptor_attribute_id(descriptor)?, None).encode();
                let mut node = GridHeaderNode::new(field, &descriptor.name, ColumnType::RowAttribute);
                node.drill_items = vec![DrillItem::attribute(descriptor)];
                node.row_group = make_row_groups;
                Ok(node)
            }
            DimensionHeader::MeasureGroup(_) => Err(PivotError::UnknownHeaderKind(
                "measure group in the row dimension".to_string(),
            )),
        })
        .collect()
}

// ============================================================================
// TREE UTILITIES
// ============================================================================

/// Leaves of the tree in breadth-first order.
pub fn tree_leaves(nodes: &[GridHeaderNode]) -> Vec<&GridHeaderNode> {
    let mut queue: VecDeque<&GridHeaderNode> = nodes.iter().collect();
    let mut leaves = Vec::new();

    while let Some(node) = queue.pop_front() {
        if node.is_leaf() {
            leaves.push(node);
        } else {
            queue.extend(node.children.iter());
        }
    }
    leaves
}

/// Path of child indexes to the first node with `field`.
pub fn index_of_tree_node(nodes: &[GridHeaderNode], field: &str) -> Option<Vec<usize>> {
    for (index, node) in nodes.iter().enumerate() {
        if node.field == field {
            return Some(vec![index]);
        }
        if let Some(mut path) = index_of_tree_node(&node.children, field) {
            path.insert(0, index);
            return Some(path);
        }
    }
    None
}

/// Numbers the top-level columns; leaves under a top-level group are numbered
/// consecutively starting at the group's index.
pub fn assign_indexes(nodes: Vec<GridHeaderNode>) -> Vec<GridHeaderNode> {
    nodes
        .into_iter()
        .enumerate()
        .map(|(index, node)| {
            let mut next_leaf = index;
            let mut node = node.map_leaves(&mut |mut leaf| {
                leaf.index = Some(next_leaf);
                next_leaf += 1;
                leaf
            });
            node.index = Some(index);
            node
        })
        .collect()
}
