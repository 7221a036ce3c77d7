//! FILENAME: core/pivot-engine/src/widths.rs
//! Column Width Store - User column widths that survive re-execution.
//!
//! Widths come from three layers, asked in [`WidthSource::PRECEDENCE`] order:
//! 1. per-column entries (direct resize or imported width items)
//! 2. weak per-measure widths (every column showing the measure)
//! 3. the all-measures width (measure columns only)
//!
//! A per-column [`ColumnWidth::Auto`] entry provides no width itself; lower
//! layers still answer and the column may grow to fit.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use execution::{LocatorItem, ResultDimension};

use crate::error::{PivotError, PivotResult};
use crate::field::{descriptor_attribute_id, last_field, FieldSegment};
use crate::sorting::{attribute_by_id, attribute_by_local_identifier, column_locators, locators_field, measure_items};
use crate::view::{ColumnType, GridHeaderNode};

pub const MIN_WIDTH: u32 = 60;
pub const MANUALLY_SIZED_MAX_WIDTH: u32 = 2000;
pub const DEFAULT_COLUMN_WIDTH: u32 = 200;

const AUTO_WIDTH: &str = "auto";

// ============================================================================
// WIDTH VALUES
// ============================================================================

/// Width of one column: absolute pixels or the `auto` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColumnWidthRepr", into = "ColumnWidthRepr")]
pub enum ColumnWidth {
    Absolute { value: u32, allow_grow_to_fit: bool },
    Auto,
}

impl ColumnWidth {
    pub fn absolute(value: u32) -> Self {
        ColumnWidth::Absolute {
            value,
            allow_grow_to_fit: false,
        }
    }

    /// Clamps absolute widths into `[MIN_WIDTH, MANUALLY_SIZED_MAX_WIDTH]`.
    pub fn clamped(self) -> Self {
        match self {
            ColumnWidth::Absolute {
                value,
                allow_grow_to_fit,
            } => ColumnWidth::Absolute {
                value: value.clamp(MIN_WIDTH, MANUALLY_SIZED_MAX_WIDTH),
                allow_grow_to_fit,
            },
            ColumnWidth::Auto => ColumnWidth::Auto,
        }
    }

    pub fn value(&self) -> Option<u32> {
        match self {
            ColumnWidth::Absolute { value, .. } => Some(*value),
            ColumnWidth::Auto => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WidthValue {
    Pixels(u32),
    Keyword(String),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnWidthRepr {
    value: WidthValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    allow_grow_to_fit: Option<bool>,
}

impl TryFrom<ColumnWidthRepr> for ColumnWidth {
    type Error = String;

    fn try_from(repr: ColumnWidthRepr) -> Result<Self, Self::Error> {
        match repr.value {
            WidthValue::Pixels(value) => Ok(ColumnWidth::Absolute {
                value,
                allow_grow_to_fit: repr.allow_grow_to_fit.unwrap_or(false),
            }),
            WidthValue::Keyword(keyword) if keyword == AUTO_WIDTH => Ok(ColumnWidth::Auto),
            WidthValue::Keyword(keyword) => Err(format!("unknown column width '{}'", keyword)),
        }
    }
}

impl From<ColumnWidth> for ColumnWidthRepr {
    fn from(width: ColumnWidth) -> Self {
        match width {
            ColumnWidth::Absolute {
                value,
                allow_grow_to_fit,
            } => ColumnWidthRepr {
                value: WidthValue::Pixels(value),
                allow_grow_to_fit: allow_grow_to_fit.then_some(true),
            },
            ColumnWidth::Auto => ColumnWidthRepr {
                value: WidthValue::Keyword(AUTO_WIDTH.to_string()),
                allow_grow_to_fit: None,
            },
        }
    }
}

// ============================================================================
// WIDTH ITEMS (IMPORT / EXPORT FORMAT)
// ============================================================================

/// One item of the flat width list persisted with a visualization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColumnWidthItemRepr", into = "ColumnWidthItemRepr")]
pub enum ColumnWidthItem {
    /// Width of a row attribute column.
    Attribute {
        attribute_identifier: String,
        width: ColumnWidth,
    },
    /// Width of one measure column, located by attribute values and measure.
    Measure {
        locators: Vec<LocatorItem>,
        width: ColumnWidth,
    },
    /// Width of every measure column.
    AllMeasures { width: ColumnWidth },
    /// Width of every column showing one measure.
    WeakMeasure {
        measure_identifier: String,
        width: ColumnWidth,
    },
}

#[derive(Serialize, Deserialize)]
enum ColumnWidthItemRepr {
    #[serde(rename = "attributeColumnWidthItem", rename_all = "camelCase")]
    Attribute {
        width: ColumnWidth,
        attribute_identifier: String,
    },
    #[serde(rename = "measureColumnWidthItem", rename_all = "camelCase")]
    Measure {
        width: ColumnWidth,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locators: Option<Vec<LocatorItem>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locator: Option<LocatorItem>,
    },
}

impl TryFrom<ColumnWidthItemRepr> for ColumnWidthItem {
    type Error = String;

    fn try_from(repr: ColumnWidthItemRepr) -> Result<Self, Self::Error> {
        match repr {
            ColumnWidthItemRepr::Attribute {
                width,
                attribute_identifier,
            } => Ok(ColumnWidthItem::Attribute {
                attribute_identifier,
                width,
            }),
            ColumnWidthItemRepr::Measure {
                width,
                locators: None,
                locator: None,
            } => Ok(ColumnWidthItem::AllMeasures { width }),
            ColumnWidthItemRepr::Measure {
                width,
                locators: Some(locators),
                locator: None,
            } => Ok(ColumnWidthItem::Measure { locators, width }),
            ColumnWidthItemRepr::Measure {
                width,
                locators: None,
                locator: Some(LocatorItem::Measure { measure_identifier }),
            } => Ok(ColumnWidthItem::WeakMeasure {
                measure_identifier,
                width,
            }),
            ColumnWidthItemRepr::Measure { .. } => {
                Err("measure width item needs either locators or a single measure locator".to_string())
            }
        }
    }
}

impl From<ColumnWidthItem> for ColumnWidthItemRepr {
    fn from(item: ColumnWidthItem) -> Self {
        match item {
            ColumnWidthItem::Attribute {
                attribute_identifier,
                width,
            } => ColumnWidthItemRepr::Attribute {
                width,
                attribute_identifier,
            },
            ColumnWidthItem::Measure { locators, width } => ColumnWidthItemRepr::Measure {
                width,
                locators: Some(locators),
                locator: None,
            },
            ColumnWidthItem::AllMeasures { width } => ColumnWidthItemRepr::Measure {
                width,
                locators: None,
                locator: None,
            },
            ColumnWidthItem::WeakMeasure {
                measure_identifier,
                width,
            } => ColumnWidthItemRepr::Measure {
                width,
                locators: None,
                locator: Some(LocatorItem::Measure { measure_identifier }),
            },
        }
    }
}

// ============================================================================
// COLUMNS
// ============================================================================

/// A sizable column of the current result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidthColumn {
    pub field: String,
    /// Local identifier of the measure shown, for measure columns.
    pub measure_identifier: Option<String>,
}

impl WidthColumn {
    pub fn attribute(field: impl Into<String>) -> Self {
        WidthColumn {
            field: field.into(),
            measure_identifier: None,
        }
    }

    pub fn measure(field: impl Into<String>, measure_identifier: impl Into<String>) -> Self {
        WidthColumn {
            field: field.into(),
            measure_identifier: Some(measure_identifier.into()),
        }
    }

    pub fn is_measure(&self) -> bool {
        self.measure_identifier.is_some()
    }

    /// The column of a leaf header node.
    pub fn from_node(node: &GridHeaderNode, dimensions: &[ResultDimension]) -> PivotResult<Self> {
        match (node.column_type, node.measure_index) {
            (ColumnType::Measure, Some(index)) => {
                let measure = measure_items(dimensions)
                    .get(index)
                    .copied()
                    .ok_or_else(|| PivotError::HeaderNotFound(format!("measure with order {}", index)))?;
                Ok(WidthColumn::measure(&node.field, &measure.local_identifier))
            }
            _ => Ok(WidthColumn::attribute(&node.field)),
        }
    }
}

/// Columns showing the same measure as `target`.
pub fn matching_columns_by_measure<'a>(target: &WidthColumn, columns: &'a [WidthColumn]) -> Vec<&'a WidthColumn> {
    match &target.measure_identifier {
        Some(measure) => columns
            .iter()
            .filter(|column| column.measure_identifier.as_ref() == Some(measure))
            .collect(),
        None => Vec::new(),
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Layer a resolved width came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthSource {
    Column,
    WeakMeasure,
    AllMeasures,
}

impl WidthSource {
    /// Layers in the order they are asked.
    pub const PRECEDENCE: [WidthSource; 3] = [
        WidthSource::Column,
        WidthSource::WeakMeasure,
        WidthSource::AllMeasures,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWidth {
    pub width: u32,
    pub allow_grow_to_fit: bool,
    pub source: WidthSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnEntry {
    width: ColumnWidth,
    measure_identifier: Option<String>,
}

/// The three width layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnWidthStore {
    columns: FxHashMap<String, ColumnEntry>,
    all_measures: Option<u32>,
    /// Absolute widths only.
    weak_measures: FxHashMap<String, ColumnWidth>,
}

impl ColumnWidthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.all_measures.is_none() && self.weak_measures.is_empty()
    }

    pub fn all_measures_width(&self) -> Option<u32> {
        self.all_measures
    }

    pub fn weak_measure_width(&self, measure_identifier: &str) -> Option<u32> {
        self.weak_measures.get(measure_identifier).and_then(ColumnWidth::value)
    }

    /// The explicit entry of a column, `Auto` included.
    pub fn column_entry(&self, field: &str) -> Option<ColumnWidth> {
        self.columns.get(field).map(|entry| entry.width)
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    fn resolve_from(&self, source: WidthSource, column: &WidthColumn) -> Option<ResolvedWidth> {
        let resolved = |width, allow_grow_to_fit| ResolvedWidth {
            width,
            allow_grow_to_fit,
            source,
        };
        match source {
            WidthSource::Column => match self.columns.get(&column.field)?.width {
                ColumnWidth::Absolute {
                    value,
                    allow_grow_to_fit,
                } => Some(resolved(value, allow_grow_to_fit)),
                ColumnWidth::Auto => None,
            },
            WidthSource::WeakMeasure => {
                let measure = column.measure_identifier.as_ref()?;
                match self.weak_measures.get(measure)? {
                    ColumnWidth::Absolute {
                        value,
                        allow_grow_to_fit,
                    } => Some(resolved(*value, *allow_grow_to_fit)),
                    ColumnWidth::Auto => None,
                }
            }
            WidthSource::AllMeasures => {
                if column.is_measure() {
                    self.all_measures.map(|width| resolved(width, false))
                } else {
                    None
                }
            }
        }
    }

    /// Width of `column` from the first layer that has one.
    pub fn resolve(&self, column: &WidthColumn) -> Option<ResolvedWidth> {
        let resolved = WidthSource::PRECEDENCE
            .iter()
            .find_map(|source| self.resolve_from(*source, column))?;

        let auto = matches!(self.column_entry(&column.field), Some(ColumnWidth::Auto));
        Some(ResolvedWidth {
            allow_grow_to_fit: resolved.allow_grow_to_fit || auto,
            ..resolved
        })
    }

    pub fn width_of(&self, column: &WidthColumn) -> Option<u32> {
        self.resolve(column).map(|resolved| resolved.width)
    }

    fn has_measure_rule(&self, column: &WidthColumn) -> bool {
        match &column.measure_identifier {
            Some(measure) => self.all_measures.is_some() || self.weak_measures.contains_key(measure),
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------------

    /// Sets an explicit width, replacing whatever the column had.
    pub fn set_column(&mut self, column: &WidthColumn, width: u32, allow_grow_to_fit: bool) {
        self.columns.insert(
            column.field.clone(),
            ColumnEntry {
                width: ColumnWidth::Absolute {
                    value: width,
                    allow_grow_to_fit,
                },
                measure_identifier: column.measure_identifier.clone(),
            },
        );
    }

    /// Sizes every measure column. Explicit measure column entries and weak
    /// widths are superseded.
    pub fn set_all_measures(&mut self, width: u32) {
        self.all_measures = Some(width);
        self.columns.retain(|_, entry| entry.measure_identifier.is_none());
        self.weak_measures.clear();
    }

    /// Sizes every column of one measure, superseding their explicit entries.
    pub fn set_weak_measure(&mut self, measure_identifier: &str, width: u32) {
        self.weak_measures
            .insert(measure_identifier.to_string(), ColumnWidth::absolute(width));
        self.columns
            .retain(|_, entry| entry.measure_identifier.as_deref() != Some(measure_identifier));
    }

    /// Drops the all-measures and weak widths. Measure columns that were sized
    /// by them get an `Auto` entry.
    pub fn clear_all_measures(&mut self, columns: &[WidthColumn]) {
        for column in columns {
            if self.has_measure_rule(column) && !self.columns.contains_key(&column.field) {
                self.columns.insert(
                    column.field.clone(),
                    ColumnEntry {
                        width: ColumnWidth::Auto,
                        measure_identifier: column.measure_identifier.clone(),
                    },
                );
            }
        }
        self.all_measures = None;
        self.weak_measures.clear();
    }

    /// Drops the weak width of the column's measure together with the `Auto`
    /// entries it left behind (unless an all-measures width still applies).
    pub fn clear_weak_measure(&mut self, column: &WidthColumn) {
        let Some(measure) = column.measure_identifier.as_deref() else {
            return;
        };
        if self.weak_measures.remove(measure).is_none() {
            return;
        }
        if self.all_measures.is_none() {
            self.columns.retain(|_, entry| {
                !(entry.width == ColumnWidth::Auto && entry.measure_identifier.as_deref() == Some(measure))
            });
        }
    }

    /// Drops the explicit entry of a column. A measure column still covered
    /// by a measure rule keeps an `Auto` entry and falls back to that rule.
    pub fn clear_column(&mut self, column: &WidthColumn) {
        self.columns.remove(&column.field);
        if self.has_measure_rule(column) {
            self.columns.insert(
                column.field.clone(),
                ColumnEntry {
                    width: ColumnWidth::Auto,
                    measure_identifier: column.measure_identifier.clone(),
                },
            );
        }
    }

    // ------------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------------

    /// Replaces the store content with the given width items. Widths are
    /// clamped; measure items whose measure is gone are skipped.
    pub fn update_column_widths(
        &mut self,
        items: &[ColumnWidthItem],
        dimensions: &[ResultDimension],
    ) -> PivotResult<()> {
        let mut columns = FxHashMap::default();
        let mut all_measures = None;
        let mut weak_measures = FxHashMap::default();

        for item in items {
            match item {
                ColumnWidthItem::Attribute {
                    attribute_identifier,
                    width,
                } => {
                    let descriptor = attribute_by_local_identifier(dimensions, attribute_identifier)?;
                    let field = FieldSegment::attribute(descriptor_attribute_id(descriptor)?, None).encode();
                    columns.insert(
                        field,
                        ColumnEntry {
                            width: width.clamped(),
                            measure_identifier: None,
                        },
                    );
                }
                ColumnWidthItem::Measure { locators, width } => {
                    let field = match locators_field(locators, dimensions) {
                        Ok(field) => field,
                        Err(PivotError::HeaderNotFound(_)) => continue,
                        Err(error) => return Err(error),
                    };
                    let measure_identifier = locators.iter().rev().find_map(|locator| match locator {
                        LocatorItem::Measure { measure_identifier } => Some(measure_identifier.clone()),
                        LocatorItem::Attribute { .. } => None,
                    });
                    columns.insert(
                        field,
                        ColumnEntry {
                            width: width.clamped(),
                            measure_identifier,
                        },
                    );
                }
                ColumnWidthItem::AllMeasures { width } => {
                    if all_measures.is_none() {
                        all_measures = width.clamped().value();
                    }
                }
                ColumnWidthItem::WeakMeasure {
                    measure_identifier,
                    width,
                } => {
                    let width = width.clamped();
                    if width != ColumnWidth::Auto {
                        weak_measures.insert(measure_identifier.clone(), width);
                    }
                }
            }
        }

        self.columns = columns;
        self.all_measures = all_measures;
        self.weak_measures = weak_measures;
        Ok(())
    }

    /// Exports the store as width items: explicit entries ordered by column,
    /// then the all-measures width, then weak widths ordered by measure.
    pub fn column_widths(&self, dimensions: &[ResultDimension]) -> PivotResult<Vec<ColumnWidthItem>> {
        let mut fields: Vec<&String> = self.columns.keys().collect();
        fields.sort();

        let mut items = Vec::with_capacity(self.columns.len() + self.weak_measures.len() + 1);
        for field in fields {
            let entry = &self.columns[field];
            match last_field(field)? {
                FieldSegment::Measure { .. } => items.push(ColumnWidthItem::Measure {
                    locators: column_locators(field, dimensions)?,
                    width: entry.width,
                }),
                FieldSegment::Attribute { attribute_id, .. } => {
                    let descriptor = attribute_by_id(dimensions, &attribute_id)?;
                    items.push(ColumnWidthItem::Attribute {
                        attribute_identifier: descriptor.local_identifier.clone(),
                        width: entry.width,
                    });
                }
                FieldSegment::Total { .. } => return Err(PivotError::InvalidField(field.clone())),
            }
        }

        if let Some(width) = self.all_measures {
            items.push(ColumnWidthItem::AllMeasures {
                width: ColumnWidth::absolute(width),
            });
        }

        let mut weak: Vec<(&String, &ColumnWidth)> = self.weak_measures.iter().collect();
        weak.sort_by(|a, b| a.0.cmp(b.0));
        items.extend(weak.into_iter().map(|(measure, width)| ColumnWidthItem::WeakMeasure {
            measure_identifier: measure.clone(),
            width: *width,
        }));

        Ok(items)
    }

    // ------------------------------------------------------------------------
    // Decoration
    // ------------------------------------------------------------------------

    /// Decorates every leaf column with its resolved width. Columns without
    /// one get `default_width` and may grow to fit.
    pub fn apply_widths(
        &self,
        nodes: Vec<GridHeaderNode>,
        dimensions: &[ResultDimension],
        default_width: u32,
    ) -> PivotResult<Vec<GridHeaderNode>> {
        let mut failure = None;
        let nodes: Vec<GridHeaderNode> = nodes
            .into_iter()
            .map(|node| {
                node.map_leaves(&mut |mut leaf| {
                    match WidthColumn::from_node(&leaf, dimensions) {
                        Ok(column) => match self.resolve(&column) {
                            Some(resolved) => {
                                leaf.width = Some(resolved.width);
                                leaf.allow_grow_to_fit = resolved.allow_grow_to_fit;
                            }
                            None => {
                                leaf.width = Some(default_width);
                                leaf.allow_grow_to_fit = true;
                            }
                        },
                        Err(error) => {
                            failure.get_or_insert(error);
                        }
                    }
                    leaf
                })
            })
            .collect();

        match failure {
            Some(error) => Err(error),
            None => Ok(nodes),
        }
    }
}
