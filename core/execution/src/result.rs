//! FILENAME: core/execution/src/result.rs
//! PURPOSE: The data side of an execution: data matrix, header items, totals and paging.
//! CONTEXT: A `DataView` is one window of an execution result together with the
//! definition and dimension descriptors it was produced from. The pivot
//! pipeline only reads it; the grid bridge fetches it from the query engine.

use serde::{Deserialize, Serialize};

use crate::definition::ExecutionDefinition;
use crate::header::{ResultDimension, ResultHeader};

/// A single data cell. The engine sends formatted-agnostic numeric strings and
/// `null` for missing values.
pub type DataValue = Option<String>;

/// Paging information of one window, one entry per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paging {
    /// Number of items in this window.
    pub count: Vec<usize>,
    /// Offset of this window.
    pub offset: Vec<usize>,
    /// Total number of items available.
    pub total: Vec<usize>,
}

impl Paging {
    /// Total number of rows of the whole result.
    pub fn total_rows(&self) -> usize {
        self.total.first().copied().unwrap_or(0)
    }

    /// Row offset of this window.
    pub fn row_offset(&self) -> usize {
        self.offset.first().copied().unwrap_or(0)
    }

    /// Number of rows in this window.
    pub fn row_count(&self) -> usize {
        self.count.first().copied().unwrap_or(0)
    }
}

/// The data part of an execution result window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// `data[row][column]`.
    pub data: Vec<Vec<DataValue>>,
    /// `header_items[dimension][header_row][item]`.
    pub header_items: Vec<Vec<Vec<ResultHeader>>>,
    /// `totals[dimension][total][column]`, present when totals were requested.
    #[serde(default)]
    pub totals: Option<Vec<Vec<Vec<DataValue>>>>,
    pub paging: Paging,
}

impl ExecutionResult {
    /// Header rows of one dimension (empty if the dimension has none).
    pub fn dimension_headers(&self, dimension: usize) -> &[Vec<ResultHeader>] {
        self.header_items
            .get(dimension)
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }
}

/// Describes the dimensions of an execution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub dimensions: Vec<ResultDimension>,
}

/// One window of an execution, with everything needed to interpret it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataView {
    pub definition: ExecutionDefinition,
    pub response: ExecutionResponse,
    pub result: ExecutionResult,
}

impl DataView {
    pub fn new(
        definition: ExecutionDefinition,
        response: ExecutionResponse,
        result: ExecutionResult,
    ) -> Self {
        DataView {
            definition,
            response,
            result,
        }
    }

    pub fn dimensions(&self) -> &[ResultDimension] {
        &self.response.dimensions
    }

    pub fn total_rows(&self) -> usize {
        self.result.paging.total_rows()
    }

    /// Whether this view covers the rows `[start, end)`.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        let offset = self.result.paging.row_offset();
        let available_end = offset + self.result.paging.row_count();
        start >= offset && (end <= available_end || available_end >= self.total_rows())
    }
}
