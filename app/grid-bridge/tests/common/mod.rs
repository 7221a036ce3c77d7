//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for grid bridge integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use execution::{
    AggregationType, AttributeDescriptor, AttributeForm, DataValue, DataView, DimensionHeader, DimensionSpec,
    ExecutionDefinition, ExecutionResponse, ExecutionResult, MeasureDescriptor,
    MeasureGroupDescriptor, Paging, ResultDimension, ResultHeader, SortDirection, SortItem,
    MEASURE_GROUP,
};
use grid_bridge::{ColumnSort, GetRowsParams, PreparedExecution, QueryError};
use pivot_engine::GridRow;

pub const REGION_COUNT: usize = 5;

/// Counts the calls that reach the query engine.
#[derive(Debug, Default)]
pub struct EngineCalls {
    pub reads: AtomicUsize,
    pub executions: AtomicUsize,
}

impl EngineCalls {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

/// In-memory query engine over a small sales table: `Region` rows, `Quarter`
/// columns with `Sales` and `Units` under each quarter. Executing with row
/// totals appends one total row.
#[derive(Clone)]
pub struct FakeExecution {
    pub definition: ExecutionDefinition,
    pub response: ExecutionResponse,
    pub row_headers: Vec<Vec<ResultHeader>>,
    pub column_headers: Vec<Vec<ResultHeader>>,
    pub data: Vec<Vec<DataValue>>,
    pub calls: Arc<EngineCalls>,
    /// When set, every window read waits for a permit.
    pub gate: Option<Arc<Semaphore>>,
    pub failing: bool,
}

fn attribute(local_id: &str, obj_id: u32, name: &str) -> AttributeDescriptor {
    AttributeDescriptor {
        local_identifier: local_id.to_string(),
        uri: format!("/gdc/md/project/obj/{}", obj_id),
        identifier: format!("label.{}", name.to_lowercase()),
        name: name.to_string(),
        form_of: AttributeForm {
            uri: format!("/gdc/md/project/obj/{}", obj_id + 1000),
            identifier: format!("attr.{}", name.to_lowercase()),
            name: name.to_string(),
        },
        total_items: Vec::new(),
    }
}

fn measure(local_id: &str, name: &str) -> MeasureDescriptor {
    MeasureDescriptor {
        local_identifier: local_id.to_string(),
        name: name.to_string(),
        uri: None,
        identifier: None,
        format: "#,##0".to_string(),
    }
}

fn element(obj_id: u32, value_id: usize, name: &str) -> ResultHeader {
    ResultHeader::attribute(
        format!("/gdc/md/project/obj/{}/elements?id={}", obj_id, value_id),
        name,
    )
}

impl FakeExecution {
    pub fn new() -> Self {
        let definition = ExecutionDefinition::new(vec![
            DimensionSpec::new(vec!["a1".to_string()]),
            DimensionSpec::new(vec!["a2".to_string(), MEASURE_GROUP.to_string()]),
        ]);
        let response = ExecutionResponse {
            dimensions: vec![
                ResultDimension::new(vec![DimensionHeader::Attribute(attribute("a1", 1, "Region"))]),
                ResultDimension::new(vec![
                    DimensionHeader::Attribute(attribute("a2", 2, "Quarter")),
                    DimensionHeader::MeasureGroup(MeasureGroupDescriptor {
                        items: vec![measure("m1", "Sales"), measure("m2", "Units")],
                    }),
                ]),
            ],
        };
        let row_headers = vec![(1..=REGION_COUNT)
            .map(|id| element(1, id, &format!("Region {}", id)))
            .collect()];
        let column_headers = vec![
            vec![
                element(2, 1, "Q1"),
                element(2, 1, "Q1"),
                element(2, 2, "Q2"),
                element(2, 2, "Q2"),
            ],
            vec![
                ResultHeader::measure("Sales", 0),
                ResultHeader::measure("Units", 1),
                ResultHeader::measure("Sales", 0),
                ResultHeader::measure("Units", 1),
            ],
        ];
        let data = (1..=REGION_COUNT)
            .map(|row| (1..=4).map(|column| Some((row * 10 + column).to_string())).collect())
            .collect();

        FakeExecution {
            definition,
            response,
            row_headers,
            column_headers,
            data,
            calls: Arc::new(EngineCalls::default()),
            gate: None,
            failing: false,
        }
    }

    pub fn failing() -> Self {
        FakeExecution {
            failing: true,
            ..Self::new()
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        FakeExecution {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn shared(self) -> (Arc<dyn PreparedExecution>, Arc<EngineCalls>) {
        let calls = self.calls.clone();
        (Arc::new(self), calls)
    }

    fn is_descending(definition: &ExecutionDefinition) -> bool {
        definition.sorts.iter().any(|sort| match sort {
            SortItem::Attribute { direction, .. } | SortItem::Measure { direction, .. } => {
                *direction == SortDirection::Desc
            }
        })
    }
}

#[async_trait]
impl PreparedExecution for FakeExecution {
    fn definition(&self) -> &ExecutionDefinition {
        &self.definition
    }

    fn response(&self) -> &ExecutionResponse {
        &self.response
    }

    async fn read_window(&self, offset: usize, size: usize) -> Result<DataView, QueryError> {
        self.calls.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|_| QueryError::Cancelled)?;
        }
        if self.failing {
            return Err(QueryError::Window {
                offset,
                size,
                reason: "engine unavailable".to_string(),
            });
        }

        let total = self.data.len();
        let start = offset.min(total);
        let end = (offset + size).min(total);
        let columns = self.column_headers.first().map(Vec::len).unwrap_or(0);
        let row_headers = self
            .row_headers
            .iter()
            .map(|row| row[start..end].to_vec())
            .collect();

        Ok(DataView::new(
            self.definition.clone(),
            self.response.clone(),
            ExecutionResult {
                data: self.data[start..end].to_vec(),
                header_items: vec![row_headers, self.column_headers.clone()],
                totals: None,
                paging: Paging {
                    count: vec![end - start, columns],
                    offset: vec![offset, 0],
                    total: vec![total, columns],
                },
            },
        ))
    }

    async fn with_definition(
        &self,
        definition: ExecutionDefinition,
    ) -> Result<Arc<dyn PreparedExecution>, QueryError> {
        self.calls.executions.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(QueryError::Execution("engine unavailable".to_string()));
        }

        let mut next = FakeExecution::new();
        if Self::is_descending(&definition) {
            next.data.reverse();
            for row in next.row_headers.iter_mut() {
                row.reverse();
            }
        }
        if !definition.row_totals().is_empty() {
            next.row_headers[0].push(ResultHeader::total(AggregationType::Sum, "Sum"));
            next.data.push((1..=4).map(|column| Some((column * 100).to_string())).collect());
        }
        next.definition = definition;
        next.calls = self.calls.clone();
        next.gate = self.gate.clone();
        Ok(Arc::new(next))
    }
}

/// Collects what the data source hands to the grid callbacks.
#[derive(Clone, Default)]
pub struct Recorder {
    pub successes: Arc<Mutex<Vec<(Vec<GridRow>, usize)>>>,
    pub failures: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn params(&self, start_row: usize, end_row: usize, sort_model: Vec<ColumnSort>) -> GetRowsParams {
        let successes = self.successes.clone();
        let failures = self.failures.clone();
        GetRowsParams {
            start_row,
            end_row,
            sort_model,
            success: Box::new(move |rows: Vec<GridRow>, last_row: usize| successes.lock().unwrap().push((rows, last_row))),
            fail: Box::new(move || {
                failures.fetch_add(1, Ordering::SeqCst);
            }),
        }
    }

    pub fn success_count(&self) -> usize {
        self.successes.lock().unwrap().len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Region names of the rows delivered by success callback `index`.
    pub fn regions(&self, index: usize) -> Vec<String> {
        self.successes.lock().unwrap()[index]
            .0
            .iter()
            .filter_map(|row| row.cell("a_1").map(str::to_string))
            .collect()
    }

    pub fn last_row(&self, index: usize) -> usize {
        self.successes.lock().unwrap()[index].1
    }
}
