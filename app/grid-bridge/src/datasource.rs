//! FILENAME: app/grid-bridge/src/datasource.rs
//! Paging Data Source - Serves the grid's windowed row fetches from a
//! re-executable query.
//!
//! A request names a row window and the sort model of the grid. When the sort
//! model or the requested totals differ from the current execution, the query
//! is re-executed first; otherwise the window is read from the current
//! execution. Reads are serialized: one window read per instance at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use execution::{DataView, ExecutionDefinition, ExecutionResponse, SortDirection, TotalItem};
use pivot_engine::{execution_to_grid, sort_item_for_column, GridAdapterOptions, GridRow, PivotResult};

use crate::error::{BridgeResult, QueryError};
use crate::{log_debug, log_enter, log_error, log_exit, log_info};

// ============================================================================
// QUERY ENGINE CONTRACT
// ============================================================================

/// An executed query whose result can be read window by window.
#[async_trait]
pub trait PreparedExecution: Send + Sync {
    /// What was executed.
    fn definition(&self) -> &ExecutionDefinition;

    /// Dimension descriptors of the result.
    fn response(&self) -> &ExecutionResponse;

    /// Reads `size` rows starting at row `offset`.
    async fn read_window(&self, offset: usize, size: usize) -> Result<DataView, QueryError>;

    /// Executes a new definition.
    async fn with_definition(
        &self,
        definition: ExecutionDefinition,
    ) -> Result<Arc<dyn PreparedExecution>, QueryError>;
}

// ============================================================================
// GRID CONTRACT
// ============================================================================

/// Receives the rows of a window and the index past the last row.
pub type SuccessCallback = Box<dyn FnOnce(Vec<GridRow>, usize) + Send>;

/// Signals that no rows can be delivered for the request.
pub type FailCallback = Box<dyn FnOnce() + Send>;

/// Notified with every window delivered to the grid.
pub type PageLoadedObserver = Box<dyn Fn(&DataView) + Send + Sync>;

/// One entry of the grid's sort model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSort {
    pub column_id: String,
    pub direction: SortDirection,
}

impl ColumnSort {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        ColumnSort {
            column_id: column_id.into(),
            direction,
        }
    }
}

/// A row request of the grid: rows `[start_row, end_row)`.
pub struct GetRowsParams {
    pub start_row: usize,
    pub end_row: usize,
    pub sort_model: Vec<ColumnSort>,
    pub success: SuccessCallback,
    pub fail: FailCallback,
}

// ============================================================================
// DATA SOURCE
// ============================================================================

/// The last window read from the current execution.
struct Window {
    start_row: usize,
    end_row: usize,
    view: DataView,
}

struct SourceState {
    initial_execution: Arc<dyn PreparedExecution>,
    /// First page of the initial execution, if the host already read it.
    initial_view: Option<DataView>,
    execution: Arc<dyn PreparedExecution>,
    /// Totals requested for the next execution.
    row_totals: Vec<TotalItem>,
    last_window: Option<Window>,
    /// Known once a window of the current execution was read.
    total_rows: Option<usize>,
}

pub struct PagingDataSource {
    state: Mutex<SourceState>,
    destroyed: AtomicBool,
    options: GridAdapterOptions,
    on_page_loaded: Option<PageLoadedObserver>,
}

impl PagingDataSource {
    pub fn new(
        execution: Arc<dyn PreparedExecution>,
        initial_view: Option<DataView>,
        options: GridAdapterOptions,
    ) -> Self {
        let row_totals = execution.definition().row_totals().to_vec();
        let total_rows = initial_view.as_ref().map(DataView::total_rows);
        PagingDataSource {
            state: Mutex::new(SourceState {
                initial_execution: execution.clone(),
                initial_view,
                execution,
                row_totals,
                last_window: None,
                total_rows,
            }),
            destroyed: AtomicBool::new(false),
            options,
            on_page_loaded: None,
        }
    }

    pub fn with_page_loaded(mut self, observer: PageLoadedObserver) -> Self {
        self.on_page_loaded = Some(observer);
        self
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Makes the data source inert. Results arriving later are dropped.
    pub fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::SeqCst) {
            log_info!("PAGING", "data source destroyed");
        }
    }

    /// Requests new row totals; the next `get_rows` re-executes with them.
    pub async fn set_row_totals(&self, totals: Vec<TotalItem>) {
        let mut state = self.state.lock().await;
        log_debug!("PAGING", "row totals requested: {}", totals.len());
        state.row_totals = totals;
    }

    /// Definition of the execution windows are currently read from.
    pub async fn current_definition(&self) -> ExecutionDefinition {
        self.state.lock().await.execution.definition().clone()
    }

    /// Serves one row request through its callbacks.
    pub async fn get_rows(&self, params: GetRowsParams) {
        let GetRowsParams {
            start_row,
            end_row,
            sort_model,
            success,
            fail,
        } = params;

        if self.is_destroyed() {
            return;
        }
        log_enter!("PAGING", "get_rows", "rows {}..{} sorts={}", start_row, end_row, sort_model.len());

        let loaded = {
            let mut state = self.state.lock().await;
            self.load_window(&mut state, start_row, end_row, &sort_model).await
        };

        if self.is_destroyed() {
            log_debug!("PAGING", "dropping rows {}..{} of a destroyed data source", start_row, end_row);
            return;
        }

        match loaded {
            Ok(Some(view)) => match execution_to_grid(&view, &self.options) {
                Ok(table) => {
                    let last_row = view.total_rows();
                    log_exit!("PAGING", "get_rows", "{} rows, last row {}", table.row_data.len(), last_row);
                    success(table.row_data, last_row);
                    if let Some(observer) = &self.on_page_loaded {
                        observer(&view);
                    }
                }
                Err(e) => {
                    log_error!("PAGING", "rows {}..{} could not be materialized: {}", start_row, end_row, e);
                    fail();
                }
            },
            Ok(None) => {
                log_exit!("PAGING", "get_rows", "no more rows");
                fail();
            }
            Err(e) => {
                log_error!("PAGING", "rows {}..{} failed: {}", start_row, end_row, e);
                fail();
            }
        }
    }

    fn requested_definition(
        state: &SourceState,
        sort_model: &[ColumnSort],
    ) -> PivotResult<ExecutionDefinition> {
        let current = state.execution.definition();
        let dimensions = &state.execution.response().dimensions;
        let sorts = sort_model
            .iter()
            .map(|sort| sort_item_for_column(&sort.column_id, sort.direction, dimensions, &current.sorts))
            .collect::<PivotResult<Vec<_>>>()?;
        Ok(current.with_sorts(sorts).with_row_totals(state.row_totals.clone()))
    }

    /// The window to deliver, or `None` when `start_row` is past the end.
    async fn load_window(
        &self,
        state: &mut SourceState,
        start_row: usize,
        end_row: usize,
        sort_model: &[ColumnSort],
    ) -> BridgeResult<Option<DataView>> {
        let requested = Self::requested_definition(state, sort_model)?;

        // The known row count only holds for the current execution
        if state.execution.definition() == &requested {
            if let Some(total) = state.total_rows {
                if start_row > 0 && start_row >= total {
                    log_debug!("PAGING", "row {} is past the last row {}", start_row, total);
                    return Ok(None);
                }
            }
        }

        if start_row == 0 && state.initial_execution.definition() == &requested {
            if let Some(initial) = state.initial_view.as_ref().filter(|view| view.covers(0, end_row)) {
                if state.execution.definition() != &requested {
                    state.execution = state.initial_execution.clone();
                    state.last_window = None;
                }
                state.total_rows = Some(initial.total_rows());
                log_debug!("PAGING", "serving rows 0..{} from the initial result", end_row);
                return Ok(Some(initial.clone()));
            }
        }

        if state.execution.definition() != &requested {
            log_info!(
                "PAGING",
                "re-executing with {} sorts and {} totals",
                requested.sorts.len(),
                requested.row_totals().len()
            );
            let execution = state.execution.with_definition(requested).await?;
            state.execution = execution;
            state.last_window = None;
            state.total_rows = None;
        }

        if let Some(window) = state
            .last_window
            .as_ref()
            .filter(|window| window.start_row == start_row && window.end_row == end_row)
        {
            log_debug!("PAGING", "serving rows {}..{} from the last window", start_row, end_row);
            return Ok(Some(window.view.clone()));
        }

        let view = state
            .execution
            .read_window(start_row, end_row.saturating_sub(start_row))
            .await?;
        state.total_rows = Some(view.total_rows());
        state.last_window = Some(Window {
            start_row,
            end_row,
            view: view.clone(),
        });
        Ok(Some(view))
    }
}
