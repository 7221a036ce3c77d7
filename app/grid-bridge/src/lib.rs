//! FILENAME: app/grid-bridge/src/lib.rs
//! PURPOSE: Asynchronous and stateful edge of the pivot grid pipeline.
//! CONTEXT: `datasource` bridges the grid's windowed row fetches to a
//! re-executable query; `table` hosts the state that spans results (widths,
//! sorts, totals) and turns user gestures into new query parameters.

pub mod logging;
pub mod config;
pub mod datasource;
pub mod error;
pub mod table;

pub use config::{MenuConfig, PivotTableConfig};
pub use datasource::{
    ColumnSort, FailCallback, GetRowsParams, PageLoadedObserver, PagingDataSource,
    PreparedExecution, SuccessCallback,
};
pub use error::{BridgeError, BridgeResult, QueryError};
pub use logging::{close_log_file, init_log_file, next_seq, write_log};
pub use table::{PivotTableSession, ResizeGesture};
