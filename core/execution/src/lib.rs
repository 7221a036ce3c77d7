//! FILENAME: core/execution/src/lib.rs
//! PURPOSE: Main library entry point for the execution result model.
//! CONTEXT: Shared types of the query engine contract, used by `pivot-engine`
//! (pure transformations) and `grid-bridge` (paging and session state).

pub mod definition;
pub mod header;
pub mod result;

// Re-export commonly used types at the crate root
pub use definition::{
    AggregationType, DimensionSpec, ExecutionDefinition, LocatorItem, SortAggregation,
    SortDirection, SortItem, TotalItem, MEASURE_GROUP,
};
pub use header::{
    AttributeDescriptor, AttributeForm, AttributeHeaderItem, DimensionHeader, MeasureDescriptor,
    MeasureGroupDescriptor, MeasureHeaderItem, ResultDimension, ResultHeader, TotalHeaderItem,
};
pub use result::{DataValue, DataView, ExecutionResponse, ExecutionResult, Paging};
