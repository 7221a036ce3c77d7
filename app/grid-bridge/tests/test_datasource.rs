//! FILENAME: tests/test_datasource.rs
//! Integration tests for the paging data source.

mod common;

use std::sync::{Arc, Mutex};

use common::{FakeExecution, Recorder, REGION_COUNT};
use execution::{AggregationType, DataView, SortDirection, TotalItem};
use grid_bridge::{ColumnSort, PagingDataSource};
use pivot_engine::GridAdapterOptions;
use tokio::sync::Semaphore;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn create_data_source(fake: FakeExecution) -> (PagingDataSource, Arc<common::EngineCalls>) {
    let (execution, calls) = fake.shared();
    (
        PagingDataSource::new(execution, None, GridAdapterOptions::default()),
        calls,
    )
}

fn region_desc() -> Vec<ColumnSort> {
    vec![ColumnSort::new("a_1", SortDirection::Desc)]
}

// ============================================================================
// WINDOW TESTS
// ============================================================================

#[tokio::test]
async fn test_identical_requests_hit_engine_once() {
    let (source, calls) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 0, Vec::new())).await;
    source.get_rows(recorder.params(0, 0, Vec::new())).await;

    assert_eq!(calls.reads() + calls.executions(), 1);
    assert_eq!(recorder.success_count(), 2);
    assert_eq!(recorder.failure_count(), 0);
}

#[tokio::test]
async fn test_concurrent_identical_requests_hit_engine_once() {
    let (source, calls) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    futures::join!(
        source.get_rows(recorder.params(0, 3, Vec::new())),
        source.get_rows(recorder.params(0, 3, Vec::new())),
    );

    assert_eq!(calls.reads(), 1);
    assert_eq!(recorder.success_count(), 2);
    assert_eq!(recorder.regions(0), recorder.regions(1));
}

#[tokio::test]
async fn test_first_window_rows() {
    let (source, _) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 2, Vec::new())).await;

    assert_eq!(recorder.regions(0), vec!["Region 1", "Region 2"]);
    assert_eq!(recorder.last_row(0), REGION_COUNT);
    let successes = recorder.successes.lock().unwrap();
    assert_eq!(successes[0].0[1].cell("a_2_2-m_1"), Some("24"));
}

#[tokio::test]
async fn test_initial_view_is_reused() {
    let (execution, calls) = FakeExecution::new().shared();
    let initial = execution.read_window(0, 100).await.unwrap();
    let source = PagingDataSource::new(execution, Some(initial), GridAdapterOptions::default());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 100, Vec::new())).await;

    assert_eq!(calls.reads(), 1);
    assert_eq!(recorder.regions(0).len(), REGION_COUNT);
}

#[tokio::test]
async fn test_window_change_reads_without_reexecution() {
    let (source, calls) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 2, Vec::new())).await;
    source.get_rows(recorder.params(2, 4, Vec::new())).await;

    assert_eq!(calls.reads(), 2);
    assert_eq!(calls.executions(), 0);
    assert_eq!(recorder.regions(1), vec!["Region 3", "Region 4"]);
}

#[tokio::test]
async fn test_start_past_end_fails_without_query() {
    let (source, calls) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 2, Vec::new())).await;
    source.get_rows(recorder.params(10, 12, Vec::new())).await;

    assert_eq!(calls.reads(), 1);
    assert_eq!(recorder.success_count(), 1);
    assert_eq!(recorder.failure_count(), 1);
}

// ============================================================================
// RE-EXECUTION TESTS
// ============================================================================

#[tokio::test]
async fn test_sort_change_reexecutes() {
    let (source, calls) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 2, region_desc())).await;

    assert_eq!(calls.executions(), 1);
    assert_eq!(calls.reads(), 1);
    assert_eq!(recorder.regions(0), vec!["Region 5", "Region 4"]);
    assert_eq!(source.current_definition().await.sorts.len(), 1);

    // Same sort, same window: nothing new reaches the engine
    source.get_rows(recorder.params(0, 2, region_desc())).await;
    assert_eq!(calls.executions(), 1);
    assert_eq!(calls.reads(), 1);
    assert_eq!(recorder.success_count(), 2);
}

#[tokio::test]
async fn test_unsorting_returns_to_initial_result() {
    let (execution, calls) = FakeExecution::new().shared();
    let initial = execution.read_window(0, 100).await.unwrap();
    let source = PagingDataSource::new(execution, Some(initial), GridAdapterOptions::default());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 100, region_desc())).await;
    source.get_rows(recorder.params(0, 100, Vec::new())).await;

    assert_eq!(calls.executions(), 1);
    assert_eq!(calls.reads(), 2);
    assert_eq!(recorder.regions(0)[0], "Region 5");
    assert_eq!(recorder.regions(1)[0], "Region 1");
    assert!(source.current_definition().await.sorts.is_empty());
}

#[tokio::test]
async fn test_totals_change_reexecutes() {
    let (source, calls) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 2, Vec::new())).await;
    source
        .set_row_totals(vec![TotalItem::new(AggregationType::Sum, "m1", "a1")])
        .await;
    source.get_rows(recorder.params(0, 2, Vec::new())).await;

    assert_eq!(calls.executions(), 1);
    assert_eq!(calls.reads(), 2);
    assert_eq!(source.current_definition().await.row_totals().len(), 1);
}

#[tokio::test]
async fn test_rows_added_by_new_totals_are_reachable() {
    let (source, calls) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 2, Vec::new())).await;
    source
        .set_row_totals(vec![TotalItem::new(AggregationType::Sum, "m1", "a1")])
        .await;
    source
        .get_rows(recorder.params(REGION_COUNT, REGION_COUNT + 2, Vec::new()))
        .await;

    assert_eq!(calls.executions(), 1);
    assert_eq!(recorder.failure_count(), 0);
    assert_eq!(recorder.last_row(1), REGION_COUNT + 1);
    let successes = recorder.successes.lock().unwrap();
    assert_eq!(successes[1].0.len(), 1);
    assert_eq!(successes[1].0[0].cell("a_1"), Some("Sum"));
}

#[tokio::test]
async fn test_unknown_sort_column_fails() {
    let (source, calls) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    source
        .get_rows(recorder.params(0, 2, vec![ColumnSort::new("a_99", SortDirection::Asc)]))
        .await;

    assert_eq!(calls.reads() + calls.executions(), 0);
    assert_eq!(recorder.failure_count(), 1);
}

// ============================================================================
// FAILURE AND LIFECYCLE TESTS
// ============================================================================

#[tokio::test]
async fn test_engine_failure_calls_fail() {
    let (source, _) = create_data_source(FakeExecution::failing());
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 2, Vec::new())).await;

    assert_eq!(recorder.success_count(), 0);
    assert_eq!(recorder.failure_count(), 1);
}

#[tokio::test]
async fn test_destroy_drops_in_flight_results() {
    let gate = Arc::new(Semaphore::new(0));
    let (source, calls) = create_data_source(FakeExecution::gated(gate.clone()));
    let recorder = Recorder::default();

    futures::join!(source.get_rows(recorder.params(0, 2, Vec::new())), async {
        tokio::task::yield_now().await;
        source.destroy();
        gate.add_permits(1);
    });

    assert_eq!(calls.reads(), 1);
    assert_eq!(recorder.success_count(), 0);
    assert_eq!(recorder.failure_count(), 0);
}

#[tokio::test]
async fn test_destroy_is_idempotent() {
    let (source, calls) = create_data_source(FakeExecution::new());
    let recorder = Recorder::default();

    source.destroy();
    source.destroy();
    source.get_rows(recorder.params(0, 2, Vec::new())).await;

    assert!(source.is_destroyed());
    assert_eq!(calls.reads(), 0);
    assert_eq!(recorder.success_count() + recorder.failure_count(), 0);
}

#[tokio::test]
async fn test_page_loaded_observer() {
    let (execution, _) = FakeExecution::new().shared();
    let loaded = Arc::new(Mutex::new(Vec::new()));
    let observed = loaded.clone();
    let source = PagingDataSource::new(execution, None, GridAdapterOptions::default()).with_page_loaded(
        Box::new(move |view: &DataView| observed.lock().unwrap().push(view.result.paging.row_offset())),
    );
    let recorder = Recorder::default();

    source.get_rows(recorder.params(0, 2, Vec::new())).await;
    source.get_rows(recorder.params(2, 4, Vec::new())).await;
    source.get_rows(recorder.params(40, 42, Vec::new())).await;

    assert_eq!(*loaded.lock().unwrap(), vec![0, 2]);
}
