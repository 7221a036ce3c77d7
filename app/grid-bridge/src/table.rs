//! FILENAME: app/grid-bridge/src/table.rs
//! Pivot Table Session - State of one hosted pivot table across results.
//!
//! The session owns what outlives a single execution result: the column width
//! store, the current sorts and totals. It turns user gestures (sorting,
//! resizing, aggregation menu clicks) into store updates and new query
//! parameters, and keeps the latest window delivered by its data source.

use std::sync::{Arc, Mutex};

use execution::{AggregationType, DataView, SortDirection, SortItem, TotalItem};
use pivot_engine::field::last_field;
use pivot_engine::sorting::sort_item_for_column;
use pivot_engine::totals::header_measure_local_identifiers;
use pivot_engine::widths::matching_columns_by_measure;
use pivot_engine::{
    aggregation_menu, apply_toggle, execution_to_grid, tree_leaves, AggregationMenuItem,
    ColumnWidthItem, ColumnWidthStore, GridAdapterOptions, GridHeaderNode, GridTable,
    MenuAggregationClick, WidthColumn,
};

use crate::config::PivotTableConfig;
use crate::datasource::{PagingDataSource, PreparedExecution};
use crate::error::{BridgeError, BridgeResult};
use crate::{log_debug, log_info};

/// What a resize or width reset applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeGesture {
    /// Only the resized column.
    Column,
    /// Every measure column.
    AllMeasures,
    /// Every column of the resized column's measure.
    SameMeasure,
}

pub struct PivotTableSession {
    config: PivotTableConfig,
    options: GridAdapterOptions,
    data_source: Arc<PagingDataSource>,
    widths: ColumnWidthStore,
    latest_view: Arc<Mutex<DataView>>,
    sorts: Vec<SortItem>,
    totals: Vec<TotalItem>,
}

impl PivotTableSession {
    /// Reads the first page of `execution` and sets up the data source that
    /// serves the following requests.
    pub async fn open(config: PivotTableConfig, execution: Arc<dyn PreparedExecution>) -> BridgeResult<Self> {
        let options = config.to_adapter_options();
        let initial_view = execution.read_window(0, config.page_size()).await?;

        let mut widths = ColumnWidthStore::new();
        widths.update_column_widths(&config.column_widths, initial_view.dimensions())?;

        let sorts = execution.definition().sorts.clone();
        let totals = execution.definition().row_totals().to_vec();
        log_info!(
            "PIVOT",
            "session opened: {} rows, {} width items",
            initial_view.total_rows(),
            config.column_widths.len()
        );

        let latest_view = Arc::new(Mutex::new(initial_view.clone()));
        let observed = latest_view.clone();
        let data_source = PagingDataSource::new(execution, Some(initial_view), options).with_page_loaded(
            Box::new(move |view: &DataView| {
                let mut latest = observed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                *latest = view.clone();
            }),
        );

        Ok(PivotTableSession {
            config,
            options,
            data_source: Arc::new(data_source),
            widths,
            latest_view,
            sorts,
            totals,
        })
    }

    pub fn data_source(&self) -> Arc<PagingDataSource> {
        self.data_source.clone()
    }

    /// The window most recently delivered to the grid.
    pub fn current_view(&self) -> DataView {
        self.latest_view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn sorts(&self) -> &[SortItem] {
        &self.sorts
    }

    pub fn totals(&self) -> &[TotalItem] {
        &self.totals
    }

    pub fn destroy(&self) {
        self.data_source.destroy();
    }

    // ========================================================================
    // GRID
    // ========================================================================

    /// Column definitions and rows of the current window, decorated with
    /// widths.
    pub fn grid(&self) -> BridgeResult<GridTable> {
        let view = self.current_view();
        let mut table = execution_to_grid(&view, &self.options)?;
        table.column_defs =
            self.widths
                .apply_widths(table.column_defs, view.dimensions(), self.options.default_column_width)?;
        Ok(table)
    }

    pub fn column_defs(&self) -> BridgeResult<Vec<GridHeaderNode>> {
        Ok(self.grid()?.column_defs)
    }

    /// Every sizable column of the current window.
    pub fn width_columns(&self) -> BridgeResult<Vec<WidthColumn>> {
        let view = self.current_view();
        let table = execution_to_grid(&view, &self.options)?;
        tree_leaves(&table.column_defs)
            .into_iter()
            .map(|leaf| WidthColumn::from_node(leaf, view.dimensions()).map_err(BridgeError::from))
            .collect()
    }

    fn width_column(&self, field: &str) -> BridgeResult<WidthColumn> {
        self.width_columns()?
            .into_iter()
            .find(|column| column.field == field)
            .ok_or_else(|| BridgeError::UnknownColumn(field.to_string()))
    }

    // ========================================================================
    // SORTING
    // ========================================================================

    /// Sorts by one column, replacing the previous sorts. Returns the sort
    /// items to persist.
    pub fn sort_changed(&mut self, column_id: &str, direction: SortDirection) -> BridgeResult<Vec<SortItem>> {
        let view = self.current_view();
        let sort = sort_item_for_column(column_id, direction, view.dimensions(), &self.sorts)?;
        log_debug!("PIVOT", "sort {} {}", column_id, direction.as_str());
        self.sorts = vec![sort];
        Ok(self.sorts.clone())
    }

    // ========================================================================
    // WIDTHS
    // ========================================================================

    /// Applies a finished resize of column `field`.
    pub fn column_resized(&mut self, field: &str, width: u32, gesture: ResizeGesture) -> BridgeResult<()> {
        let column = self.width_column(field)?;
        match (gesture, column.measure_identifier.as_deref()) {
            (ResizeGesture::AllMeasures, Some(_)) => self.widths.set_all_measures(width),
            (ResizeGesture::SameMeasure, Some(measure)) => self.widths.set_weak_measure(measure, width),
            _ => self
                .widths
                .set_column(&column, width, self.config.grow_to_fit()),
        }
        log_debug!("PIVOT", "column {} resized to {} ({:?})", field, width, gesture);
        Ok(())
    }

    /// Drops the user width of column `field`, or the measure rule it was
    /// sized by.
    pub fn reset_column_width(&mut self, field: &str, gesture: ResizeGesture) -> BridgeResult<()> {
        let column = self.width_column(field)?;
        match gesture {
            ResizeGesture::Column => self.widths.clear_column(&column),
            ResizeGesture::AllMeasures => {
                let columns = self.width_columns()?;
                self.widths.clear_all_measures(&columns);
            }
            ResizeGesture::SameMeasure => self.widths.clear_weak_measure(&column),
        }
        log_debug!("PIVOT", "column {} width reset ({:?})", field, gesture);
        Ok(())
    }

    /// Columns that a same-measure resize of `field` affects.
    pub fn columns_of_same_measure(&self, field: &str) -> BridgeResult<Vec<String>> {
        let columns = self.width_columns()?;
        let target = self.width_column(field)?;
        Ok(matching_columns_by_measure(&target, &columns)
            .into_iter()
            .map(|column| column.field.clone())
            .collect())
    }

    /// The width items to persist with the visualization.
    pub fn column_widths(&self) -> BridgeResult<Vec<ColumnWidthItem>> {
        let view = self.current_view();
        Ok(self.widths.column_widths(view.dimensions())?)
    }

    // ========================================================================
    // TOTALS
    // ========================================================================

    /// Aggregation menu of the header `field`; empty when the menu is off.
    pub fn aggregation_menu(&self, field: &str) -> BridgeResult<Vec<AggregationMenuItem>> {
        if !self.config.menu.aggregations {
            return Ok(Vec::new());
        }
        let view = self.current_view();
        let dimensions = view.dimensions();
        let measures: Vec<_> = dimensions
            .iter()
            .filter_map(|dimension| dimension.measure_group())
            .flat_map(|group| group.items.iter().cloned())
            .collect();
        let measure_identifiers = header_measure_local_identifiers(&measures, &last_field(field)?)?;
        let row_dimension = dimensions
            .first()
            .ok_or_else(|| BridgeError::UnknownColumn(field.to_string()))?;

        Ok(aggregation_menu(
            &self.totals,
            &measure_identifiers,
            row_dimension,
            &AggregationType::ALL,
            self.config.menu.aggregations_sub_menu,
        ))
    }

    /// Applies an aggregation menu click and hands the new totals to the data
    /// source. Returns the totals to persist.
    pub async fn menu_aggregation_click(&mut self, click: &MenuAggregationClick) -> Vec<TotalItem> {
        self.totals = apply_toggle(&self.totals, click);
        log_info!(
            "PIVOT",
            "{} {} on {}: {} totals",
            if click.include { "add" } else { "remove" },
            click.total_type.as_str(),
            click.attribute_identifier,
            self.totals.len()
        );
        self.data_source.set_row_totals(self.totals.clone()).await;
        self.totals.clone()
    }
}
