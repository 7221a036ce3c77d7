//! FILENAME: app/grid-bridge/src/config.rs
//! Pivot table configuration, as handed over by the hosting application.

use std::path::Path;

use serde::{Deserialize, Serialize};

use pivot_engine::{ColumnWidthItem, GridAdapterOptions, DEFAULT_COLUMN_WIDTH};

use crate::error::{BridgeError, BridgeResult};

/// Rows requested per window when the host does not say otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Header menu configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuConfig {
    /// Offer the aggregation (totals) entries in the column header menu
    #[serde(default)]
    pub aggregations: bool,
    /// Offer per-attribute subtotals in a sub menu
    #[serde(default)]
    pub aggregations_sub_menu: bool,
}

/// Pivot table configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotTableConfig {
    pub page_size: Option<usize>,
    pub make_row_groups: Option<bool>,
    pub default_column_width: Option<u32>,
    /// Let columns without a user width grow to fit their content
    pub grow_to_fit: Option<bool>,
    #[serde(default)]
    pub menu: MenuConfig,
    /// Widths restored from a saved visualization
    #[serde(default)]
    pub column_widths: Vec<ColumnWidthItem>,
}

impl PivotTableConfig {
    pub fn from_json_str(json: &str) -> BridgeResult<Self> {
        let config: PivotTableConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> BridgeResult<()> {
        if self.page_size == Some(0) {
            return Err(BridgeError::InvalidConfig("page_size must be positive".to_string()));
        }
        if self.default_column_width == Some(0) {
            return Err(BridgeError::InvalidConfig(
                "default_column_width must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn grow_to_fit(&self) -> bool {
        self.grow_to_fit.unwrap_or(false)
    }

    pub fn to_adapter_options(&self) -> GridAdapterOptions {
        GridAdapterOptions {
            make_row_groups: self.make_row_groups.unwrap_or(false),
            default_column_width: self.default_column_width.unwrap_or(DEFAULT_COLUMN_WIDTH),
        }
    }
}
