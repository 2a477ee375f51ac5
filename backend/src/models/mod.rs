//! Domain models for the WHX manifest pipeline.
//!
//! This module contains the data structures passed between stages:
//!
//! - [`ColumnNames`] - Header texts searched for in the order export
//! - [`ColumnIndexes`] - Resolved positions of those headers
//! - [`OrderLine`] - One validated order line, ready for the manifest
//! - [`OutputRow`] - One 13-field manifest row
//! - [`SkippedRow`] - A data row excluded without error
//! - [`Manifest`] - Header, rows and skip report of one run

use serde::{Deserialize, Serialize};

/// A row of text cells, as produced by any sheet reader.
pub type Row = Vec<String>;

// =============================================================================
// Domain Constants
// =============================================================================

/// Value of the outbound-type field for dispatchable lines.
pub const OUTBOUND_TYPE: &str = "销售出库";

/// Logistics company written for dispatchable lines.
pub const LOGISTICS_BRAND: &str = "First Logistics";

/// Order platform written for dispatchable lines.
pub const ORDER_PLATFORM: &str = "SHOPIFY";

/// File-name prefix of generated manifests.
pub const OUTPUT_PREFIX: &str = "Warehouse_";

/// Number of fields in a manifest row.
pub const OUTPUT_WIDTH: usize = 13;

/// Position of the quantity field, written as a number in workbooks.
pub const QUANTITY_COLUMN: usize = 5;

/// Fixed manifest header.
pub const OUTPUT_HEADERS: [&str; OUTPUT_WIDTH] = [
    "出库类型",
    "运单号",
    "物流公司",
    "物流渠道",
    "SKU编码",
    "数量",
    "订单平台",
    "客户参考单号",
    "其他参考单号",
    "出库优先级",
    "备注",
    "面单URL",
    "渠道国家",
];

// =============================================================================
// Columns
// =============================================================================

/// Header texts that identify each input column.
///
/// Matching is exact after trimming the header cell. The defaults are the
/// headers of the merchant order export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnNames {
    pub order: String,
    pub sku: String,
    pub qty: String,
    pub method: String,
    pub tracking: String,
    pub country: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            order: "平台单号".to_string(),
            sku: "SKU".to_string(),
            qty: "数量".to_string(),
            method: "物流方式".to_string(),
            tracking: "运单号".to_string(),
            country: "国家/地区".to_string(),
        }
    }
}

/// Resolved column offsets. Required columns are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndexes {
    pub order: usize,
    pub sku: usize,
    pub qty: usize,
    pub method: Option<usize>,
    pub tracking: Option<usize>,
    pub country: Option<usize>,
}

// =============================================================================
// Records
// =============================================================================

/// A validated order line. The SKU code is always resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub tracking: String,
    pub logistics_channel: String,
    pub sku_code: String,
    pub quantity: u64,
    pub customer_ref: String,
    pub country: String,
    pub has_tracking: bool,
}

/// Why a data row produced no order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptySku,
    EmptyQuantity,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptySku => "empty SKU",
            Self::EmptyQuantity => "empty quantity",
        }
    }
}

/// A data row that was excluded without failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based row number in the input sheet.
    pub row: usize,
    pub reason: SkipReason,
}

// =============================================================================
// Output
// =============================================================================

/// One manifest row, in output column order.
///
/// Dispatch fields (outbound type, company, channel, platform, customer
/// reference) are only filled for lines with a tracking number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRow {
    pub outbound_type: String,
    pub tracking: String,
    pub logistics_company: String,
    pub logistics_channel: String,
    pub sku_code: String,
    pub quantity: u64,
    pub order_platform: String,
    pub customer_ref: String,
    pub other_ref: String,
    pub priority: String,
    pub remark: String,
    pub label_url: String,
    pub country: String,
}

/// Everything a run produces before it is written out.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub rows: Vec<OutputRow>,
    pub skipped: Vec<SkippedRow>,
}

impl Manifest {
    /// Number of manifest data rows (header excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header followed by one rendered row per output row.
    pub fn to_rows(&self) -> Vec<Row> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(OUTPUT_HEADERS.iter().map(|h| h.to_string()).collect());
        out.extend(self.rows.iter().map(OutputRow::to_cells));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_column_names() {
        let names = ColumnNames::default();
        assert_eq!(names.order, "平台单号");
        assert_eq!(names.sku, "SKU");
        assert_eq!(names.country, "国家/地区");
    }

    #[test]
    fn test_column_names_partial_json_keeps_defaults() {
        let names: ColumnNames = serde_json::from_str(r#"{"order": "Order", "qty": "Qty"}"#).unwrap();
        assert_eq!(names.order, "Order");
        assert_eq!(names.qty, "Qty");
        assert_eq!(names.sku, "SKU");
        assert_eq!(names.tracking, "运单号");
    }

    #[test]
    fn test_manifest_rows_start_with_header() {
        let manifest = Manifest {
            rows: vec![OutputRow {
                sku_code: "C100".into(),
                quantity: 2,
                ..Default::default()
            }],
            skipped: vec![],
        };
        let rows = manifest.to_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), OUTPUT_WIDTH);
        assert_eq!(rows[0][4], "SKU编码");
        assert_eq!(rows[1][4], "C100");
        assert_eq!(rows[1][5], "2");
        assert_eq!(rows[0][QUANTITY_COLUMN], "数量");
    }
}
