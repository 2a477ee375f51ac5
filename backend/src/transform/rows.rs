//! Row validation and derivation.
//!
//! Turns the data rows of an order export into [`OrderLine`]s:
//!
//! ```text
//! 平台单号 | SKU | 数量 | 物流方式    | 运单号 | 国家/地区
//! O1       | X1  | 3    | Air-Express | TRK1   | US        →  C100 ×3, Express, US
//! O1       | X1  | 2    | Air-Express |        |           →  C100 ×2, US (carried)
//! ```
//!
//! Rows are processed strictly in input order. A row with an empty SKU or
//! quantity is skipped; an unknown SKU or malformed quantity aborts the
//! whole run.

use std::collections::HashMap;

use crate::error::{ConvertError, ConvertResult};
use crate::mapping::MappingTable;
use crate::models::{ColumnIndexes, OrderLine, Row, SkipReason, SkippedRow};

use super::channel::extract_channel;

/// Result of transforming every data row.
#[derive(Debug, Clone, Default)]
pub struct TransformedRows {
    /// Valid order lines, in input order.
    pub lines: Vec<OrderLine>,
    /// Rows excluded without error.
    pub skipped: Vec<SkippedRow>,
}

/// Last non-empty country seen per order id, for one run only.
#[derive(Debug, Default)]
struct CountryCarry {
    by_order: HashMap<String, String>,
}

impl CountryCarry {
    fn fill(&self, order_id: &str, country: &str) -> String {
        if !country.is_empty() || order_id.is_empty() {
            return country.to_string();
        }
        self.by_order.get(order_id).cloned().unwrap_or_default()
    }

    fn remember(&mut self, order_id: &str, country: &str) {
        if !country.is_empty() && !order_id.is_empty() {
            self.by_order.insert(order_id.to_string(), country.to_string());
        }
    }
}

/// Trimmed cell at `idx`; missing cells read as empty.
fn cell(row: &Row, idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(|c| c.trim()).unwrap_or("")
}

/// Transform the data rows of `rows` (row 0 is the header).
///
/// Row numbers in errors and skip records are 1-based sheet rows, so the
/// first data row is row 2.
pub fn transform_rows(
    rows: &[Row],
    cols: &ColumnIndexes,
    mapping: &MappingTable,
) -> ConvertResult<TransformedRows> {
    let mut out = TransformedRows::default();
    let mut carry = CountryCarry::default();

    for (idx, row) in rows.iter().enumerate().skip(1) {
        let row_num = idx + 1;

        let order_id = cell(row, Some(cols.order));
        let sku = cell(row, Some(cols.sku));
        let qty_text = cell(row, Some(cols.qty));
        let method = cell(row, cols.method);
        let tracking = cell(row, cols.tracking);
        let country = carry.fill(order_id, cell(row, cols.country));

        if sku.is_empty() {
            out.skipped.push(SkippedRow {
                row: row_num,
                reason: SkipReason::EmptySku,
            });
            continue;
        }
        if qty_text.is_empty() {
            out.skipped.push(SkippedRow {
                row: row_num,
                reason: SkipReason::EmptyQuantity,
            });
            continue;
        }

        let sku_code = mapping.lookup(sku, row_num)?;
        let quantity = qty_text
            .parse::<u64>()
            .map_err(|source| ConvertError::InvalidQuantity {
                row: row_num,
                value: qty_text.to_string(),
                source,
            })?;

        carry.remember(order_id, &country);

        out.lines.push(OrderLine {
            tracking: tracking.to_string(),
            logistics_channel: extract_channel(method),
            sku_code: sku_code.to_string(),
            quantity,
            customer_ref: order_id.to_string(),
            country,
            has_tracking: !tracking.is_empty(),
        });
    }

    Ok(out)
}
