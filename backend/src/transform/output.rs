//! Manifest row synthesis.
//!
//! Untracked lines are recorded for stock accounting only: they carry SKU
//! code, quantity and country, but none of the dispatch fields.

use crate::models::{
    OrderLine, OutputRow, Row, LOGISTICS_BRAND, ORDER_PLATFORM, OUTBOUND_TYPE,
};

impl OutputRow {
    /// Build the manifest row for one order line.
    pub fn from_line(line: &OrderLine) -> Self {
        let mut row = OutputRow {
            tracking: line.tracking.clone(),
            sku_code: line.sku_code.clone(),
            quantity: line.quantity,
            country: line.country.clone(),
            ..Default::default()
        };

        if line.has_tracking {
            row.outbound_type = OUTBOUND_TYPE.to_string();
            row.logistics_company = LOGISTICS_BRAND.to_string();
            row.logistics_channel = line.logistics_channel.clone();
            row.order_platform = ORDER_PLATFORM.to_string();
            row.customer_ref = line.customer_ref.clone();
        }
        row
    }

    /// Cells in output column order.
    pub fn to_cells(&self) -> Row {
        vec![
            self.outbound_type.clone(),
            self.tracking.clone(),
            self.logistics_company.clone(),
            self.logistics_channel.clone(),
            self.sku_code.clone(),
            self.quantity.to_string(),
            self.order_platform.clone(),
            self.customer_ref.clone(),
            self.other_ref.clone(),
            self.priority.clone(),
            self.remark.clone(),
            self.label_url.clone(),
            self.country.clone(),
        ]
    }
}

/// Build manifest rows for every line, keeping input order.
pub fn build_output_rows(lines: &[OrderLine]) -> Vec<OutputRow> {
    lines.iter().map(OutputRow::from_line).collect()
}
