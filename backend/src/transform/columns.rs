//! Header-based column resolution.
//!
//! Order exports do not agree on column order, so every column is located
//! by its header text. Matching is exact after trimming the header cell.

use crate::error::{ConvertError, ConvertResult};
use crate::models::{ColumnIndexes, ColumnNames, Row};

/// Index of the first header cell whose trimmed text equals `name`.
pub fn find_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|cell| cell.trim() == name)
}

/// Resolve column positions from the first row of `rows`.
///
/// Fails with [`ConvertError::MissingRequiredColumn`] when there is no
/// header at all or when the order, SKU or quantity column is absent.
pub fn resolve_columns(rows: &[Row], names: &ColumnNames) -> ConvertResult<ColumnIndexes> {
    let Some(header) = rows.first() else {
        return Err(ConvertError::MissingRequiredColumn {
            missing: vec![names.order.clone(), names.sku.clone(), names.qty.clone()],
        });
    };

    let order = find_column(header, &names.order);
    let sku = find_column(header, &names.sku);
    let qty = find_column(header, &names.qty);

    match (order, sku, qty) {
        (Some(order), Some(sku), Some(qty)) => Ok(ColumnIndexes {
            order,
            sku,
            qty,
            method: find_column(header, &names.method),
            tracking: find_column(header, &names.tracking),
            country: find_column(header, &names.country),
        }),
        _ => {
            let missing = [(order, &names.order), (sku, &names.sku), (qty, &names.qty)]
                .into_iter()
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, name)| name.clone())
                .collect();
            Err(ConvertError::MissingRequiredColumn { missing })
        }
    }
}
