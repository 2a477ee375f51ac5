//! Transformation module.
//!
//! This module turns order-export rows into manifest rows:
//! - Columns: header-based column resolution
//! - Rows: per-row validation, SKU mapping, country carry-forward
//! - Channel: logistics channel derivation
//! - Output: manifest row synthesis
//! - Pipeline: stage orchestration and file/upload entry points

pub mod channel;
pub mod columns;
pub mod output;
pub mod pipeline;
pub mod rows;

pub use channel::extract_channel;
pub use columns::{find_column, resolve_columns};
pub use output::build_output_rows;
pub use pipeline::*;
pub use rows::{transform_rows, TransformedRows};
