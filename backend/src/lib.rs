//! # WHX - Order export to warehouse outbound manifest
//!
//! WHX converts a merchant order-export sheet into the outbound manifest
//! expected by the warehouse: SKUs are mapped to warehouse codes, the
//! logistics channel is derived from the shipping method, missing
//! countries are carried forward within an order, and dispatch fields are
//! only filled for lines that already have a tracking number.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Order sheet │────▶│   Columns   │────▶│    Rows     │────▶│  Manifest   │
//! │ (xlsx/CSV)  │     │ (by header) │     │ (SKU map)   │     │ (13 fields) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use whx::{generate_file, GenerateOptions};
//! use std::path::Path;
//!
//! let outcome = generate_file(Path::new("orders.csv"), &GenerateOptions::default()).unwrap();
//! println!("Created {} with {} rows", outcome.output_path.display(), outcome.count);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models and constants
//! - [`sheet`] - Workbook and delimited-text reading and writing
//! - [`mapping`] - SKU mapping table
//! - [`transform`] - Column resolution, row transformation, pipeline
//! - [`config`] - Runtime settings
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod error;
pub mod models;

// Sheet IO
pub mod sheet;

// Mapping
pub mod mapping;

// Transformation
pub mod transform;

// Settings
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ConvertError, PipelineError, ServerError, SheetError, StageError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ColumnIndexes, ColumnNames, Manifest, OrderLine, OutputRow, Row, SkipReason, SkippedRow,
    OUTPUT_HEADERS,
};

// =============================================================================
// Re-exports - Mapping
// =============================================================================

pub use mapping::{MappingSource, MappingTable};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    build_manifest, convert_bytes, generate, generate_file, output_file_name, preview_file,
    ConvertedUpload, GenerateOptions, GenerateOutcome, Preview,
};

pub use config::Settings;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
