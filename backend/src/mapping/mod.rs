//! SKU mapping table.
//!
//! Maps merchant SKUs to warehouse SKU codes. A table is built once per
//! conversion run from a reference sheet and is read-only afterwards.
//!
//! The reference sheet has a header row followed by `sku, code` rows:
//!
//! ```text
//! SKU,SKU编码
//! TS-BLK-S,FL-100231
//! TS-BLK-M,FL-100232
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ConvertError, ConvertResult, PipelineError, PipelineResult};
use crate::models::Row;
use crate::sheet;

/// Reference table compiled into the binary, used when no mapping file is configured.
const EMBEDDED_MAP: &[u8] = include_bytes!("../../data/map.csv");

/// Where the reference table comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MappingSource {
    /// The table shipped inside the binary.
    #[default]
    Embedded,
    /// A sheet on disk.
    File(String),
}

impl MappingSource {
    /// Read and parse the reference table.
    ///
    /// Read failures and empty tables are both reported as `load mapping`
    /// failures.
    pub fn load(&self) -> PipelineResult<MappingTable> {
        let sheet = match self {
            Self::Embedded => sheet::read_bytes(EMBEDDED_MAP, "map.csv"),
            Self::File(path) => sheet::read_path(Path::new(path)),
        }
        .map_err(PipelineError::load_mapping)?;

        MappingTable::from_rows(&sheet.rows).map_err(PipelineError::load_mapping)
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Embedded => "embedded map".to_string(),
            Self::File(path) => path.clone(),
        }
    }
}

/// Immutable lookup from SKU to warehouse SKU code.
#[derive(Debug, Clone)]
pub struct MappingTable {
    codes: HashMap<String, String>,
}

impl MappingTable {
    /// Build the table from reference rows.
    ///
    /// Row 0 is the header. Rows with fewer than two cells, or whose
    /// trimmed SKU or code is empty, are ignored. A repeated SKU keeps its
    /// last code.
    pub fn from_rows(rows: &[Row]) -> ConvertResult<Self> {
        if rows.is_empty() {
            return Err(ConvertError::EmptyMapping("reference sheet has no rows".into()));
        }

        let mut codes = HashMap::with_capacity(rows.len());
        for row in rows.iter().skip(1) {
            if row.len() < 2 {
                continue;
            }
            let sku = row[0].trim();
            let code = row[1].trim();
            if sku.is_empty() || code.is_empty() {
                continue;
            }
            codes.insert(sku.to_string(), code.to_string());
        }

        if codes.is_empty() {
            return Err(ConvertError::EmptyMapping(
                "reference sheet has no sku/code pairs".into(),
            ));
        }
        Ok(Self { codes })
    }

    /// Code for `sku`, if mapped.
    pub fn get(&self, sku: &str) -> Option<&str> {
        self.codes.get(sku).map(String::as_str)
    }

    /// Code for `sku`; an unmapped SKU at 1-based `row` aborts the run.
    pub fn lookup(&self, sku: &str, row: usize) -> ConvertResult<&str> {
        self.get(sku).ok_or_else(|| ConvertError::UnknownSku {
            row,
            sku: sku.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
