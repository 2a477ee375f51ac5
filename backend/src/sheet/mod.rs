//! Sheet reading and writing.
//!
//! A sheet is read into plain rows of text cells and written back from
//! them. Two formats are supported:
//!
//! - [`SheetFormat::Workbook`] - xlsx and friends, first worksheet only
//! - [`SheetFormat::Delimited`] - CSV-like text with detected encoding and delimiter
//!
//! The format is chosen from the file extension, falling back to the
//! leading bytes when the name says nothing. Nothing here knows about
//! manifests.

pub mod delimited;
pub mod workbook;

use std::fmt;
use std::path::Path;

use crate::error::SheetResult;
use crate::models::Row;

pub use delimited::{decode_content, detect_delimiter, detect_encoding, parse_rows, write_csv};
pub use workbook::{read_workbook, write_xlsx};

/// Zip container (xlsx, xlsm, xlsb, ods)
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// OLE compound document (legacy xls)
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// On-disk format of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Delimited,
    Workbook,
}

impl SheetFormat {
    /// Format named by a file extension, if it names one.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            "csv" | "tsv" | "txt" => Some(Self::Delimited),
            _ => None,
        }
    }

    /// Format suggested by the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            Self::Workbook
        } else {
            Self::Delimited
        }
    }

    /// Extension first, content second.
    pub fn detect(name: &str, bytes: &[u8]) -> Self {
        Self::from_name(name).unwrap_or_else(|| Self::sniff(bytes))
    }

    /// Extension of files written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Delimited => "csv",
            Self::Workbook => "xlsx",
        }
    }

    /// MIME type of files written in this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Delimited => "text/csv; charset=utf-8",
            Self::Workbook => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// How a sheet was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSource {
    Delimited { encoding: String, delimiter: char },
    Workbook { sheet_name: Option<String> },
}

impl fmt::Display for SheetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delimited {
                encoding,
                delimiter,
            } => write!(f, "encoding {}, delimiter {:?}", encoding, delimiter),
            Self::Workbook {
                sheet_name: Some(name),
            } => write!(f, "workbook sheet {:?}", name),
            Self::Workbook { sheet_name: None } => write!(f, "workbook without sheets"),
        }
    }
}

/// A parsed sheet with the settings that were used to read it.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// All rows, header included, cells untrimmed. Index `i` is sheet row `i + 1`.
    pub rows: Vec<Row>,
    pub source: SheetSource,
}

impl Sheet {
    pub fn format(&self) -> SheetFormat {
        match self.source {
            SheetSource::Delimited { .. } => SheetFormat::Delimited,
            SheetSource::Workbook { .. } => SheetFormat::Workbook,
        }
    }
}

/// Parse sheet bytes; `name` is only used to pick the format.
pub fn read_bytes(bytes: &[u8], name: &str) -> SheetResult<Sheet> {
    match SheetFormat::detect(name, bytes) {
        SheetFormat::Workbook => {
            let (sheet_name, rows) = read_workbook(bytes)?;
            Ok(Sheet {
                rows,
                source: SheetSource::Workbook { sheet_name },
            })
        }
        SheetFormat::Delimited => {
            let (rows, encoding, delimiter) = delimited::read_delimited(bytes)?;
            Ok(Sheet {
                rows,
                source: SheetSource::Delimited {
                    encoding,
                    delimiter,
                },
            })
        }
    }
}

/// Read a sheet file, choosing the format from its extension.
pub fn read_path<P: AsRef<Path>>(path: P) -> SheetResult<Sheet> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    read_bytes(&bytes, &path.to_string_lossy())
}

/// Render rows in `format`. `numeric_columns` only matters for workbooks.
pub fn write_sheet(rows: &[Row], format: SheetFormat, numeric_columns: &[usize]) -> SheetResult<Vec<u8>> {
    match format {
        SheetFormat::Delimited => write_csv(rows),
        SheetFormat::Workbook => write_xlsx(rows, numeric_columns),
    }
}
