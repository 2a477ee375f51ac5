//! High-level pipeline API: order export in, outbound manifest out.
//!
//! Stages run strictly in sequence and each one finishes before the next
//! starts:
//!
//! ```text
//! load mapping → resolve columns → transform rows → build output rows → write
//! └─ "load mapping" ─┘ └──────────── "prepare rows" ───────────┘   └ "write workbook" ┘
//! ```
//!
//! Nothing is written unless every data row validated. A failure is
//! returned wrapped in the label of the stage it came from.
//!
//! # Example
//!
//! ```rust,ignore
//! use whx::transform::pipeline::{generate_file, GenerateOptions};
//! use std::path::Path;
//!
//! let outcome = generate_file(Path::new("orders.csv"), &GenerateOptions::default())?;
//! println!("Created {} with {} rows", outcome.output_path.display(), outcome.count);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::columns::resolve_columns;
use super::output::build_output_rows;
use super::rows::transform_rows;
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning, log_warning_indent};
use crate::error::{PipelineError, PipelineResult, SheetError};
use crate::mapping::{MappingSource, MappingTable};
use crate::models::{ColumnNames, Manifest, Row, SkippedRow, OUTPUT_PREFIX, QUANTITY_COLUMN};
use crate::sheet::{self, SheetFormat};

/// Options for a conversion run
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Where the SKU mapping table is read from
    pub mapping: MappingSource,
    /// Header texts of the input columns
    pub columns: ColumnNames,
    /// Explicit output path; defaults to `Warehouse_<stem>.<ext>` next to the input
    pub output: Option<PathBuf>,
}

/// Result of converting a file on disk
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    /// Absolute path of the written manifest, when it can be resolved
    pub output_path: PathBuf,
    /// Number of manifest data rows
    pub count: usize,
    /// Rows excluded without error
    pub skipped: Vec<SkippedRow>,
}

/// Result of converting an uploaded sheet in memory
#[derive(Debug, Clone)]
pub struct ConvertedUpload {
    /// Download name of the manifest
    pub file_name: String,
    /// Rendered manifest sheet
    pub bytes: Vec<u8>,
    /// Format of `bytes`, the same family as the upload
    pub format: SheetFormat,
    pub manifest: Manifest,
}

/// Manifest contents for on-screen display
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Preview {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Preview {
    /// Split rendered rows into header and data, padding or cutting every
    /// data row to the header width.
    pub fn from_rows(rows: &[Row]) -> Self {
        let Some((header, data)) = rows.split_first() else {
            return Self {
                headers: Vec::new(),
                rows: Vec::new(),
            };
        };
        let width = header.len();
        let rows = data
            .iter()
            .map(|row| {
                let mut record = row.clone();
                record.resize(width, String::new());
                record
            })
            .collect();

        Self {
            headers: header.clone(),
            rows,
        }
    }

    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self::from_rows(&manifest.to_rows())
    }
}

/// Convert order-export rows using reference rows for the SKU mapping.
///
/// This is the pure core: no files are touched.
pub fn generate(input: &[Row], reference: &[Row], columns: &ColumnNames) -> PipelineResult<Manifest> {
    let mapping = MappingTable::from_rows(reference).map_err(PipelineError::load_mapping)?;
    build_manifest(input, &mapping, columns)
}

/// Resolve columns, validate rows and build the manifest rows.
pub fn build_manifest(
    input: &[Row],
    mapping: &MappingTable,
    columns: &ColumnNames,
) -> PipelineResult<Manifest> {
    log_info("Resolving columns...");
    let cols = resolve_columns(input, columns).map_err(PipelineError::prepare_rows)?;
    log_success(format!(
        "Columns found: order #{}, SKU #{}, quantity #{}",
        cols.order + 1,
        cols.sku + 1,
        cols.qty + 1
    ));
    for (name, idx) in [
        (&columns.method, cols.method),
        (&columns.tracking, cols.tracking),
        (&columns.country, cols.country),
    ] {
        if idx.is_none() {
            log_warning_indent(format!("Optional column \"{}\" not found", name), 1);
        }
    }

    log_info(format!(
        "Transforming {} data rows...",
        input.len().saturating_sub(1)
    ));
    let transformed = transform_rows(input, &cols, mapping).map_err(PipelineError::prepare_rows)?;
    report_skipped(&transformed.skipped);

    let rows = build_output_rows(&transformed.lines);
    log_success(format!("{} manifest rows ready", rows.len()));

    Ok(Manifest {
        rows,
        skipped: transformed.skipped,
    })
}

/// Summarise skipped rows by reason
fn report_skipped(skipped: &[SkippedRow]) {
    if skipped.is_empty() {
        return;
    }
    log_warning(format!("{} rows skipped", skipped.len()));

    let mut by_reason: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for skip in skipped {
        by_reason.entry(skip.reason.as_str()).or_default().push(skip.row);
    }
    for (reason, rows) in by_reason {
        let sample: Vec<String> = rows.iter().take(5).map(|r| r.to_string()).collect();
        let more = if rows.len() > 5 {
            format!(" ... +{}", rows.len() - 5)
        } else {
            String::new()
        };
        log_info_indent(format!("{} (rows: {}{})", reason, sample.join(", "), more), 1);
    }
}

/// Manifest file name for an input file name: `Warehouse_<stem>.<ext>`.
///
/// The extension is that of `format`, so `orders.xlsx` becomes
/// `Warehouse_orders.xlsx` and `orders.csv` becomes `Warehouse_orders.csv`.
pub fn output_file_name(input_name: &str, format: SheetFormat) -> String {
    let base = Path::new(input_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = Path::new(&base)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string());
    format!("{}{}.{}", OUTPUT_PREFIX, stem, format.extension())
}

/// Render the manifest; workbooks store quantities as numbers.
fn render_manifest(manifest: &Manifest, format: SheetFormat) -> PipelineResult<Vec<u8>> {
    sheet::write_sheet(&manifest.to_rows(), format, &[QUANTITY_COLUMN])
        .map_err(PipelineError::write_workbook)
}

/// Convert an order export on disk and write the manifest next to it.
///
/// The manifest is rendered completely in memory before the output file is
/// created, so a failed run leaves no file behind.
pub fn generate_file(input: &Path, options: &GenerateOptions) -> PipelineResult<GenerateOutcome> {
    if input.as_os_str().is_empty() {
        return Err(PipelineError::MissingInput);
    }

    log_info(format!("Loading SKU mapping ({})...", options.mapping.describe()));
    let mapping = options.mapping.load()?;
    log_success(format!("{} SKUs mapped", mapping.len()));

    log_info(format!("Reading {}...", input.display()));
    let sheet = sheet::read_path(input).map_err(PipelineError::prepare_rows)?;
    log_success(format!("Read {} rows ({})", sheet.rows.len(), sheet.source));

    let manifest = build_manifest(&sheet.rows, &mapping, &options.columns)?;

    let (output_path, format) = match &options.output {
        Some(path) => {
            let format = SheetFormat::from_name(&path.to_string_lossy()).unwrap_or(sheet.format());
            (path.clone(), format)
        }
        None => {
            let format = sheet.format();
            let name = output_file_name(&input.to_string_lossy(), format);
            (input.parent().unwrap_or_else(|| Path::new("")).join(name), format)
        }
    };
    let bytes = render_manifest(&manifest, format)?;

    std::fs::write(&output_path, bytes)
        .map_err(|e| PipelineError::write_workbook(SheetError::from(e)))?;
    let output_path = std::fs::canonicalize(&output_path).unwrap_or(output_path);
    log_success(format!("Written to {}", output_path.display()));

    Ok(GenerateOutcome {
        output_path,
        count: manifest.len(),
        skipped: manifest.skipped,
    })
}

/// Convert an order export on disk without writing anything.
pub fn preview_file(input: &Path, options: &GenerateOptions) -> PipelineResult<Preview> {
    if input.as_os_str().is_empty() {
        return Err(PipelineError::MissingInput);
    }
    let mapping = options.mapping.load()?;
    let sheet = sheet::read_path(input).map_err(PipelineError::prepare_rows)?;
    let manifest = build_manifest(&sheet.rows, &mapping, &options.columns)?;
    Ok(Preview::from_manifest(&manifest))
}

/// Convert an uploaded order export entirely in memory.
///
/// Each call loads its own mapping table; nothing is shared between calls.
pub fn convert_bytes(
    bytes: &[u8],
    file_name: &str,
    options: &GenerateOptions,
) -> PipelineResult<ConvertedUpload> {
    log_info(format!("Loading SKU mapping ({})...", options.mapping.describe()));
    let mapping = options.mapping.load()?;
    log_success(format!("{} SKUs mapped", mapping.len()));

    let sheet = sheet::read_bytes(bytes, file_name).map_err(PipelineError::prepare_rows)?;
    log_success(format!("Read {} rows ({})", sheet.rows.len(), sheet.source));

    let manifest = build_manifest(&sheet.rows, &mapping, &options.columns)?;
    let format = sheet.format();
    let bytes = render_manifest(&manifest, format)?;

    Ok(ConvertedUpload {
        file_name: output_file_name(file_name, format),
        bytes,
        format,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    fn table(data: &[&[&str]]) -> Vec<Row> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn english() -> ColumnNames {
        ColumnNames {
            order: "Order".into(),
            sku: "SKU".into(),
            qty: "Qty".into(),
            method: "Method".into(),
            tracking: "Tracking".into(),
            country: "Country".into(),
        }
    }

    fn reference() -> Vec<Row> {
        table(&[&["SKU", "Code"], &["X1", "C100"]])
    }

    const HEADER: &[&str] = &["Order", "SKU", "Qty", "Method", "Tracking", "Country"];

    #[test]
    fn test_round_trip_scenario() {
        let input = table(&[
            HEADER,
            &["O1", "X1", "3", "Air-Express", "TRK1", "US"],
            &["O1", "X1", "2", "Air-Express", "", ""],
        ]);

        let manifest = generate(&input, &reference(), &english()).unwrap();
        let rows = manifest.to_rows();

        assert_eq!(manifest.len(), 2);
        assert_eq!(
            rows[1],
            vec![
                "销售出库", "TRK1", "First Logistics", "Express", "C100", "3", "SHOPIFY", "O1", "",
                "", "", "", "US",
            ]
        );
        assert_eq!(
            rows[2],
            vec!["", "", "", "", "C100", "2", "", "", "", "", "", "", "US"]
        );
    }

    #[test]
    fn test_unknown_sku_fails_in_prepare_rows() {
        let input = table(&[
            HEADER,
            &["O1", "X1", "3", "Air-Express", "TRK1", "US"],
            &["O2", "X9", "1", "Ground", "TRK2", "DE"],
        ]);

        let err = generate(&input, &reference(), &english()).unwrap_err();
        assert_eq!(err.stage(), Some("prepare rows"));
        match err.convert_error() {
            Some(ConvertError::UnknownSku { row, sku }) => {
                assert_eq!(*row, 3);
                assert_eq!(sku, "X9");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_quantity_fails() {
        let input = table(&[HEADER, &["O1", "X1", "abc", "", "", ""]]);

        let err = generate(&input, &reference(), &english()).unwrap_err();
        assert!(err.to_string().contains("\"abc\""));
        assert!(matches!(
            err.convert_error(),
            Some(ConvertError::InvalidQuantity { row: 2, .. })
        ));
    }

    #[test]
    fn test_empty_reference_fails_in_load_mapping() {
        let input = table(&[HEADER]);
        let err = generate(&input, &table(&[&["SKU", "Code"]]), &english()).unwrap_err();

        assert_eq!(err.stage(), Some("load mapping"));
        assert!(matches!(err.convert_error(), Some(ConvertError::EmptyMapping(_))));
    }

    #[test]
    fn test_missing_column_fails_before_rows() {
        let input = table(&[&["Order", "Qty"], &["O1", "1"]]);
        let err = generate(&input, &reference(), &english()).unwrap_err();

        assert!(matches!(
            err.convert_error(),
            Some(ConvertError::MissingRequiredColumn { .. })
        ));
    }

    #[test]
    fn test_header_only_input_gives_empty_manifest() {
        let manifest = generate(&table(&[HEADER]), &reference(), &english()).unwrap();
        assert!(manifest.is_empty());
        assert_eq!(manifest.to_rows().len(), 1);
    }

    #[test]
    fn test_skipped_rows_are_reported() {
        let input = table(&[HEADER, &["O1", "", "1"], &["O1", "X1", "1"], &["O1", "X1", ""]]);
        let manifest = generate(&input, &reference(), &english()).unwrap();

        assert_eq!(manifest.len(), 1);
        let skipped: Vec<usize> = manifest.skipped.iter().map(|s| s.row).collect();
        assert_eq!(skipped, vec![2, 4]);
    }

    #[test]
    fn test_output_file_name() {
        let csv = SheetFormat::Delimited;
        let xlsx = SheetFormat::Workbook;

        assert_eq!(output_file_name("orders.csv", csv), "Warehouse_orders.csv");
        assert_eq!(output_file_name("orders.xlsx", xlsx), "Warehouse_orders.xlsx");
        assert_eq!(output_file_name("old.xls", xlsx), "Warehouse_old.xlsx");
        assert_eq!(output_file_name("/tmp/in/May export.tsv", csv), "Warehouse_May export.csv");
        assert_eq!(output_file_name("orders", csv), "Warehouse_orders.csv");
        assert_eq!(output_file_name("", xlsx), "Warehouse_manifest.xlsx");
    }

    #[test]
    fn test_preview_pads_rows() {
        let preview = Preview::from_rows(&table(&[&["a", "b", "c"], &["1"], &["1", "2", "3", "4"]]));

        assert_eq!(preview.headers, vec!["a", "b", "c"]);
        assert_eq!(preview.rows[0], vec!["1", "", ""]);
        assert_eq!(preview.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_generate_file_writes_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let map_path = dir.path().join("map.csv");
        std::fs::write(&map_path, "SKU,Code\nX1,C100\n").unwrap();
        let input_path = dir.path().join("orders.csv");
        std::fs::write(
            &input_path,
            "Order,SKU,Qty,Method,Tracking,Country\nO1,X1,3,Air-Express,TRK1,US\nO1,X1,2,Air-Express,,\n",
        )
        .unwrap();

        let options = GenerateOptions {
            mapping: MappingSource::File(map_path.to_string_lossy().into_owned()),
            columns: english(),
            output: None,
        };
        let outcome = generate_file(&input_path, &options).unwrap();

        assert_eq!(outcome.count, 2);
        assert!(outcome.output_path.is_absolute());
        assert_eq!(
            outcome.output_path.file_name().unwrap().to_string_lossy(),
            "Warehouse_orders.csv"
        );

        let written = sheet::read_path(&outcome.output_path).unwrap();
        assert_eq!(written.rows.len(), 3);
        assert_eq!(written.rows[0][0], "出库类型");
        assert_eq!(written.rows[2][12], "US");
    }

    #[test]
    fn test_failed_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let map_path = dir.path().join("map.csv");
        std::fs::write(&map_path, "SKU,Code\nX1,C100\n").unwrap();
        let input_path = dir.path().join("orders.csv");
        std::fs::write(
            &input_path,
            "Order,SKU,Qty,Method,Tracking,Country\nO1,X1,3,Air-Express,TRK1,US\nO2,X9,1,Ground,TRK2,DE\n",
        )
        .unwrap();

        let options = GenerateOptions {
            mapping: MappingSource::File(map_path.to_string_lossy().into_owned()),
            columns: english(),
            output: None,
        };
        let err = generate_file(&input_path, &options).unwrap_err();

        assert!(matches!(err.convert_error(), Some(ConvertError::UnknownSku { .. })));
        assert!(!dir.path().join("Warehouse_orders.csv").exists());
    }

    #[test]
    fn test_preview_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("orders.csv");
        std::fs::write(&input_path, "平台单号,SKU,数量\nA1,CAP-NVY,4\n").unwrap();

        let preview = preview_file(&input_path, &GenerateOptions::default()).unwrap();

        assert_eq!(preview.headers.len(), 13);
        assert_eq!(preview.rows[0][4], "FL-300118");
        assert_eq!(preview.rows[0][5], "4");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_empty_input_path() {
        let err = generate_file(Path::new(""), &GenerateOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput));
    }

    #[test]
    fn test_convert_bytes_in_memory() {
        let upload = "平台单号,SKU,数量,物流方式,运单号,国家/地区\nA100,TS-BLK-M,1,云途-专线,YT1,FR\n";

        let converted = convert_bytes(upload.as_bytes(), "may.csv", &GenerateOptions::default()).unwrap();

        assert_eq!(converted.file_name, "Warehouse_may.csv");
        assert_eq!(converted.format, SheetFormat::Delimited);
        assert_eq!(converted.manifest.rows[0].sku_code, "FL-100232");
        assert_eq!(converted.manifest.rows[0].logistics_channel, "专线");

        let back = sheet::read_bytes(&converted.bytes, &converted.file_name).unwrap();
        assert_eq!(back.rows.len(), 2);
        assert_eq!(back.rows[1][4], "FL-100232");
    }

    #[test]
    fn test_blank_line_keeps_row_numbers() {
        let upload = "平台单号,SKU,数量\nA1,CAP-NVY,1\n\nA2,NOPE,1\n";

        let err = convert_bytes(upload.as_bytes(), "may.csv", &GenerateOptions::default()).unwrap_err();

        match err.convert_error() {
            Some(ConvertError::UnknownSku { row, sku }) => {
                assert_eq!(*row, 4);
                assert_eq!(sku, "NOPE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_line_keeps_skipped_row_numbers() {
        let upload = "平台单号,SKU,数量\n\nA1,,1\nA2,CAP-NVY,1\n";

        let converted = convert_bytes(upload.as_bytes(), "may.csv", &GenerateOptions::default()).unwrap();

        assert_eq!(converted.manifest.len(), 1);
        assert_eq!(converted.manifest.skipped[0].row, 3);
    }

    #[test]
    fn test_workbook_upload_gives_workbook() {
        let input = table(&[
            &["平台单号", "SKU", "数量", "物流方式", "运单号", "国家/地区"],
            &["A100", "TS-BLK-M", "2", "云途-专线", "YT1", "FR"],
        ]);
        let upload = sheet::write_xlsx(&input, &[2]).unwrap();

        let converted = convert_bytes(&upload, "may.xlsx", &GenerateOptions::default()).unwrap();

        assert_eq!(converted.file_name, "Warehouse_may.xlsx");
        assert_eq!(converted.format, SheetFormat::Workbook);

        let (_, back) = sheet::read_workbook(&converted.bytes).unwrap();
        assert_eq!(back[0][5], "数量");
        assert_eq!(back[1][4], "FL-100232");
        assert_eq!(back[1][5], "2");
        assert_eq!(back[1][12], "FR");
    }

    #[test]
    fn test_generate_file_from_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("orders.xlsx");
        let input = table(&[
            HEADER,
            &["O1", "X1", "3", "Air-Express", "TRK1", "US"],
            &[],
            &["O1", "X1", "2", "Air-Express", "", ""],
        ]);
        std::fs::write(&input_path, sheet::write_xlsx(&input, &[]).unwrap()).unwrap();
        let map_path = dir.path().join("map.xlsx");
        std::fs::write(&map_path, sheet::write_xlsx(&reference(), &[]).unwrap()).unwrap();

        let options = GenerateOptions {
            mapping: MappingSource::File(map_path.to_string_lossy().into_owned()),
            columns: english(),
            output: None,
        };
        let outcome = generate_file(&input_path, &options).unwrap();

        assert_eq!(outcome.count, 2);
        assert_eq!(
            outcome.output_path.file_name().unwrap().to_string_lossy(),
            "Warehouse_orders.xlsx"
        );
        let written = sheet::read_path(&outcome.output_path).unwrap();
        assert_eq!(written.format(), SheetFormat::Workbook);
        assert_eq!(written.rows[2][5], "2");
        assert_eq!(written.rows[2][12], "US");
    }

    #[test]
    fn test_explicit_output_extension_picks_format() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("orders.csv");
        std::fs::write(&input_path, "平台单号,SKU,数量\nA1,CAP-NVY,4\n").unwrap();
        let output = dir.path().join("out.xlsx");

        let options = GenerateOptions {
            output: Some(output.clone()),
            ..GenerateOptions::default()
        };
        generate_file(&input_path, &options).unwrap();

        let written = sheet::read_path(&output).unwrap();
        assert_eq!(written.format(), SheetFormat::Workbook);
        assert_eq!(written.rows[1][4], "FL-300118");
    }
}
