//! Spreadsheet workbooks (xlsx, xlsm, xlsb, xls, ods).
//!
//! Only the first worksheet is read. Rows keep their sheet position:
//! leading blank rows and columns are padded back in front of the used
//! range, so row `i` is always sheet row `i + 1`.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{ColNum, RowNum, Workbook, XlsxError};

use crate::error::SheetResult;
use crate::models::Row;

/// Read the first worksheet of a workbook as text cells.
///
/// Returns the sheet name alongside the rows; a workbook without sheets
/// yields no name and no rows.
pub fn read_workbook(bytes: &[u8]) -> SheetResult<(Option<String>, Vec<Row>)> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let Some(name) = workbook.sheet_names().first().cloned() else {
        return Ok((None, Vec::new()));
    };
    let range = workbook.worksheet_range(&name)?;

    let (top, left) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Row> = (0..top).map(|_| Row::new()).collect();
    for cells in range.rows() {
        let mut row = vec![String::new(); left as usize];
        row.extend(cells.iter().map(cell_text));
        rows.push(row);
    }

    Ok((Some(name), rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render rows as a single-sheet xlsx workbook.
///
/// Cells in `numeric_columns` are written as numbers when they parse as
/// one; the header row and every other cell are written as text. Empty
/// cells are left blank.
pub fn write_xlsx(rows: &[Row], numeric_columns: &[usize]) -> SheetResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        let row_num = RowNum::try_from(r).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (c, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let col_num = ColNum::try_from(c).map_err(|_| XlsxError::RowColumnLimitError)?;
            let number = if r > 0 && numeric_columns.contains(&c) {
                cell.parse::<f64>().ok()
            } else {
                None
            };
            match number {
                Some(n) => worksheet.write_number(row_num, col_num, n)?,
                None => worksheet.write_string(row_num, col_num, cell)?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}
