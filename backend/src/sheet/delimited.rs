//! Delimited text (CSV, TSV, semicolon or pipe separated).
//!
//! Encoding and delimiter are auto-detected, so exports saved as UTF-8,
//! GBK or Windows-1252 all load the same way. Undecodable bytes are an
//! error, never silently replaced.

use encoding_rs::Encoding;

use crate::error::{SheetError, SheetResult};
use crate::models::Row;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Double-byte labels chardet reports for short GBK text.
const CJK_LOOKALIKES: &[&str] = &[
    "big5",
    "big5-hkscs",
    "euc-tw",
    "euc-kr",
    "cp949",
    "windows-949",
    "uhc",
    "euc-jp",
    "shift_jis",
    "sjis",
    "cp932",
    "windows-31j",
];

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    if bytes.starts_with(UTF8_BOM) || std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }
    let label = normalize_label(&chardet::detect(bytes).0);

    // Order exports come from Chinese platforms; prefer GB18030 when it decodes cleanly
    if CJK_LOOKALIKES.contains(&label.as_str()) {
        let (_, _, had_errors) = encoding_rs::GB18030.decode(bytes);
        if !had_errors {
            return "gb18030".to_string();
        }
    }
    label
}

/// Normalize charset names
fn normalize_label(charset: &str) -> String {
    match charset.trim().to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "gb2312" | "gbk" | "gb18030" | "hz-gb-2312" => "gb18030".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Fails with [`SheetError::Encoding`] for labels `encoding_rs` does not
/// know and for bytes that are invalid in the chosen encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> SheetResult<String> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let label = normalize_label(encoding);
    let codec = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| SheetError::Encoding(encoding.to_string()))?;
    decode_with(codec, bytes, encoding)
}

fn decode_with(codec: &'static Encoding, bytes: &[u8], label: &str) -> SheetResult<String> {
    let (text, _, had_errors) = codec.decode(bytes);
    if had_errors {
        return Err(SheetError::Encoding(label.to_string()));
    }
    Ok(text.into_owned())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded text into rows with an explicit delimiter.
///
/// Rows may have different widths; quoted cells keep embedded delimiters
/// and line breaks. Blank lines come back as empty rows, so the index of
/// a row is always its line in the file.
pub fn parse_rows(content: &str, delimiter: char) -> SheetResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut record = csv::StringRecord::new();
    // Line the next record starts on when no blank line intervenes
    let mut next_line: u64 = 1;

    while reader.read_record(&mut record)? {
        let line = record.position().map_or(next_line, |pos| pos.line());
        for _ in next_line..line {
            rows.push(Row::new());
        }

        let cells: Row = record.iter().map(str::to_string).collect();
        let embedded_breaks: u64 = cells.iter().map(|c| c.matches('\n').count() as u64).sum();
        next_line = line.max(next_line) + 1 + embedded_breaks;
        rows.push(cells);
    }
    Ok(rows)
}

/// Decode and parse delimited text, returning the encoding and delimiter used.
pub fn read_delimited(bytes: &[u8]) -> SheetResult<(Vec<Row>, String, char)> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let rows = parse_rows(&content, delimiter)?;
    Ok((rows, encoding, delimiter))
}

/// Render rows as UTF-8 comma-separated text.
///
/// The output starts with a byte-order mark so spreadsheet applications
/// pick the right encoding for non-ASCII headers.
pub fn write_csv(rows: &[Row]) -> SheetResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(UTF8_BOM.to_vec());
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| SheetError::Io(std::io::Error::other(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_rows() {
        let rows = parse_rows("a,b\n1,2\n3,4", ',').unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["a", "b"]);
        assert_eq!(rows[2], vec!["3", "4"]);
    }

    #[test]
    fn test_ragged_rows_kept() {
        let rows = parse_rows("a;b;c\n1\n1;2;3;4", ';').unwrap();

        assert_eq!(rows[1], vec!["1"]);
        assert_eq!(rows[2].len(), 4);
    }

    #[test]
    fn test_blank_lines_keep_their_row() {
        let rows = parse_rows("Order,SKU,Qty\n\nO1,X9,1\n\n\nO2,X1,2\n", ',').unwrap();

        assert_eq!(rows.len(), 6);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], vec!["O1", "X9", "1"]);
        assert!(rows[3].is_empty() && rows[4].is_empty());
        assert_eq!(rows[5], vec!["O2", "X1", "2"]);
    }

    #[test]
    fn test_blank_lines_with_crlf() {
        let rows = parse_rows("a,b\r\n\r\n1,2\r\n", ',').unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec!["1", "2"]);
    }

    #[test]
    fn test_multiline_cell_is_one_row() {
        let rows = parse_rows("a,b\n\"line one\nline two\",2\n3,4\n", ',').unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "line one\nline two");
        assert_eq!(rows[2], vec!["3", "4"]);
    }

    #[test]
    fn test_quoted_values_keep_delimiter() {
        let rows = parse_rows("name,method\n\"Doe, J\",\"Air-Express\"", ',').unwrap();

        assert_eq!(rows[1][0], "Doe, J");
        assert_eq!(rows[1][1], "Air-Express");
    }

    #[test]
    fn test_cells_are_not_trimmed() {
        let rows = parse_rows("a,b\n X1 ,2", ',').unwrap();
        assert_eq!(rows[1][0], " X1 ");
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_pipe() {
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_gb18030_decoding() {
        let (bytes, _, _) = encoding_rs::GB18030.encode("平台单号,SKU\nO1,X1");
        let text = decode_content(&bytes, "gb18030").unwrap();
        assert!(text.starts_with("平台单号"));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let err = decode_content(&[0xC4, 0xE3], "x-mac-klingon").unwrap_err();
        assert!(matches!(err, SheetError::Encoding(ref label) if label == "x-mac-klingon"));
    }

    #[test]
    fn test_invalid_bytes_are_an_error() {
        let err = decode_content(b"SKU\n\xFFX1", "utf-8").unwrap_err();
        assert!(matches!(err, SheetError::Encoding(_)));
    }

    #[test]
    fn test_cjk_lookalike_labels_resolve() {
        assert_eq!(normalize_label("GB2312"), "gb18030");
        assert_eq!(normalize_label(" UTF-8 "), "utf-8");
        assert!(Encoding::for_label(normalize_label("EUC-KR").as_bytes()).is_some());
        assert!(Encoding::for_label(normalize_label("SHIFT_JIS").as_bytes()).is_some());
    }

    #[test]
    fn test_read_gb18030_export() {
        let text = "平台单号,SKU,数量,物流方式,运单号,国家/地区\n\
                    A100,TS-BLK-M,1,云途-专线小包,YT1,法国\n\
                    A101,CAP-NVY,2,燕文-航空经济小包,YW2,德国\n\
                    A102,MUG-11OZ,3,云途-中美专线,YT3,美国\n\
                    A103,HD-GRY-L,1,邮政-国际小包平邮,EMS4,英国\n";
        let (bytes, _, _) = encoding_rs::GB18030.encode(text);

        let (rows, encoding, delimiter) = read_delimited(&bytes).unwrap();

        assert_eq!(encoding, "gb18030");
        assert_eq!(delimiter, ',');
        assert_eq!(rows[0][0], "平台单号");
        assert_eq!(rows[0][5], "国家/地区");
        assert_eq!(rows[1][3], "云途-专线小包");
        assert_eq!(rows[4][5], "英国");
    }

    #[test]
    fn test_write_then_read_back() {
        let rows: Vec<Row> = vec![
            vec!["运单号".into(), "备注".into()],
            vec!["TRK1".into(), "a, b".into()],
        ];
        let bytes = write_csv(&rows).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let (back, encoding, _) = read_delimited(&bytes).unwrap();
        assert_eq!(encoding, "utf-8");
        assert_eq!(back, rows);
    }
}
