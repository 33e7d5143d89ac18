//! Table reader for summary sheets.
//!
//! Turns the bytes of a workbook (`.xlsx`, `.xls`, `.ods`) or of an
//! exported delimited-text sheet into a header row plus data rows.
//! Workbooks are recognised by their magic bytes; everything else goes
//! through encoding and delimiter auto-detection. Nothing BCA-specific
//! happens here beyond the name of the sheet to read.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

use crate::error::{ExtractError, ExtractResult};

/// Worksheet holding the summary in a BCA workbook.
pub const SUMMARY_SHEET: &str = "Summary";

/// ZIP container (`.xlsx`, `.ods`)
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// OLE compound document (`.xls`)
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// A decoded table with metadata
#[derive(Debug, Clone)]
pub struct Table {
    /// Column headers, trimmed
    pub headers: Vec<String>,
    /// Data rows; each row has at most `headers.len()` cells
    pub rows: Vec<Vec<String>>,
    /// Where the table came from
    pub source: TableSource,
}

/// Origin of a [`Table`]
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// Delimited text with the detected encoding and delimiter
    Delimited { encoding: String, delimiter: char },
    /// A worksheet of a spreadsheet workbook
    Workbook { sheet: String },
}

impl Table {
    /// Position of a header, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Cell at `row`/`col`, empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> ExtractResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(e) => {
                // Detection said UTF-8 but the bytes disagree; Windows-1252
                // is what spreadsheet exports fall back to.
                let (s, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
                if had_errors {
                    return Err(ExtractError::Encoding(e.to_string()));
                }
                s.into_owned()
            }
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
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

/// Parse a decoded table with an explicit delimiter.
///
/// Quoted fields are honoured, so `"1,234.50"` stays one cell even in a
/// comma-separated file. Blank rows are dropped.
///
/// # Example
/// ```ignore
/// use bca_matrix::parser::parse_table;
///
/// let table = parse_table("Metric;Brakes Cumulative\nSales;100", ';').unwrap();
/// assert_eq!(table.headers, vec!["Metric", "Brakes Cumulative"]);
/// assert_eq!(table.rows[0][1], "100");
/// ```
pub fn parse_table(content: &str, delimiter: char) -> ExtractResult<Table> {
    parse_table_with_encoding(content, delimiter, "utf-8".to_string())
}

fn parse_table_with_encoding(
    content: &str,
    delimiter: char,
    encoding: String,
) -> ExtractResult<Table> {
    if content.trim().is_empty() {
        return Err(ExtractError::EmptyTable);
    }

    let delimiter_byte = u8::try_from(delimiter)
        .map_err(|_| ExtractError::Parse(format!("Unsupported delimiter '{}'", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ExtractError::EmptyTable);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(
            record
                .iter()
                .take(headers.len())
                .map(str::to_string)
                .collect(),
        );
    }

    Ok(Table {
        headers,
        rows,
        source: TableSource::Delimited { encoding, delimiter },
    })
}

/// Whether `bytes` start like a spreadsheet workbook.
pub fn is_workbook(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC)
}

/// Read the [`SUMMARY_SHEET`] worksheet of a workbook.
///
/// The sheet name is matched case-insensitively. The first row of the
/// used range is the header row.
pub fn parse_workbook(bytes: &[u8]) -> ExtractResult<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ExtractError::Workbook(e.to_string()))?;

    let sheet = workbook
        .sheet_names()
        .into_iter()
        .find(|name| name.trim().eq_ignore_ascii_case(SUMMARY_SHEET))
        .ok_or_else(|| ExtractError::MissingSheet(SUMMARY_SHEET.to_string()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ExtractError::Workbook(e.to_string()))?;

    let mut lines = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());

    let headers = lines.next().ok_or(ExtractError::EmptyTable)?;
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ExtractError::EmptyTable);
    }

    let rows = lines
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|mut row| {
            row.truncate(headers.len());
            row
        })
        .collect();

    Ok(Table {
        headers,
        rows,
        source: TableSource::Workbook { sheet },
    })
}

/// Text of a worksheet cell as it would appear in a CSV export.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// Parse table bytes: workbooks by sheet, text with auto-detection of
/// encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> ExtractResult<Table> {
    if is_workbook(bytes) {
        return parse_workbook(bytes);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_table_with_encoding(&content, delimiter, encoding)
}

/// Parse a table file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> ExtractResult<Table> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}
