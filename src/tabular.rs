//! Reads member tables from uploaded CSV and Excel files. A member table has a
//! header row naming (at least) the columns `member` and `items`, and one row
//! per member, with the member's items separated by commas in a single cell.
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Reader};
use serde::{Deserialize, Serialize};

use crate::engine::normalize;
use crate::error::{ListsetError, Result};

/// A member and the member's items, as exchanged with the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// The member's name
    pub name: String,
    /// The member's items
    #[serde(default)]
    pub items: Vec<String>,
}

/// The columns every member table must have
pub const REQUIRED_COLUMNS: [&str; 2] = ["member", "items"];

/// Served by `GET /sample-template` and `listset template`
pub const SAMPLE_TEMPLATE: &str = "\
member,items
Alice,\"milk, bread, eggs, apples\"
Bob,\"bread, cheese, apples, coffee\"
Carol,\"milk, cheese, bananas, tea\"
Dave,\"eggs, apples, coffee, rice\"
";

/// The two families of file we read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma-separated values
    Csv,
    /// `.xlsx` (and, for reading only, `.xls`)
    Excel,
}

impl Format {
    /// Picks the format from an uploaded file's extension, ignoring case
    pub fn from_filename(filename: &str) -> Result<Format> {
        let extension = Path::new(filename)
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Format::Csv),
            Some("xlsx" | "xls") => Ok(Format::Excel),
            _ => Err(ListsetError::UnsupportedFormat(filename.to_owned())),
        }
    }

    /// Picks the format from the `format` field of an export request
    pub fn from_export_name(name: &str) -> Result<Format> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "excel" | "xlsx" => Ok(Format::Excel),
            _ => Err(ListsetError::UnsupportedFormat(name.to_owned())),
        }
    }

    /// Extension of the files we write in this format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Excel => "xlsx",
        }
    }

    /// MIME type of the files we write in this format
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Csv => "text/csv; charset=utf-8",
            Format::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// Reads the member table in `contents`, choosing the parser by the extension
/// of `filename`. Member names and items are trimmed, rows with a blank
/// member or no items are skipped, and rows naming the same member are merged.
pub fn import(filename: &str, contents: &[u8]) -> Result<Vec<MemberRecord>> {
    let rows = match Format::from_filename(filename)? {
        Format::Csv => csv_rows(contents)?,
        Format::Excel => workbook_rows(contents)?,
    };
    records_from_rows(rows)
}

fn csv_rows(contents: &[u8]) -> Result<Vec<Vec<String>>> {
    let contents = decode_text(contents);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(&*contents);
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_owned).collect());
    }
    Ok(rows)
}

/// Spreadsheet programs like to save "CSV" as UTF-16, or as UTF-8 with a Byte
/// Order Mark. Translate anything with a BOM to plain UTF-8 and strip the BOM;
/// return anything without one unchanged.
fn decode_text(candidate: &[u8]) -> Cow<'_, [u8]> {
    match encoding_rs::Encoding::for_bom(candidate) {
        None => Cow::Borrowed(candidate),
        Some((encoding, _)) => {
            let (text, _had_malformed_sequences) = encoding.decode_with_bom_removal(candidate);
            Cow::Owned(text.into_owned().into_bytes())
        }
    }
}

/// Rows of the first worksheet, every cell rendered as text
fn workbook_rows(contents: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(contents))?;
    let Some(first_sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook.worksheet_range(&first_sheet)?;
    Ok(range.rows().map(|row| row.iter().map(ToString::to_string).collect()).collect())
}

fn records_from_rows(rows: Vec<Vec<String>>) -> Result<Vec<MemberRecord>> {
    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or_default();
    let column = |name: &str| header.iter().position(|h| h.trim().eq_ignore_ascii_case(name));

    let (member_column, items_column) = match (column("member"), column("items")) {
        (Some(member), Some(items)) => (member, items),
        (member, items) => {
            let missing = REQUIRED_COLUMNS
                .iter()
                .zip([member, items])
                .filter(|(_, found)| found.is_none())
                .map(|(name, _)| (*name).to_owned())
                .collect();
            return Err(ListsetError::MissingColumns(missing));
        }
    };

    let members = normalize(rows.map(|row| {
        let name = cell(&row, member_column).trim().to_owned();
        let items: Vec<String> = cell(&row, items_column).split(',').map(str::to_owned).collect();
        (name, items)
    }));
    if members.is_empty() {
        return Err(ListsetError::NoValidRows);
    }
    Ok(members
        .into_iter()
        .map(|(name, items)| MemberRecord { name, items: items.into_iter().collect() })
        .collect())
}

fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map_or("", String::as_str)
}
