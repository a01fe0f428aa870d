//! Writes members and their comparison out as a downloadable CSV or Excel file.
//!
//! Either way the file has three parts: the members, the comparison results,
//! and a few facts about the export itself. In a CSV file they're sections one
//! after the other, each with a title row; in an Excel file they're sheets.
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format as CellFormat, Workbook};
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::{compare, normalize, Comparison, MemberSets};
use crate::error::{ListsetError, Result};
use crate::tabular::{Format, MemberRecord};

/// The body of `POST /export-csv`
#[derive(Debug, Default)]
pub struct ExportRequest {
    /// The members as the browser holds them
    pub members: Vec<MemberRecord>,
    /// The comparison to export. When absent it's calculated from `members`.
    pub results: Option<Comparison>,
    /// `csv` (the default) or `excel`
    pub format: Option<String>,
}

impl ExportRequest {
    /// Reads a request body one field at a time, so a bad field costs only
    /// itself. Members that can't be read are skipped, and `results` that
    /// can't be read are left out and calculated again. A body that isn't
    /// JSON at all has no members.
    #[must_use]
    pub fn from_body(body: &[u8]) -> ExportRequest {
        let mut value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(err) => {
                debug!(%err, "export body unreadable");
                return ExportRequest::default();
            }
        };
        let mut field = |name: &str| value.get_mut(name).map(Value::take).unwrap_or_default();

        let members: Vec<MemberRecord> = match field("members") {
            Value::Array(members) => {
                members.into_iter().filter_map(|member| serde_json::from_value(member).ok()).collect()
            }
            _ => Vec::new(),
        };
        let results: Option<Comparison> = match field("results") {
            Value::Null => None,
            results => match serde_json::from_value(results) {
                Ok(results) => Some(results),
                Err(err) => {
                    warn!(%err, "export results unreadable, recalculating from members");
                    None
                }
            },
        };
        let format = field("format").as_str().map(str::to_owned);
        ExportRequest { members, results, format }
    }
}

/// A finished export, ready to send
#[derive(Debug)]
pub struct ExportFile {
    /// `set_comparison_YYYYMMDD_HHMMSS` plus the format's extension
    pub filename: String,
    /// MIME type for the `Content-Type` header
    pub content_type: &'static str,
    /// The file itself
    pub contents: Vec<u8>,
}

/// Builds the export file for `request`, stamped with `exported_at`
pub fn export(request: &ExportRequest, exported_at: NaiveDateTime) -> Result<ExportFile> {
    if request.members.is_empty() {
        return Err(ListsetError::EmptyMembers);
    }
    let format = match request.format.as_deref() {
        None => Format::Csv,
        Some(name) => Format::from_export_name(name)?,
    };
    let sets = normalize(request.members.iter().map(|member| (member.name.as_str(), member.items.iter())));
    let results = match &request.results {
        Some(results) => results.clone(),
        None => compare(&sets),
    };

    let sections = sections(&sets, &results, exported_at);
    let contents = match format {
        Format::Csv => write_csv(&sections)?,
        Format::Excel => write_xlsx(&sections)?,
    };
    let filename = format!(
        "set_comparison_{}.{}",
        exported_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    debug!(%filename, bytes = contents.len(), "export written");
    Ok(ExportFile { filename, content_type: format.content_type(), contents })
}

/// One part of an export: a CSV section or an Excel sheet
struct Section {
    title: &'static str,
    header: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

/// Members are listed as the engine sees them: trimmed, deduplicated, and
/// without the ones left with no items.
fn sections(members: &MemberSets, results: &Comparison, exported_at: NaiveDateTime) -> [Section; 3] {
    let member_rows = members
        .iter()
        .map(|(name, items)| vec![name.clone(), joined(items), items.len().to_string()])
        .collect();

    let mut result_rows = vec![
        vec!["Union".to_owned(), joined(&results.union)],
        vec!["Intersection".to_owned(), joined(&results.intersection)],
        vec!["Exactly One".to_owned(), joined(&results.exactly_one)],
    ];
    for (name, unique) in &results.unique_per_member {
        result_rows.push(vec![format!("Unique to {name}"), joined(unique)]);
    }
    for (name, cardinality) in &results.cardinalities {
        result_rows.push(vec![format!("Cardinality of {name}"), cardinality.to_string()]);
    }

    let summary = results.summary();
    let info_rows = vec![
        vec!["Exported At".to_owned(), exported_at.format("%Y-%m-%d %H:%M:%S").to_string()],
        vec!["Total Members".to_owned(), members.len().to_string()],
        vec!["Union Size".to_owned(), summary.union_size.to_string()],
        vec!["Intersection Size".to_owned(), summary.intersection_size.to_string()],
        vec!["Exactly One Count".to_owned(), summary.exactly_one_count.to_string()],
        vec!["Average Items Per Member".to_owned(), format!("{:.1}", summary.average_items)],
    ];

    [
        Section { title: "Members Data", header: &["member", "items", "item_count"], rows: member_rows },
        Section { title: "Results Summary", header: &["metric", "value"], rows: result_rows },
        Section { title: "Export Info", header: &["field", "value"], rows: info_rows },
    ]
}

fn joined<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn write_csv(sections: &[Section]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (n, section) in sections.iter().enumerate() {
        if n > 0 {
            out.push(b'\n');
        }
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(&mut out);
        writer.write_record([section.title])?;
        writer.write_record(section.header)?;
        for row in &section.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(|err| ListsetError::Processing(err.to_string()))?;
    }
    Ok(out)
}

fn write_xlsx(sections: &[Section]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = CellFormat::new().set_bold();
    for section in sections {
        let sheet = workbook.add_worksheet();
        sheet.set_name(section.title)?;
        let mut col: u16 = 0;
        for heading in section.header {
            sheet.write_string_with_format(0, col, *heading, &bold)?;
            col += 1;
        }
        let mut row: u32 = 1;
        for values in &section.rows {
            let mut col: u16 = 0;
            for value in values {
                sheet.write_string(row, col, value.as_str())?;
                col += 1;
            }
            row += 1;
        }
        sheet.autofit();
    }
    Ok(workbook.save_to_buffer()?)
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;
    use calamine::{open_workbook_auto_from_rs, Reader};
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn when() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(14, 5, 7).unwrap()
    }

    fn members() -> Vec<MemberRecord> {
        vec![
            MemberRecord { name: "Alice".into(), items: vec!["milk".into(), "bread".into()] },
            MemberRecord { name: "Bob".into(), items: vec!["bread".into(), "tea".into()] },
        ]
    }

    fn request(format: Option<&str>) -> ExportRequest {
        ExportRequest { members: members(), results: None, format: format.map(str::to_string) }
    }

    #[test]
    fn no_members_is_an_error() {
        let err = export(&ExportRequest::default(), when()).unwrap_err();
        assert!(matches!(err, ListsetError::EmptyMembers));
    }

    #[test]
    fn unknown_formats_are_rejected() {
        let err = export(&request(Some("pdf")), when()).unwrap_err();
        assert!(matches!(err, ListsetError::UnsupportedFormat(_)));
    }

    #[test]
    fn csv_export_has_three_sections() {
        let file = export(&request(None), when()).unwrap();
        assert_eq!(file.filename, "set_comparison_20240309_140507.csv");
        assert!(file.content_type.starts_with("text/csv"));

        let text = String::from_utf8(file.contents).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Members Data");
        assert_eq!(lines[1], "member,items,item_count");
        assert_eq!(lines[2], "Alice,\"milk, bread\",2");
        assert_eq!(lines[3], "Bob,\"bread, tea\",2");
        for expected in [
            "Results Summary",
            "metric,value",
            "Union,\"bread, milk, tea\"",
            "Intersection,bread",
            "Exactly One,\"milk, tea\"",
            "Unique to Alice,milk",
            "Unique to Bob,tea",
            "Cardinality of Alice,2",
            "Export Info",
            "field,value",
            "Exported At,2024-03-09 14:05:07",
            "Total Members,2",
            "Average Items Per Member,2.0",
        ] {
            assert!(lines.contains(&expected), "missing {expected:?} in\n{text}");
        }
        let results_at = lines.iter().position(|l| *l == "Results Summary").unwrap();
        let info_at = lines.iter().position(|l| *l == "Export Info").unwrap();
        assert!(4 < results_at && results_at < info_at);
        assert_eq!(lines[4], "");
        assert_eq!(lines[results_at - 1], "");
        assert_eq!(lines[info_at - 1], "");
        assert!(!text.contains("\"\""), "{text}");
    }

    #[test]
    fn members_are_exported_cleaned() {
        let mut req = request(None);
        req.members = vec![
            MemberRecord { name: "Alice".into(), items: vec!["milk".into(), " milk".into(), "".into(), "bread".into()] },
            MemberRecord { name: "  ".into(), items: vec!["tea".into()] },
            MemberRecord { name: "Bob".into(), items: vec![" ".into()] },
        ];
        let text = String::from_utf8(export(&req, when()).unwrap().contents).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "Alice,\"milk, bread\",2");
        assert_eq!(lines[3], "");
        for expected in ["Cardinality of Alice,2", "Total Members,1", "Average Items Per Member,2.0"] {
            assert!(lines.contains(&expected), "missing {expected:?} in\n{text}");
        }
    }

    #[test]
    fn bodies_are_read_field_by_field() {
        let body = br#"{"members":[{"name":"Alice","items":["milk"]},{"name":7}],"results":{"cardinalities":{"Alice":"two"}},"format":"excel"}"#;
        let req = ExportRequest::from_body(body);
        assert_eq!(req.members, [MemberRecord { name: "Alice".into(), items: vec!["milk".into()] }]);
        assert!(req.results.is_none());
        assert_eq!(req.format.as_deref(), Some("excel"));

        let req = ExportRequest::from_body(br#"{"members":[{"name":"A","items":["x"]}],"results":{"union":["x"]}}"#);
        assert_eq!(req.results.unwrap().union.len(), 1);
        assert!(req.format.is_none());

        for body in ["garbage", "", "[1, 2]", r#"{"members": {}}"#] {
            assert!(ExportRequest::from_body(body.as_bytes()).members.is_empty(), "for {body:?}");
        }
    }

    #[test]
    fn supplied_results_are_exported_as_given() {
        let mut req = request(Some("csv"));
        let mut results = Comparison::default();
        results.union.insert("caviar".to_string());
        req.results = Some(results);
        let text = String::from_utf8(export(&req, when()).unwrap().contents).unwrap();
        assert!(text.contains("Union,caviar"), "{text}");
    }

    #[test]
    fn excel_export_has_three_sheets() {
        let file = export(&request(Some("excel")), when()).unwrap();
        assert_eq!(file.filename, "set_comparison_20240309_140507.xlsx");

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(file.contents)).unwrap();
        assert_eq!(workbook.sheet_names(), ["Members Data", "Results Summary", "Export Info"]);

        let members = workbook.worksheet_range("Members Data").unwrap();
        let rows: Vec<Vec<String>> =
            members.rows().map(|r| r.iter().map(|c| c.to_string()).collect()).collect();
        assert_eq!(rows[0], ["member", "items", "item_count"]);
        assert_eq!(rows[1], ["Alice", "milk, bread", "2"]);

        let summary = workbook.worksheet_range("Results Summary").unwrap();
        let rows: Vec<Vec<String>> =
            summary.rows().map(|r| r.iter().map(|c| c.to_string()).collect()).collect();
        assert!(rows.contains(&vec!["Intersection".to_string(), "bread".to_string()]));
    }
}
