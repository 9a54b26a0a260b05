// src/source/tabular.rs
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

use calamine::{DataType, Range, Reader as CalamineReader, Xls, Xlsx};
use chrono::{Duration, NaiveDate};

use crate::table::RawTable;
use crate::utils::error::SourceError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Parses CSV bytes. The first record is the header row.
pub fn read_csv(bytes: &[u8]) -> Result<RawTable, SourceError> {
    let format_err = |reason: String| SourceError::Format { kind: "csv", reason };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format_err(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(format_err("missing header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| format_err(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!("Parsed CSV: {} columns, {} rows", headers.len(), rows.len());
    Ok(RawTable { headers, rows })
}

/// Reads the first non-empty worksheet of an `.xlsx` or `.xls` workbook.
pub fn read_spreadsheet(bytes: &[u8]) -> Result<RawTable, SourceError> {
    let range = if bytes.starts_with(ZIP_MAGIC) {
        let mut workbook = Xlsx::new(Cursor::new(bytes))
            .map_err(|err| spreadsheet_err(format!("failed to read xlsx workbook: {err}")))?;
        first_sheet(&mut workbook)?
    } else if bytes.starts_with(OLE_MAGIC) {
        let mut workbook = Xls::new(Cursor::new(bytes))
            .map_err(|err| spreadsheet_err(format!("failed to read xls workbook: {err}")))?;
        first_sheet(&mut workbook)?
    } else {
        return Err(spreadsheet_err("not an xlsx or xls workbook".to_string()));
    };

    range_to_table(&range)
}

fn spreadsheet_err(reason: String) -> SourceError {
    SourceError::Format {
        kind: "spreadsheet",
        reason,
    }
}

fn first_sheet<RS, R>(workbook: &mut R) -> Result<Range<DataType>, SourceError>
where
    RS: Read + Seek,
    R: CalamineReader<RS>,
    R::Error: Display,
{
    let names: Vec<String> = workbook.sheet_names().to_vec();
    for name in names {
        match workbook.worksheet_range(&name) {
            Some(Ok(range)) if !range.is_empty() => {
                tracing::debug!("Using worksheet '{}'", name);
                return Ok(range);
            }
            Some(Ok(_)) => tracing::debug!("Worksheet '{}' is empty", name),
            Some(Err(err)) => tracing::warn!("Could not read worksheet '{}': {}", name, err),
            None => {}
        }
    }
    Err(spreadsheet_err("workbook has no non-empty worksheet".to_string()))
}

fn range_to_table(range: &Range<DataType>) -> Result<RawTable, SourceError> {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
    let headers = rows
        .next()
        .ok_or_else(|| spreadsheet_err("missing header row".to_string()))?;
    let rows: Vec<Vec<String>> = rows.collect();

    tracing::debug!("Parsed worksheet: {} columns, {} rows", headers.len(), rows.len());
    Ok(RawTable { headers, rows })
}

/// Excel day serial (1900 date system) to a calendar date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

pub(crate) fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(v) => format!("{v}"),
        DataType::Int(v) => format!("{v}"),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(v) => excel_serial_to_date(*v)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        DataType::DateTimeIso(s) => s.clone(),
        DataType::Duration(v) => format!("{v}"),
        DataType::DurationIso(s) => s.clone(),
        // Error cells are gaps, same as empty ones
        DataType::Error(_) | DataType::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
<sheet name="Cover" sheetId="1" r:id="rId1"/>
<sheet name="Figures" sheetId="2" r:id="rId2"/>
</sheets>
</workbook>"#;

    const EMPTY_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#;

    const FIGURES_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>Year</t></is></c><c r="B1" t="inlineStr"><is><t>Revenue</t></is></c></row>
<row r="2"><c r="A2"><v>2021</v></c><c r="B2"><v>100</v></c></row>
<row r="3"><c r="A3"><v>2022</v></c><c r="B3"><v>150.5</v></c></row>
</sheetData></worksheet>"#;

    /// Minimal two-sheet workbook: an empty cover sheet, then the figures.
    fn xlsx_workbook() -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, content) in [
                ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
                ("xl/workbook.xml", WORKBOOK),
                ("xl/worksheets/sheet1.xml", EMPTY_SHEET),
                ("xl/worksheets/sheet2.xml", FIGURES_SHEET),
            ] {
                zip.start_file(name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_read_spreadsheet_skips_empty_sheets() {
        let table = read_spreadsheet(&xlsx_workbook()).unwrap();
        assert_eq!(table.headers, vec!["Year", "Revenue"]);
        assert_eq!(
            table.rows,
            vec![vec!["2021", "100"], vec!["2022", "150.5"]]
        );
    }

    #[test]
    fn test_read_csv_keeps_raw_headers() {
        let table = read_csv(b" Date , Revenue\n2021-01-01,\"1,000\"\n2022-01-01,1500\n").unwrap();
        assert_eq!(table.headers, vec![" Date ", " Revenue"]);
        assert_eq!(table.rows[0], vec!["2021-01-01", "1,000"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_read_csv_header_only_is_valid() {
        let table = read_csv(b"Date,Revenue\n").unwrap();
        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_read_csv_rejects_empty_and_ragged_input() {
        assert!(matches!(read_csv(b""), Err(SourceError::Format { kind: "csv", .. })));
        assert!(matches!(
            read_csv(b"a,b\n1,2,3\n"),
            Err(SourceError::Format { kind: "csv", .. })
        ));
    }

    #[test]
    fn test_read_spreadsheet_rejects_non_workbooks() {
        assert!(matches!(
            read_spreadsheet(b"Date,Revenue\n"),
            Err(SourceError::Format { kind: "spreadsheet", .. })
        ));
        // ZIP magic but not a workbook
        assert!(matches!(
            read_spreadsheet(b"PK\x03\x04garbage"),
            Err(SourceError::Format { kind: "spreadsheet", .. })
        ));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&DataType::String("  Revenue ".into())), "Revenue");
        assert_eq!(cell_to_string(&DataType::Float(1500.5)), "1500.5");
        assert_eq!(cell_to_string(&DataType::Float(100.0)), "100");
        assert_eq!(cell_to_string(&DataType::Int(7)), "7");
        assert_eq!(cell_to_string(&DataType::Empty), "");
        assert_eq!(cell_to_string(&DataType::DateTime(44197.0)), "2021-01-01");
    }

    #[test]
    fn test_range_to_table_uses_first_row_as_headers() {
        let mut range: Range<DataType> = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), DataType::String("Date".into()));
        range.set_value((0, 1), DataType::String("Revenue".into()));
        range.set_value((1, 0), DataType::DateTime(44197.0));
        range.set_value((1, 1), DataType::Float(100.0));
        range.set_value((2, 0), DataType::DateTime(44562.0));
        range.set_value((2, 1), DataType::Float(150.0));

        let table = range_to_table(&range).unwrap();
        assert_eq!(table.headers, vec!["Date", "Revenue"]);
        assert_eq!(
            table.rows,
            vec![vec!["2021-01-01", "100"], vec!["2022-01-01", "150"]]
        );
    }
}
