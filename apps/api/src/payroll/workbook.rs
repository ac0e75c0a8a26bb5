//! Spreadsheet bytes → `Table`. Reads the first worksheet of any format calamine detects
//! (xlsx, xlsm, xls, ods).

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use crate::errors::AppError;
use crate::payroll::table::{Cell, Table};

/// Parses an uploaded workbook. Leading empty rows and columns are kept so that row
/// numbers and column positions match what the user sees in their spreadsheet.
pub fn read_table(bytes: &[u8]) -> Result<Table, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::MalformedInput(format!("Unreadable workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::MalformedInput("Workbook has no worksheets".to_string()))?
        .map_err(|e| AppError::MalformedInput(format!("Unreadable worksheet: {e}")))?;

    let (leading_rows, leading_cols) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); leading_rows];
    rows.extend(range.rows().map(|row| {
        std::iter::repeat(Cell::Empty)
            .take(leading_cols)
            .chain(row.iter().map(to_cell))
            .collect()
    }));

    debug!(rows = rows.len(), "Workbook parsed");
    Ok(Table::new(rows))
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

/// Hand-assembled single-sheet xlsx, for tests that need real workbook bytes.
#[cfg(test)]
pub(crate) mod fixture {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Payroll" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

    /// Cells that parse as numbers are written numeric, the rest as inline strings.
    /// Empty strings leave the cell out.
    pub fn xlsx(rows: &[Vec<&str>]) -> Vec<u8> {
        let mut sheet = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (r, row) in rows.iter().enumerate() {
            sheet.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let reference = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                if value.parse::<f64>().is_ok() {
                    sheet.push_str(&format!(r#"<c r="{reference}"><v>{value}</v></c>"#));
                } else {
                    sheet.push_str(&format!(
                        r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                        escape(value)
                    ));
                }
            }
            sheet.push_str("</row>");
        }
        sheet.push_str("</sheetData></worksheet>");

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, body) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", sheet.as_str()),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn escape(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    /// Four metadata rows, the header, then `data`.
    pub fn payroll_sheet(data: &[Vec<&str>]) -> Vec<u8> {
        let mut rows: Vec<Vec<&str>> = vec![
            vec!["Helly Consultancy Services"],
            vec!["Salary register"],
            vec![],
            vec!["Month", "December"],
            vec!["NAME ", "mobile no", " SALARY", "ADVANCE", "DEDUCTION", "NET"],
        ];
        rows.extend(data.iter().cloned());
        xlsx(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payroll::{AdapterOptions, RecordReader};

    #[test]
    fn test_garbage_bytes_are_malformed_input() {
        let err = read_table(b"definitely not a spreadsheet").unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
    }

    #[test]
    fn test_to_cell_conversions() {
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
        assert_eq!(to_cell(&Data::Int(5)), Cell::Number(5.0));
        assert_eq!(to_cell(&Data::Float(2.5)), Cell::Number(2.5));
        assert_eq!(
            to_cell(&Data::String("NAME".to_string())),
            Cell::text("NAME")
        );
    }

    #[test]
    fn test_reads_first_sheet_with_row_numbers_intact() {
        let bytes = fixture::payroll_sheet(&[
            vec!["amit  kumar", "9876543210", "20000", "3000", "2000", "15000"],
            vec![],
            vec!["Ravi Verma", "", "12000", "", "500", "11500"],
        ]);
        let table = read_table(&bytes).unwrap();
        assert_eq!(table.len(), 8);

        let records: Vec<_> = RecordReader::new(table, AdapterOptions::default())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row, 6);
        assert_eq!(records[0].name, "amit kumar");
        assert_eq!(records[0].phone.as_deref(), Some("9876543210"));
        assert_eq!(records[1].row, 8);
        assert!(records[1].phone.is_none());
    }
}
