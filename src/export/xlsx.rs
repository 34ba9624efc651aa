//! Minimal single-sheet SpreadsheetML writer.
//!
//! Produces a workbook with one worksheet and one column. Cells use inline
//! strings, so no shared-strings part is needed.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::CompressionMethod;
use zip::write::FileOptions;

use super::{ExportError, ExportFormat, SPREADSHEET_HEADER};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>
        <sheet name="Sheet1" sheetId="1" r:id="rId1"/>
    </sheets>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// Header in `A1`, then one row per fragment in order.
pub fn render(fragments: &[String]) -> Result<Vec<u8>, ExportError> {
    let sheet = sheet_xml(fragments);

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options: FileOptions<zip::write::ExtendedFileOptions> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", sheet.as_str()),
        ];
        for (name, body) in parts {
            zip.start_file(name, options.clone()).map_err(build_error)?;
            zip.write_all(body.as_bytes())?;
        }

        zip.finish().map_err(build_error)?;
    }

    Ok(buffer.into_inner())
}

fn build_error(e: zip::result::ZipError) -> ExportError {
    ExportError::Build {
        format: ExportFormat::Spreadsheet,
        message: e.to_string(),
    }
}

fn sheet_xml(fragments: &[String]) -> String {
    let mut rows = String::new();
    let cells = std::iter::once(SPREADSHEET_HEADER).chain(fragments.iter().map(String::as_str));
    for (i, value) in cells.enumerate() {
        let row = i + 1;
        rows.push_str(&format!(
            r#"<row r="{row}"><c r="A{row}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c></row>"#,
            escape(strip_invalid_xml_chars(value).as_str())
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <sheetData>{rows}</sheetData>
</worksheet>"#
    )
}

/// Drop characters XML 1.0 cannot represent at all.
fn strip_invalid_xml_chars(value: &str) -> String {
    value
        .chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || ('\u{20}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || c >= '\u{10000}'
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, open_workbook_auto_from_rs};

    fn column(bytes: Vec<u8>) -> Vec<String> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).expect("valid xlsx");
        let sheets = workbook.worksheets();
        assert_eq!(sheets.len(), 1);
        let (_, range) = &sheets[0];
        assert_eq!(range.get_size().1, 1, "single column");
        range
            .rows()
            .map(|row| match &row[0] {
                Data::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_header_then_one_row_per_fragment() {
        let fragments = vec![
            "Total: $42.00".to_string(),
            "Thank you".to_string(),
            "<5 & 6>".to_string(),
        ];
        let rows = column(render(&fragments).unwrap());
        assert_eq!(
            rows,
            vec!["Extracted Text", "Total: $42.00", "Thank you", "<5 & 6>"]
        );
    }

    #[test]
    fn test_header_only_when_empty() {
        assert_eq!(column(render(&[]).unwrap()), vec!["Extracted Text"]);
    }

    #[test]
    fn test_strip_invalid_xml_chars() {
        assert_eq!(strip_invalid_xml_chars("a\u{0}b\u{1}\tc"), "ab\tc");
        assert_eq!(strip_invalid_xml_chars("émoji 🦀"), "émoji 🦀");
    }
}
