use anyhow::Context;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A table the shell has already rendered: header row plus cell rows.
/// Export works on this materialized view, never on the store itself, so
/// any filtered or reordered table can be exported as shown.
#[derive(Debug, Clone)]
pub struct TableView {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn cell_xml(value: &serde_json::Value) -> String {
    // JSON numbers become numeric cells; everything else is an inline
    // string so the sheet needs no shared-strings part.
    if let Some(n) = value.as_f64() {
        return format!("<c><v>{}</v></c>", n);
    }
    let text = match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!(
        "<c t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
        xml_escape(&text)
    )
}

fn sheet_xml(table: &TableView) -> String {
    let mut rows_xml = String::new();
    rows_xml.push_str("<row>");
    for col in &table.columns {
        rows_xml.push_str(&cell_xml(&serde_json::Value::String(col.clone())));
    }
    rows_xml.push_str("</row>");
    for row in &table.rows {
        rows_xml.push_str("<row>");
        for cell in row {
            rows_xml.push_str(&cell_xml(cell));
        }
        rows_xml.push_str("</row>");
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>{}</sheetData></worksheet>",
        rows_xml
    )
}

const CONTENT_TYPES_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
<Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\
</Types>";

const ROOT_RELS_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
</Relationships>";

const WORKBOOK_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
<sheets><sheet name=\"Sheet1\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>";

const WORKBOOK_RELS_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\"/>\
</Relationships>";

/// Writes the table as a single-sheet .xlsx (an OOXML zip package with
/// inline-string cells) at `out_path`. Returns the row count written,
/// header included.
pub fn write_table_xlsx(table: &TableView, out_path: &Path) -> anyhow::Result<usize> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", opts)
        .context("failed to start content-types entry")?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())
        .context("failed to write content-types entry")?;

    zip.start_file("_rels/.rels", opts)
        .context("failed to start package rels entry")?;
    zip.write_all(ROOT_RELS_XML.as_bytes())
        .context("failed to write package rels entry")?;

    zip.start_file("xl/workbook.xml", opts)
        .context("failed to start workbook entry")?;
    zip.write_all(WORKBOOK_XML.as_bytes())
        .context("failed to write workbook entry")?;

    zip.start_file("xl/_rels/workbook.xml.rels", opts)
        .context("failed to start workbook rels entry")?;
    zip.write_all(WORKBOOK_RELS_XML.as_bytes())
        .context("failed to write workbook rels entry")?;

    zip.start_file("xl/worksheets/sheet1.xml", opts)
        .context("failed to start worksheet entry")?;
    zip.write_all(sheet_xml(table).as_bytes())
        .context("failed to write worksheet entry")?;

    zip.finish().context("failed to finalize xlsx package")?;
    Ok(table.rows.len() + 1)
}

/// Standalone printable HTML document for one table: bordered cells,
/// compact type, ready for the shell to hand to a print dialog.
pub fn print_html(table: &TableView) -> String {
    let mut body = String::new();
    body.push_str("<table><thead><tr>");
    for col in &table.columns {
        body.push_str("<th>");
        body.push_str(&xml_escape(col));
        body.push_str("</th>");
    }
    body.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        body.push_str("<tr>");
        for cell in row {
            let text = match cell {
                serde_json::Value::Null => String::new(),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            body.push_str("<td>");
            body.push_str(&xml_escape(&text));
            body.push_str("</td>");
        }
        body.push_str("</tr>");
    }
    body.push_str("</tbody></table>");

    format!(
        "<html>\n<head>\n<title>Print - {}</title>\n<style>\n\
         table {{ width: 100%; border-collapse: collapse; font-family: Arial, sans-serif; }}\n\
         th, td {{ border: 1px solid #000; padding: 6px; font-size: 12px; }}\n\
         th {{ background: #f3f4f6; }}\n\
         </style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        xml_escape(&table.title),
        body
    )
}
