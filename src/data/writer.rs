//! XLSX Writer Module
//! Writes single-sheet workbooks with a bold header and optional red highlights.
//!
//! Uses direct ZIP/XML generation: one worksheet, a shared string table and a
//! three-entry style sheet (plain, highlight, header).

use super::{Cell, Sheet};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use zip::write::FileOptions;
use zip::ZipWriter;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Style index into `cellXfs`.
const STYLE_PLAIN: usize = 0;
const STYLE_HIGHLIGHT: usize = 1;
const STYLE_HEADER: usize = 2;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Cells to paint red, addressed by (data row, column). Data rows exclude the header.
pub type Highlights = HashSet<(usize, usize)>;

/// XLSX generator for pipeline outputs
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a sheet with its header as the first row.
    pub fn write_sheet(sheet: &Sheet, output_path: &Path) -> Result<(), WriterError> {
        Self::write_highlighted(sheet, &Highlights::new(), output_path)
    }

    /// Write a sheet, painting the given data cells in red.
    pub fn write_highlighted(
        sheet: &Sheet,
        highlights: &Highlights,
        output_path: &Path,
    ) -> Result<(), WriterError> {
        let header: Vec<Cell> = sheet.columns().iter().map(|c| Cell::text(c.clone())).collect();
        let mut rows: Vec<(&[Cell], Vec<usize>)> = Vec::with_capacity(sheet.height() + 1);
        rows.push((header.as_slice(), vec![STYLE_HEADER; header.len()]));
        for (r, row) in sheet.rows().iter().enumerate() {
            let styles = (0..row.len())
                .map(|c| {
                    if highlights.contains(&(r, c)) {
                        STYLE_HIGHLIGHT
                    } else {
                        STYLE_PLAIN
                    }
                })
                .collect();
            rows.push((row.as_slice(), styles));
        }
        Self::write_rows(&rows, output_path)
    }

    /// Write a raw grid with no header styling.
    pub fn write_grid(grid: &[Vec<Cell>], output_path: &Path) -> Result<(), WriterError> {
        let rows: Vec<(&[Cell], Vec<usize>)> = grid
            .iter()
            .map(|r| (r.as_slice(), vec![STYLE_PLAIN; r.len()]))
            .collect();
        Self::write_rows(&rows, output_path)
    }

    fn write_rows(rows: &[(&[Cell], Vec<usize>)], output_path: &Path) -> Result<(), WriterError> {
        let mut strings = SharedStrings::default();
        let sheet_xml = Self::sheet_xml(rows, &mut strings);

        let file = File::create(output_path)?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(Self::content_types_xml().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(Self::rels_xml().as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(Self::workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(Self::workbook_rels_xml().as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(Self::styles_xml().as_bytes())?;

        zip.start_file("xl/sharedStrings.xml", options)?;
        zip.write_all(strings.to_xml().as_bytes())?;

        zip.start_file("xl/worksheets/sheet1.xml", options)?;
        zip.write_all(sheet_xml.as_bytes())?;

        zip.finish()?;

        tracing::debug!("Workbook written: {} ({} rows)", output_path.display(), rows.len());
        Ok(())
    }

    fn sheet_xml(rows: &[(&[Cell], Vec<usize>)], strings: &mut SharedStrings) -> String {
        let mut xml = String::with_capacity(rows.len() * 256);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        let _ = write!(xml, r#"<worksheet xmlns="{}"><sheetData>"#, NS_MAIN);

        for (r, (cells, styles)) in rows.iter().enumerate() {
            let row_num = r + 1;
            let _ = write!(xml, r#"<row r="{}">"#, row_num);
            for (c, cell) in cells.iter().enumerate() {
                let style = styles.get(c).copied().unwrap_or(STYLE_PLAIN);
                let reference = format!("{}{}", column_letter(c), row_num);
                let style_attr = if style == STYLE_PLAIN {
                    String::new()
                } else {
                    format!(r#" s="{}""#, style)
                };
                match cell {
                    Cell::Empty => {}
                    Cell::Number(n) if !n.is_finite() => {}
                    Cell::Number(n) => {
                        let _ = write!(xml, r#"<c r="{}"{}><v>{}</v></c>"#, reference, style_attr, n);
                    }
                    Cell::Text(s) => {
                        let idx = strings.index_of(s);
                        let _ = write!(
                            xml,
                            r#"<c r="{}"{} t="s"><v>{}</v></c>"#,
                            reference, style_attr, idx
                        );
                    }
                    Cell::Bool(b) => {
                        let _ = write!(
                            xml,
                            r#"<c r="{}"{} t="b"><v>{}</v></c>"#,
                            reference,
                            style_attr,
                            u8::from(*b)
                        );
                    }
                }
            }
            xml.push_str("</row>");
        }

        xml.push_str("</sheetData></worksheet>");
        xml
    }

    fn content_types_xml() -> String {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
</Types>"#
            .to_string()
    }

    fn rels_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">
<Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
            NS_PKG_REL, NS_REL
        )
    }

    fn workbook_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            NS_MAIN, NS_REL
        )
    }

    fn workbook_rels_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{pkg}">
<Relationship Id="rId1" Type="{rel}/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="{rel}/styles" Target="styles.xml"/>
<Relationship Id="rId3" Type="{rel}/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#,
            pkg = NS_PKG_REL,
            rel = NS_REL
        )
    }

    /// cellXfs order must match the `STYLE_*` constants.
    fn styles_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="{}">
<fonts count="3">
<font><sz val="11"/><name val="Calibri"/></font>
<font><sz val="11"/><color rgb="FFFF0000"/><name val="Calibri"/></font>
<font><b/><sz val="11"/><name val="Calibri"/></font>
</fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="3">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
<xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0" applyFont="1"/>
</cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#,
            NS_MAIN
        )
    }
}

/// Shared string table, deduplicated in insertion order.
#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    values: Vec<String>,
    refs: usize,
}

impl SharedStrings {
    fn index_of(&mut self, s: &str) -> usize {
        self.refs += 1;
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.values.len();
        self.index.insert(s.to_string(), idx);
        self.values.push(s.to_string());
        idx
    }

    fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        let _ = write!(
            xml,
            r#"<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            NS_MAIN,
            self.refs,
            self.values.len()
        );
        for value in &self.values {
            let _ = write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(value));
        }
        xml.push_str("</sst>");
        xml
    }
}

/// 0 → A, 25 → Z, 26 → AA.
pub fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}
