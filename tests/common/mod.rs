//! In-memory XLSX workbooks for integration tests.
#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub enum TestCell {
    Text(&'static str),
    Number(f64),
    /// Stored as a serial number with the built-in date format
    Date(NaiveDate),
    Empty,
}

pub use TestCell::*;

#[derive(Default)]
pub struct XlsxBuilder {
    sheets: Vec<(String, Vec<Vec<TestCell>>)>,
}

impl XlsxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, name: &str, rows: Vec<Vec<TestCell>>) -> Self {
        self.sheets.push((name.to_owned(), rows));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let mut part = |name: &str, content: String| {
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        };

        part("[Content_Types].xml", CONTENT_TYPES.to_owned());
        part("xl/styles.xml", STYLES.to_owned());

        let mut relationships = String::new();
        let mut sheets = String::new();
        for (index, (name, rows)) in self.sheets.iter().enumerate() {
            let id = index + 1;
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
            ));
            sheets.push_str(&format!(r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#));
            part(&format!("xl/worksheets/sheet{id}.xml"), worksheet(rows));
        }
        part(
            "xl/_rels/workbook.xml.rels",
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#),
        );
        part(
            "xl/workbook.xml",
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheets}</sheets></workbook>"#),
        );
        writer.finish().unwrap().into_inner()
    }

    pub fn data_url(&self) -> String {
        format!(
            "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,{}",
            STANDARD.encode(self.build())
        )
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs></styleSheet>"#;

fn worksheet(rows: &[Vec<TestCell>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (row, cells) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, cell) in cells.iter().enumerate() {
            let reference = format!("{}{}", column_letter(col), row + 1);
            match cell {
                Text(text) => xml.push_str(&format!(r#"<c r="{reference}" t="inlineStr"><is><t>{text}</t></is></c>"#)),
                Number(number) => xml.push_str(&format!(r#"<c r="{reference}"><v>{number}</v></c>"#)),
                Date(date) => xml.push_str(&format!(r#"<c r="{reference}" s="1"><v>{}</v></c>"#, serial(*date))),
                Empty => (),
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_letter(col: usize) -> char {
    (b'A' + col as u8) as char
}

fn serial(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    (date - epoch).num_days()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// The three-row sales sheet used across the tests.
pub fn sales_workbook() -> XlsxBuilder {
    XlsxBuilder::new()
        .sheet("Sales", vec![
            vec![Text("Date"), Text("Category"), Text("Value")],
            vec![Date(date(2024, 1, 1)), Text("A"), Number(10.0)],
            vec![Date(date(2024, 1, 2)), Text("B"), Number(20.0)],
            vec![Date(date(2024, 1, 3)), Text("A"), Number(30.0)],
        ])
        .sheet("Notes", vec![
            vec![Text("Day"), Text("Note")],
            vec![Text("2024-01-05"), Text("launch")],
            vec![Text("2024-01-09"), Text("review")],
            vec![Text("someday"), Text("backlog")],
        ])
}
