use crate::dataset::Table;
use crate::error::DashboardError;
use crate::error::ResultMessage;
use crate::helpers::xml::push_reference;
use crate::helpers::xml::XmlElementExt;
use crate::helpers::xml::XmlReader;
use crate::helpers::zip::ZipPackage;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use tracing::debug;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_RELATIONSHIP: &[u8] = b"Relationship";       // Package relationship
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");   // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");     // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");   // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");          // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");    // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");        // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                   // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

const PART_WORKBOOK: &str = "xl/workbook.xml";
const PART_RELATIONSHIPS: &str = "xl/_rels/workbook.xml.rels";
const PART_STYLES: &str = "xl/styles.xml";
const PART_SHARED_STRINGS: &str = "xl/sharedStrings.xml";

/// An XLSX workbook opened from memory.
pub(crate) struct XlsxWorkbook {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    /// Cell type for each cell style index
    number_formats: Vec<CellType>,
    /// Worksheets as (name, zip path) pairs, in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook {
    pub(crate) fn open(bytes: Vec<u8>) -> Result<XlsxWorkbook, DashboardError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::NoSheets)?
        }
        let number_formats = load_number_formats(&mut zip, is_1904)?;
        debug!(sheets = sheets.len(), styles = number_formats.len(), is_1904, "opened xlsx workbook");
        Ok(XlsxWorkbook {
            zip,
            number_formats,
            sheets,
        })
    }

    #[cfg(test)]
    pub(crate) fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Decodes every accepted worksheet into a table, in workbook order.
    pub(crate) fn read_tables(&mut self, criteria: &Criteria) -> Result<Vec<(String, Table)>, DashboardError> {
        let shared_strings = self.load_shared_strings()?;
        let accepted: Vec<(String, String)> = self
            .sheets
            .iter()
            .filter(|(name, _)| criteria.accept(name))
            .take(criteria.sheet_limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        let mut tables = Vec::with_capacity(accepted.len());
        for (name, path) in accepted {
            let sheet = self
                .read_sheet(&name, &path, criteria)
                .with_prefix(&format!("Sheet '{name}'"))?;
            let table = sheet.into_table(&shared_strings, criteria)?;
            debug!(sheet = %name, rows = table.row_count(), columns = table.columns().len(), "decoded sheet");
            tables.push((name, table));
        }
        Ok(tables)
    }

    /// Loads the shared string table; a workbook without one has no shared strings.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, DashboardError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_part(PART_SHARED_STRINGS)? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_text(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }

    fn read_sheet(&mut self, name: &str, path: &str, criteria: &Criteria) -> Result<Sheet, DashboardError> {
        let mut sheet = Sheet::new(name, criteria);
        let mut reader = self
            .zip
            .xml_part(path)?
            .ok_or_else(|| SpreadsheetError::MissingPart(path.to_owned()))?;

        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut pending: Option<Cell> = None;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
                col_count = 0;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                let (row, col) = event
                    .attribute("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                row_count = row;
                col_count = col + 1;
                if sheet.after_row_upper_bound(row) {
                    break;
                }
                pending = None;
                if sheet.contains(row, col) {
                    let kind = match event.attribute("t")?.as_deref() {
                        Some("inlineStr") | Some("str") => CellType::InlineString,
                        Some("s") => CellType::SharedString,
                        Some("d") => CellType::IsoDateTime,
                        Some("b") => CellType::Boolean,
                        Some("e") if criteria.error_as_null => CellType::Empty,
                        Some("e") => CellType::Error,
                        _ => event
                            .parse_attribute::<usize>("s")?
                            .and_then(|style| self.number_formats.get(style).copied())
                            .unwrap_or(CellType::Number),
                    };
                    if kind != CellType::Empty {
                        pending = Some(Cell { row, col, kind, value: String::new() });
                    }
                }
            }
            Event::Start(event) if pending.is_some() && event.name() == TAG_INLINE_STRING => {
                let text = read_text(&mut reader, TAG_INLINE_STRING, false)?;
                if let Some(cell) = pending.as_mut() {
                    cell.value = text;
                }
            }
            Event::Start(event) if pending.is_some() && event.name() == TAG_VALUE => {
                let text = read_text(&mut reader, TAG_VALUE, true)?;
                if let Some(cell) = pending.as_mut() {
                    cell.value = text;
                }
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if let Some(cell) = pending.take() {
                    if !cell.value.is_empty() {
                        sheet.push(cell);
                    }
                }
            }
        });
        Ok(sheet)
    }
}

/// Maps relationship ids to worksheet paths.
fn load_relationships<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<HashMap<String, String>, DashboardError> {
    let mut reader = zip
        .xml_part(PART_RELATIONSHIPS)?
        .ok_or_else(|| SpreadsheetError::MissingPart(PART_RELATIONSHIPS.to_owned()))?;
    let mut relationships = HashMap::<String, String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.attribute("Id")?;
            let kind = event.attribute("Type")?;
            let target = event.attribute("Target")?;
            // Only worksheets; chartsheets and the like carry no cells
            if kind.is_none_or(|kind| kind.ends_with("/worksheet")) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id, to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Reads the worksheet list and the date system from `xl/workbook.xml`.
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(Vec<(String, String)>, bool), DashboardError> {
    let relationships = load_relationships(zip)?;
    let mut reader = zip
        .xml_part(PART_WORKBOOK)?
        .ok_or_else(|| SpreadsheetError::MissingPart(PART_WORKBOOK.to_owned()))?;
    let mut sheets = Vec::<(String, String)>::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let name = event.attribute("name")?;
            let id = event.local_attribute("id")?;
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id) {
                    sheets.push((name, path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event
                .attribute("date1904")?
                .is_some_and(|value| value == "1" || value == "true");
        }
    });
    Ok((sheets, is_1904))
}

/// Resolves the cell type of every cell style in `xl/styles.xml`.
fn load_number_formats<RS: Read + Seek>(zip: &mut ZipArchive<RS>, is_1904: bool) -> Result<Vec<CellType>, DashboardError> {
    let mut reader = match zip.xml_part(PART_STYLES)? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.attribute("numFmtId")?;
            let format = event.attribute("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id, CellType::from_custom_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => {
            format_indexes_context = false;
        }
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            format_indexes.push(event.attribute("numFmtId")?.unwrap_or_default());
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::from_builtin_format(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect())
}

/// Collects the text of an element up to `end_tag`, skipping phonetic runs.
/// `is_text_content` marks elements whose direct text is the value (`<v>`);
/// otherwise only `<t>` children count.
fn read_text<R: BufRead>(reader: &mut XmlReader<R>, end_tag: QName, is_text_content: bool) -> Result<String, DashboardError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => push_reference(&mut text, &event)?,
    });
    Ok(text)
}

/// Turns a relationship target into an archive path.
fn to_zip_path(target: &str) -> String {
    if let Some(path) = target.strip_prefix('/') {
        path.to_owned()
    } else if target.starts_with("xl/") {
        target.to_owned()
    } else {
        format!("xl/{target}")
    }
}
