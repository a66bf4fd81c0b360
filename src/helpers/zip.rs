//! ZIP package access for XLSX workbooks.
//! Part names are matched case-insensitively with either path separator,
//! since producers disagree on both.

use crate::error::DashboardError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipPackage<RS: Read + Seek> {
    /// Opens the named part, or `None` when the package does not contain it.
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, DashboardError>;

    /// Opens the named part as a streaming XML document.
    fn xml_part(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, DashboardError>;
}

impl<RS: Read + Seek> ZipPackage<RS> for ZipArchive<RS> {
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, DashboardError> {
        let wanted = name.replace('\\', "/");
        let stored = self
            .file_names()
            .find(|stored| wanted.eq_ignore_ascii_case(&stored.replace('\\', "/")))
            .map(str::to_owned);
        let Some(stored) = stored else {
            return Ok(None);
        };
        match self.by_name(&stored) {
            Ok(file) => Ok(Some(file)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_part(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, DashboardError> {
        Ok(self
            .part(name)?
            .map(|file| XmlReader::new(BufReader::new(file))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn package(parts: &[(&str, &str)]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        let cursor = writer.finish().unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn finds_parts_ignoring_case_and_separator() {
        let mut zip = package(&[("xl/Workbook.xml", "<workbook/>")]);
        let mut content = String::new();
        zip.part("XL\\workbook.xml")
            .unwrap()
            .expect("part present")
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<workbook/>");
    }

    #[test]
    fn missing_part_is_none() {
        let mut zip = package(&[("xl/workbook.xml", "<workbook/>")]);
        assert!(zip.part("xl/styles.xml").unwrap().is_none());
        assert!(zip.xml_part("xl/sharedStrings.xml").unwrap().is_none());
    }
}
