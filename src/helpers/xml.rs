//! Streaming XML access for the parts of an XLSX package.
//! Wraps the quick-xml pull reader and adds attribute and text helpers.

use crate::error::DashboardError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while interpreting XML content
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    UnknownEntity(String),

    #[error("Invalid value '{value}' for attribute '{name}'")]
    InvalidAttribute { name: String, value: String },
}

/// Pull reader configured for spreadsheet parts: empty elements are expanded
/// so every `<c/>` produces a start and an end event.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);
        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Returns the next event, or `None` at the end of the document.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, DashboardError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

/// Attribute lookups on a start tag
pub(crate) trait XmlElementExt {
    /// Unescaped value of the attribute with the exact (qualified) name.
    fn attribute(&self, name: &str) -> Result<Option<String>, DashboardError>;

    /// Unescaped value of the first attribute whose local name matches,
    /// ignoring any namespace prefix (`r:id` matches `id`).
    fn local_attribute(&self, local_name: &str) -> Result<Option<String>, DashboardError>;

    /// Attribute value parsed into `T`.
    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, DashboardError>;
}

impl XmlElementExt for BytesStart<'_> {
    fn attribute(&self, name: &str) -> Result<Option<String>, DashboardError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?.into_owned())),
            None => Ok(None),
        }
    }

    fn local_attribute(&self, local_name: &str) -> Result<Option<String>, DashboardError> {
        for attribute in self.attributes() {
            let attribute = attribute?;
            if attribute.key.local_name().as_ref() == local_name.as_bytes() {
                return Ok(Some(attribute.unescape_value()?.into_owned()));
            }
        }
        Ok(None)
    }

    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, DashboardError> {
        self.attribute(name)?
            .map(|value| {
                value.parse::<T>().map_err(|_| {
                    DashboardError::from(XmlError::InvalidAttribute {
                        name: name.to_owned(),
                        value: value.to_owned(),
                    })
                })
            })
            .transpose()
    }
}

/// Appends the text a general reference stands for: numeric character
/// references (`&#65;`, `&#x41;`) and the predefined XML entities.
pub(crate) fn push_reference(text: &mut String, reference: &BytesRef) -> Result<(), DashboardError> {
    let raw = reference.xml_content()?;
    if let Some(number) = raw.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16)?,
            None => number.parse::<u32>()?,
        };
        if let Some(character) = char::from_u32(code) {
            text.push(character);
        }
    } else if let Some(entity) = resolve_xml_entity(&raw) {
        text.push_str(entity);
    } else {
        Err(XmlError::UnknownEntity(raw.to_string()))?;
    }
    Ok(())
}

/// Loops over the events of an `XmlReader`, dispatching to the given arms.
/// Unmatched events are skipped; the loop ends at the end of the document
/// or on `break`.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}
