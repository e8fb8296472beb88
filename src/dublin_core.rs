//! Reader for the `dublin_core.xml` files of DSpace export bundles.
//!
//! Each exported item carries its metadata as a flat list of `dcvalue` elements:
//!
//! ```xml
//! <dublin_core schema="dc">
//!   <dcvalue element="identifier" qualifier="uri">http://hdl.handle.net/1234/678</dcvalue>
//!   <dcvalue element="description" qualifier="provenance" language="en">...</dcvalue>
//! </dublin_core>
//! ```
//!
//! # Example
//!
//! ```
//! use dspace_migrate::dublin_core::{first_qualified, parse_dcvalues};
//!
//! let xml = r#"<dublin_core schema="dc">
//! <dcvalue element="identifier" qualifier="uri">http://hdl.handle.net/1234/678</dcvalue>
//! </dublin_core>"#;
//!
//! let values = parse_dcvalues(xml).unwrap();
//! assert_eq!(first_qualified(&values, "uri").unwrap().value, "http://hdl.handle.net/1234/678");
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;

use crate::{MigrateError, Result};

/// File name of the per-item metadata file inside a bundle.
pub const METADATA_FILE_NAME: &str = "dublin_core.xml";

/// A single `dcvalue` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcValue {
    pub element: String,
    pub qualifier: Option<String>,
    pub language: Option<String>,
    /// Text content, unescaped and trimmed
    pub value: String,
}

/// Read every `dcvalue` of a metadata file.
///
/// # Errors
///
/// Returns `MigrateError::Io` if the file cannot be read and
/// `MigrateError::InvalidFormat` if it is not a Dublin Core document.
pub fn read_dcvalues<P: AsRef<Path>>(path: P) -> Result<Vec<DcValue>> {
    let content = std::fs::read_to_string(path)?;
    parse_dcvalues(&content)
}

/// Parse every `dcvalue` of a Dublin Core document.
///
/// # Errors
///
/// Returns `MigrateError::InvalidFormat` if the document is not well-formed or has
/// no `dublin_core` root element.
pub fn parse_dcvalues(content: &str) -> Result<Vec<DcValue>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut values = Vec::new();
    let mut has_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name() == QName(b"dublin_core") => has_root = true,
            Ok(Event::Empty(ref e)) if e.name() == QName(b"dublin_core") => has_root = true,
            Ok(Event::Start(ref e)) if e.name() == QName(b"dcvalue") => {
                let mut value = parse_attributes(e)?;
                let mut text_buf = Vec::new();
                value.value = extract_text(&mut reader, &mut text_buf, b"dcvalue")?;
                values.push(value);
            }
            Ok(Event::Empty(ref e)) if e.name() == QName(b"dcvalue") => {
                values.push(parse_attributes(e)?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MigrateError::from(e)),
            _ => (),
        }
        buf.clear();
    }

    if !has_root {
        return Err(MigrateError::InvalidFormat(
            "No dublin_core element found".into(),
        ));
    }

    Ok(values)
}

/// Find the first value with the given qualifier.
pub fn first_qualified<'a>(values: &'a [DcValue], qualifier: &str) -> Option<&'a DcValue> {
    values
        .iter()
        .find(|v| v.qualifier.as_deref() == Some(qualifier))
}

fn parse_attributes(e: &BytesStart) -> Result<DcValue> {
    let mut value = DcValue::default();
    for attr in e.attributes() {
        let attr = attr.map_err(MigrateError::from)?;
        let text = attr.unescape_value().map_err(MigrateError::from)?.into_owned();
        match attr.key.as_ref() {
            b"element" => value.element = text,
            b"qualifier" => value.qualifier = Some(text),
            b"language" => value.language = Some(text),
            _ => (),
        }
    }
    Ok(value)
}

/// Extracts text content from XML events until the closing tag is found
fn extract_text<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    closing_tag: &[u8],
) -> Result<String> {
    let mut text = String::new();
    let closing_tag_str = String::from_utf8_lossy(closing_tag);

    loop {
        match reader.read_event_into(buf) {
            Ok(Event::Text(e)) => {
                text.push_str(&e.unescape().map_err(|e| {
                    MigrateError::InvalidFormat(format!("Invalid XML text content: {}", e))
                })?);
            }
            Ok(Event::CData(e)) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(e)) if e.name() == QName(closing_tag) => break,
            Ok(Event::Eof) => {
                return Err(MigrateError::InvalidFormat(format!(
                    "Unexpected EOF while looking for closing tag '{}'",
                    closing_tag_str
                )));
            }
            Err(e) => return Err(MigrateError::from(e)),
            _ => continue,
        }
        buf.clear();
    }

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ITEM: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>
<dublin_core schema="dc">
  <dcvalue element="contributor" qualifier="author" language="en_US">Smith, John</dcvalue>
  <dcvalue element="description" qualifier="provenance" language="en">Submitted by Jane
No. of bitstreams: 1
thesis.pdf: 12345 bytes, checksum: abc123 (MD5)</dcvalue>
  <dcvalue element="description" qualifier="provenance" language="en">Made available</dcvalue>
  <dcvalue element="identifier" qualifier="uri">http://hdl.handle.net/1234/678</dcvalue>
  <dcvalue element="title" qualifier="none" language="en_US">Rocks &amp; Minerals</dcvalue>
  <dcvalue element="rights" qualifier="none"/>
</dublin_core>"#;

    #[test]
    fn test_parse_dcvalues() {
        let values = parse_dcvalues(ITEM).unwrap();
        assert_eq!(values.len(), 6);
        assert_eq!(
            values[0],
            DcValue {
                element: "contributor".to_string(),
                qualifier: Some("author".to_string()),
                language: Some("en_US".to_string()),
                value: "Smith, John".to_string(),
            }
        );
        assert_eq!(values[4].value, "Rocks & Minerals");
        assert_eq!(values[5].element, "rights");
        assert_eq!(values[5].value, "");
    }

    #[test]
    fn test_first_qualified() {
        let values = parse_dcvalues(ITEM).unwrap();

        let provenance = first_qualified(&values, "provenance").unwrap();
        assert!(provenance.value.starts_with("Submitted by Jane\n"));
        assert!(provenance.value.ends_with("(MD5)"));

        let uri = first_qualified(&values, "uri").unwrap();
        assert_eq!(uri.value, "http://hdl.handle.net/1234/678");

        assert!(first_qualified(&values, "abstract").is_none());
    }

    #[test]
    fn test_parse_unclosed_value() {
        let input = r#"<dublin_core schema="dc"><dcvalue element="title">Incomplete"#;
        assert!(parse_dcvalues(input).is_err());
    }

    #[test]
    fn test_parse_not_dublin_core() {
        assert!(matches!(
            parse_dcvalues("just some text"),
            Err(MigrateError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_dcvalues("<records><record/></records>"),
            Err(MigrateError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_dcvalues("/nonexistent/dublin_core.xml");
        assert!(matches!(result, Err(MigrateError::Io(_))));
    }
}
