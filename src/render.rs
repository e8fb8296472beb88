//! Digital Commons batch import output.
//!
//! Records are written as one `<documents>` batch:
//!
//! ```xml
//! <documents xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
//!   <document>
//!     <title>Rocks of Oregon</title>
//!     <publication-date>2020-03-01</publication-date>
//!     <authors>
//!       <author xsi:type="individual">
//!         <lname>Smith</lname>
//!         <fname>John</fname>
//!       </author>
//!     </authors>
//!     <fulltext-url>https://example.edu/1234/678/thesis.pdf</fulltext-url>
//!     <fields>
//!       <field name="advisor1" type="string"><value>Jones, Ann</value></field>
//!     </fields>
//!   </document>
//! </documents>
//! ```

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::{Author, Record, Result};

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Name of the output document for a collection.
///
/// # Examples
///
/// ```
/// use dspace_migrate::render::output_file_name;
///
/// assert_eq!(output_file_name("1234", None), "1234-metadata.xml");
/// assert_eq!(output_file_name("1234", Some("geology")), "geology-1234-metadata.xml");
/// ```
pub fn output_file_name(collection_id: &str, department: Option<&str>) -> String {
    match department {
        Some(department) => format!("{department}-{collection_id}-metadata.xml"),
        None => format!("{collection_id}-metadata.xml"),
    }
}

/// Write `records` to a new file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns `MigrateError::Io` if the file cannot be written.
pub fn write_documents<P: AsRef<Path>>(path: P, records: &[Record]) -> Result<()> {
    let path = path.as_ref();
    let mut file = BufWriter::new(File::create(path)?);
    render_documents(records, &mut file)?;
    file.flush()?;
    info!(path = %path.display(), records = records.len(), "wrote batch document");
    Ok(())
}

/// Render `records` as a Digital Commons batch document.
///
/// # Errors
///
/// Returns `MigrateError` if the underlying writer fails.
pub fn render_documents<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("documents");
    root.push_attribute(("xmlns:xsi", XSI_NS));
    xml.write_event(Event::Start(root))?;

    for record in records {
        write_document(&mut xml, record)?;
    }

    xml.write_event(Event::End(BytesEnd::new("documents")))?;
    xml.into_inner().write_all(b"\n")?;
    Ok(())
}

fn write_document<W: Write>(xml: &mut Writer<W>, record: &Record) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new("document")))?;

    write_text(xml, "title", &record.title)?;
    write_text(xml, "publication-date", &record.publication_date)?;

    xml.write_event(Event::Start(BytesStart::new("authors")))?;
    for author in &record.authors {
        write_author(xml, author)?;
    }
    xml.write_event(Event::End(BytesEnd::new("authors")))?;

    write_list(xml, "keywords", "keyword", &record.keywords)?;
    write_list(xml, "subject-areas", "subject-area", &record.subject_areas)?;

    if let Some(abstract_text) = &record.abstract_text {
        // Already entity-encoded during normalization.
        xml.write_event(Event::Start(BytesStart::new("abstract")))?;
        xml.write_event(Event::Text(BytesText::from_escaped(abstract_text.as_str())))?;
        xml.write_event(Event::End(BytesEnd::new("abstract")))?;
    }

    write_optional(xml, "fulltext-url", record.fulltext_url.as_deref())?;
    write_optional(xml, "document-type", record.document_type.as_deref())?;

    let mut fields: Vec<(String, &str)> = record
        .advisors
        .iter()
        .enumerate()
        .map(|(i, advisor)| (format!("advisor{}", i + 1), advisor.as_str()))
        .collect();
    let named = [
        ("comments", &record.comments),
        ("citation", &record.citation),
        ("description", &record.description),
        ("issue", &record.issue),
        ("department", &record.department),
        ("degree_name", &record.degree_name),
        ("degree_type", &record.degree_type),
        ("format", &record.format),
    ];
    fields.extend(
        named
            .into_iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name.to_string(), v))),
    );

    if !fields.is_empty() {
        xml.write_event(Event::Start(BytesStart::new("fields")))?;
        for (name, value) in fields {
            let mut field = BytesStart::new("field");
            field.push_attribute(("name", name.as_str()));
            field.push_attribute(("type", "string"));
            xml.write_event(Event::Start(field))?;
            write_text(xml, "value", value)?;
            xml.write_event(Event::End(BytesEnd::new("field")))?;
        }
        xml.write_event(Event::End(BytesEnd::new("fields")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("document")))?;
    Ok(())
}

fn write_author<W: Write>(xml: &mut Writer<W>, author: &Author) -> Result<()> {
    let mut start = BytesStart::new("author");
    start.push_attribute(("xsi:type", "individual"));
    xml.write_event(Event::Start(start))?;
    write_optional(xml, "email", author.email.as_deref())?;
    write_optional(xml, "institution", author.institution.as_deref())?;
    write_text(xml, "lname", &author.last_name)?;
    write_text(xml, "fname", &author.first_name)?;
    write_optional(xml, "mname", author.middle_name.as_deref())?;
    xml.write_event(Event::End(BytesEnd::new("author")))?;
    Ok(())
}

fn write_list<W: Write>(xml: &mut Writer<W>, outer: &str, inner: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    xml.write_event(Event::Start(BytesStart::new(outer)))?;
    for value in values {
        write_text(xml, inner, value)?;
    }
    xml.write_event(Event::End(BytesEnd::new(outer)))?;
    Ok(())
}

fn write_optional<W: Write>(xml: &mut Writer<W>, name: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) => write_text(xml, name, value),
        None => Ok(()),
    }
}

fn write_text<W: Write>(xml: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        xml.write_event(Event::Empty(BytesStart::new(name)))?;
        return Ok(());
    }
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
