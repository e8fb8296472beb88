use crate::fields::VALUE_SEPARATOR;
use crate::regex::Regex;
use crate::{Author, MigrateError, Result};
use itertools::Itertools;
use std::path::{Component, Path};
use std::sync::LazyLock;

/// Publication date used when a row carries none.
pub const DEFAULT_PUBLICATION_DATE: &str = "2014-01-01";

static FULL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2,4}-[0-9]{2,4}-[0-9]{2,4}$").unwrap());

static SLASHED_FULL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,4}/[0-9]{2,4}/[0-9]{2,4}$").unwrap());

static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2,4}-[0-9]{2,4}$").unwrap());

static SLASHED_YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,4}/[0-9]{2,4}$").unwrap());

/// Strips trailing line breaks, like a shell `chomp`.
pub fn chomp(value: &str) -> &str {
    value.trim_end_matches(['\r', '\n'])
}

/// Normalizes an issue date to `YYYY-MM-DD`.
///
/// The first matching rule wins:
/// full dates are kept, slashes become dashes, a year and month get day `01`,
/// and anything else is taken as a bare year. A missing date falls back to
/// [`DEFAULT_PUBLICATION_DATE`].
pub fn normalize_date(date: Option<&str>) -> String {
    let date = match date.map(chomp) {
        Some(date) if !date.is_empty() => date,
        _ => return DEFAULT_PUBLICATION_DATE.to_string(),
    };

    if FULL_DATE.is_match(date) {
        date.to_string()
    } else if SLASHED_FULL_DATE.is_match(date) {
        date.replace('/', "-")
    } else if YEAR_MONTH.is_match(date) {
        format!("{date}-01")
    } else if SLASHED_YEAR_MONTH.is_match(date) {
        format!("{date}-01").replace('/', "-")
    } else {
        // Not validated: "Spring 2014" becomes "Spring 2014-01-01".
        format!("{date}-01-01")
    }
}

/// Parses one author token of the form `Last, First Middle`.
///
/// Everything after the first whitespace of the given part is the middle name.
/// A token without `", "` is a bare last name.
pub fn parse_author_name(token: &str) -> Author {
    let mut parts = token.split(", ").map(str::trim);
    let last = parts.next().unwrap_or_default();

    match parts.next() {
        Some(rest) if rest.contains(char::is_whitespace) => {
            let mut names = rest.split_whitespace();
            let first = names.next().unwrap_or_default();
            let middle = names.join(" ");
            let author = Author::new(first, last);
            if middle.is_empty() {
                author
            } else {
                author.with_middle_name(middle)
            }
        }
        Some(rest) => Author::new(rest, last),
        None => Author::new("", last),
    }
}

/// Parses a `||`-separated author list, falling back to the institution.
pub fn parse_authors(value: Option<&str>, institution: &str) -> Vec<Author> {
    let authors: Vec<Author> = value
        .map(|value| {
            value
                .split(VALUE_SEPARATOR)
                .filter(|token| !token.trim().is_empty())
                .map(parse_author_name)
                .collect()
        })
        .unwrap_or_default();

    if authors.is_empty() {
        vec![Author::institutional(institution)]
    } else {
        authors
    }
}

/// Splits a multi-valued column into its trimmed, non-empty values.
pub fn split_values(value: &str) -> Vec<String> {
    value
        .split(VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Returns the last `/`-separated segment of a URI, ignoring trailing slashes.
///
/// The segment is used as a directory name, so `.`, `..` and anything else that
/// is not a single plain path component yields `None`.
pub fn last_path_segment(uri: &str) -> Option<&str> {
    uri.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| is_path_segment(segment))
}

/// Whether `name` is exactly one plain path component.
pub fn is_path_segment(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(component)), None) if component == name
    )
}

/// Encodes HTML special characters (`&`, `<`, `>`, `"`, `'`) as entities.
pub fn encode_entities(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// Extracts the attachment filename from a provenance statement.
///
/// The statement is split into lines on real line breaks and on literal `\n`
/// markers; the third line reads `filename:size:checksum`.
///
/// # Errors
///
/// Returns `MigrateError::MalformedProvenance` if there is no third line or it
/// names no file.
pub fn provenance_filename(provenance: &str) -> Result<String> {
    let normalized = provenance
        .replace("\\r\\n", "\n")
        .replace("\\n", "\n")
        .replace("\r\n", "\n");

    let line = normalized.split('\n').nth(2).ok_or_else(|| {
        MigrateError::MalformedProvenance("expected at least three lines".to_string())
    })?;

    match line.split(':').next().map(str::trim) {
        Some(filename) if !filename.is_empty() => Ok(filename.to_string()),
        _ => Err(MigrateError::MalformedProvenance(format!(
            "no filename in {line:?}"
        ))),
    }
}
