//! DSpace metadata columns and the logical fields they feed.
//!
//! A DSpace CSV export names each column after a Dublin Core element, optionally
//! suffixed with `[]` (the repeated variant) or `[en_US]` (the localized variant).
//! Each [`Field`] lists the columns consulted for it, most preferred first; the
//! first non-empty one wins.

/// Separator between the values of a multi-valued DSpace column.
pub const VALUE_SEPARATOR: &str = "||";

/// Localized type column, read only through the guarded fallback.
pub const TYPE_LOCALIZED_COLUMN: &str = "dc.type[en_US]";

/// Positional column whose presence historically guards the type fallback.
pub const TYPE_GUARD_COLUMN: usize = 16;

/// Logical fields of a migrated record.
#[non_exhaustive]
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum Field {
    /// dc.contributor.author
    Author,
    /// dc.date.issued
    DateIssued,
    /// dc.description.abstract
    Abstract,
    /// dc.description
    Description,
    /// dc.identifier.citation
    Citation,
    /// dc.identifier.uri
    IdentifierUri,
    /// dc.subject.lcsh
    SubjectLcsh,
    /// dc.subject
    Keywords,
    /// dc.title
    Title,
    /// dc.type
    Type,
    /// dc.contributor.advisor
    Advisor,
    /// dc.description.note
    Comments,
    /// dc.relation.ispartofseries
    Issue,
    /// thesis.degree.discipline
    Department,
    /// thesis.degree.name
    DegreeName,
    /// thesis.degree.level
    DegreeType,
    /// dc.format.mimetype
    Format,
}

impl Field {
    /// Every field, in declaration order.
    pub const ALL: [Field; 17] = [
        Field::Author,
        Field::DateIssued,
        Field::Abstract,
        Field::Description,
        Field::Citation,
        Field::IdentifierUri,
        Field::SubjectLcsh,
        Field::Keywords,
        Field::Title,
        Field::Type,
        Field::Advisor,
        Field::Comments,
        Field::Issue,
        Field::Department,
        Field::DegreeName,
        Field::DegreeType,
        Field::Format,
    ];

    /// Columns holding this field, most preferred first.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Field::Author => &["dc.contributor.author", "dc.contributor.author[]"],
            Field::DateIssued => &["dc.date.issued", "dc.date.issued[]"],
            Field::Abstract => &[
                "dc.description.abstract[]",
                "dc.description.abstract[en_US]",
            ],
            Field::Description => &["dc.description[]", "dc.description[en_US]"],
            Field::Citation => &[
                "dc.identifier.citation[]",
                "dc.identifier.citation[en_US]",
            ],
            Field::IdentifierUri => &["dc.identifier.uri", "dc.identifier.uri[]"],
            Field::SubjectLcsh => &["dc.subject.lcsh[en_US]", "dc.subject.lcsh[]"],
            Field::Keywords => &["dc.subject[]", "dc.subject[en_US]"],
            Field::Title => &["dc.title[en_US]", "dc.title[]", "dc.title"],
            Field::Type => &["dc.type[]"],
            Field::Advisor => &["dc.contributor.advisor[]", "dc.contributor.advisor"],
            Field::Comments => &["dc.description.note[]", "dc.description.note[en_US]"],
            Field::Issue => &[
                "dc.relation.ispartofseries[]",
                "dc.relation.ispartofseries",
            ],
            Field::Department => &["thesis.degree.discipline[]", "thesis.degree.discipline"],
            Field::DegreeName => &["thesis.degree.name[]", "thesis.degree.name"],
            Field::DegreeType => &["thesis.degree.level[]", "thesis.degree.level"],
            Field::Format => &["dc.format.mimetype[]", "dc.format.mimetype"],
        }
    }

    /// Find the field a column feeds, if any.
    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.columns().contains(&column))
    }
}
