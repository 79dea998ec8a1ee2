//! Bibliographic records and their archived form
//!
//! # Components
//!
//! - `Record`: one article as seen on a result page, optionally enriched with detail
//! - `RecordDetail`: the fields only available from an article's own page
//! - `Provenance`: which search or citation expansion led to a record
//! - `ArchiveEntry`: the merged, persisted view of a record
//! - `normalize_authors`: author list reformatting used by the detail parser

mod authors;

pub use authors::{collapse_blank_lines, normalize_authors};

use serde::{Deserialize, Serialize};
use std::fmt;

/// One bibliographic item, identified by its PMID
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub authors_short: Option<String>,
    pub publication: Option<String>,
    pub abstract_text: Option<String>,
    pub full_text_ref: Option<String>,
}

/// Fields extracted from an article's detail page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordDetail {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub publication: Option<String>,
    pub abstract_text: Option<String>,
    pub full_text_ref: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn fill(slot: &mut Option<String>, value: &Option<String>) {
    if slot.is_none() {
        if let Some(v) = value {
            *slot = Some(v.clone());
        }
    }
}

impl Record {
    /// Creates a record from the columns of a result row
    ///
    /// A missing short author list falls back to the long one.
    pub fn from_listing(
        id: impl Into<String>,
        title: Option<String>,
        authors_long: Option<String>,
        authors_short: Option<String>,
        publication: Option<String>,
    ) -> Self {
        let authors = clean(authors_long);
        let authors_short = clean(authors_short).or_else(|| authors.clone());
        Self {
            id: id.into().trim().to_string(),
            title: clean(title),
            authors,
            authors_short,
            publication: clean(publication),
            abstract_text: None,
            full_text_ref: None,
        }
    }

    /// Applies a detail fetch to this record
    ///
    /// Abstract and full-text link always come from the detail page. Listing
    /// metadata already present is kept; the detail page only fills gaps.
    pub fn apply_detail(&mut self, detail: RecordDetail) {
        let RecordDetail {
            title,
            authors,
            publication,
            abstract_text,
            full_text_ref,
        } = detail;

        self.abstract_text = clean(abstract_text).or(self.abstract_text.take());
        self.full_text_ref = clean(full_text_ref).or(self.full_text_ref.take());

        let authors = clean(authors);
        fill(&mut self.title, &clean(title));
        fill(&mut self.authors, &authors);
        fill(&mut self.authors_short, &authors);
        fill(&mut self.publication, &clean(publication));
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(
                f,
                "{} {} {} PMID {}",
                self.authors_short.as_deref().unwrap_or_default(),
                title,
                self.publication.as_deref().unwrap_or_default(),
                self.id
            ),
            None => write!(f, "PMID {}", self.id),
        }
    }
}

/// Where a record was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Provenance {
    /// Returned by a free-text search
    Query { text: String },

    /// Returned while expanding the citations of another record
    CitedBy { id: String },
}

impl Provenance {
    pub fn query(text: impl Into<String>) -> Self {
        Self::Query { text: text.into() }
    }

    pub fn cited_by(id: impl Into<String>) -> Self {
        Self::CitedBy { id: id.into() }
    }

    /// Single-line spelling stored in archives
    ///
    /// Citations are written `cited-by:<id>` and plain queries as their text.
    /// Query texts that start with a reserved prefix get a `query:` prefix,
    /// and backslashes and line breaks are escaped.
    pub fn to_archive_string(&self) -> String {
        match self {
            Self::CitedBy { id } => format!("{}{}", CITED_BY_PREFIX, id),
            Self::Query { text } => {
                let escaped = escape(text);
                if escaped.starts_with(CITED_BY_PREFIX) || escaped.starts_with(QUERY_PREFIX) {
                    format!("{}{}", QUERY_PREFIX, escaped)
                } else {
                    escaped
                }
            }
        }
    }

    /// Parses the spelling produced by [`Provenance::to_archive_string`]
    pub fn from_archive_string(s: &str) -> Self {
        if let Some(id) = s.strip_prefix(CITED_BY_PREFIX) {
            return Self::cited_by(id);
        }
        let text = s.strip_prefix(QUERY_PREFIX).unwrap_or(s);
        Self::query(unescape(text))
    }
}

const CITED_BY_PREFIX: &str = "cited-by:";
const QUERY_PREFIX: &str = "query:";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query { text } => f.write_str(text),
            Self::CitedBy { id } => write!(f, "cited-by:{}", id),
        }
    }
}

/// Persisted, merged view of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub id: String,
    pub title: String,
    pub authors: String,
    pub citation: String,
    #[serde(default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub full_text_ref: Option<String>,
    #[serde(default)]
    pub found_by: Vec<Provenance>,
}

impl ArchiveEntry {
    /// Builds an entry with empty provenance from a loaded record
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone().unwrap_or_default(),
            authors: record.authors.clone().unwrap_or_default(),
            citation: record.publication.clone().unwrap_or_default(),
            abstract_text: record.abstract_text.clone(),
            full_text_ref: record.full_text_ref.clone(),
            found_by: Vec::new(),
        }
    }

    /// Records that `provenance` found this entry
    ///
    /// Returns false if it was already known.
    pub fn add_found_by(&mut self, provenance: Provenance) -> bool {
        if self.found_by.contains(&provenance) {
            return false;
        }
        self.found_by.push(provenance);
        true
    }

    /// Fills empty fields from a later sighting of the same record
    pub fn absorb(&mut self, record: &Record) {
        if record.id != self.id {
            return;
        }
        let fill_text = |slot: &mut String, value: &Option<String>| {
            if slot.is_empty() {
                if let Some(v) = value {
                    *slot = v.clone();
                }
            }
        };
        fill_text(&mut self.title, &record.title);
        fill_text(&mut self.authors, &record.authors);
        fill_text(&mut self.citation, &record.publication);
        fill(&mut self.abstract_text, &record.abstract_text);
        fill(&mut self.full_text_ref, &record.full_text_ref);
    }
}
