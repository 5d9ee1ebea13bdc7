//! The structured paper, as produced by doc2json-style ingestion.
//!
//! Field names follow the ingestion JSON so a parsed paper deserializes
//! directly: `{title, abstract, authors, pdf_parse: {body_text, back_matter, ref_entries}}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A structured scientific paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub title: String,

    #[serde(default, rename = "abstract")]
    pub abstract_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<Author>>,

    #[serde(default)]
    pub pdf_parse: PdfParse,
}

impl Document {
    /// Parse a document from ingestion JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Parse a document from a reader yielding ingestion JSON.
    pub fn from_reader(reader: impl std::io::Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    /// All text blocks, body first, then back matter.
    pub fn blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.pdf_parse
            .body_text
            .iter()
            .chain(self.pdf_parse.back_matter.iter())
    }

    /// True when neither body nor back matter has a block.
    pub fn is_empty(&self) -> bool {
        self.pdf_parse.body_text.is_empty() && self.pdf_parse.back_matter.is_empty()
    }
}

/// The parse tree of a paper: two ordered block sequences plus the
/// figures and tables they point at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfParse {
    #[serde(default)]
    pub body_text: Vec<TextBlock>,

    #[serde(default)]
    pub back_matter: Vec<TextBlock>,

    /// Figure and table entries keyed by reference id (e.g. `FIGREF0`, `TABREF2`).
    #[serde(default)]
    pub ref_entries: BTreeMap<String, RefEntry>,
}

/// One paragraph of the paper together with the section it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,

    /// Section label, possibly empty.
    #[serde(default)]
    pub section: String,

    #[serde(default)]
    pub sec_num: SectionNumber,

    /// Bibliography citations.
    #[serde(default)]
    pub cite_spans: Vec<CiteSpan>,

    /// Figure and table references.
    #[serde(default)]
    pub ref_spans: Vec<CiteSpan>,
}

impl TextBlock {
    /// Reference ids mentioned by this block, in span order.
    pub fn ref_ids(&self) -> impl Iterator<Item = &str> {
        self.cite_spans
            .iter()
            .chain(self.ref_spans.iter())
            .filter_map(|span| span.ref_id.as_deref())
    }
}

/// A citation or reference marker inside [`TextBlock::text`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiteSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
    #[serde(default)]
    pub ref_id: Option<String>,
}

/// A section number as found upstream: an integer, a string such as
/// `"2.1"` or `"A"`, or nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionNumber {
    Integer(i64),
    Text(String),
    #[default]
    Absent,
}

impl SectionNumber {
    /// Nesting depth of a numeric section number: `"3"` is 1, `"2.1"` is 2,
    /// `"4.2.1."` is 3. Non-numeric or absent numbers have no depth.
    pub fn depth(&self) -> Option<usize> {
        match self {
            SectionNumber::Integer(_) => Some(1),
            SectionNumber::Text(s) => {
                let trimmed = s.trim().trim_end_matches('.');
                if trimmed.is_empty() {
                    return None;
                }
                let parts: Vec<&str> = trimmed.split('.').collect();
                parts
                    .iter()
                    .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
                    .then_some(parts.len())
            }
            SectionNumber::Absent => None,
        }
    }

    /// The number as written, or `None` when absent or blank.
    pub fn label(&self) -> Option<String> {
        match self {
            SectionNumber::Integer(n) => Some(n.to_string()),
            SectionNumber::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

/// A figure or table the text refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type_str", rename_all = "lowercase")]
pub enum RefEntry {
    Figure(FigureRef),
    Table(TableRef),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FigureRef {
    #[serde(default)]
    pub fig_num: Option<String>,

    /// Caption text.
    pub text: String,

    #[serde(default)]
    pub uris: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    /// Caption text.
    pub text: String,

    /// Raw table markup (HTML-like).
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub num: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub middle: Vec<String>,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub affiliation: Option<Affiliation>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Affiliation {
    #[serde(default)]
    pub laboratory: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub settlement: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}
