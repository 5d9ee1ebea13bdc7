//! Section filtering.
//!
//! A block matches a pattern set when any pattern is a case-insensitive
//! substring of its section label. Filtering builds a new [`Document`];
//! the original is left untouched so the caller decides which one to keep.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::model::{Document, PdfParse, RefEntry, TextBlock};

/// Whether matched blocks are kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Include,
    Exclude,
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Include => f.write_str("include"),
            FilterMode::Exclude => f.write_str("exclude"),
        }
    }
}

/// Lowercased patterns, matched by substring.
struct SectionMatcher {
    patterns: Vec<String>,
}

impl SectionMatcher {
    fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_lowercase()).collect(),
        }
    }

    fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.patterns.iter().any(|p| label.contains(p.as_str()))
    }

    /// Keep the matched blocks for `Include`, the rest for `Exclude`.
    fn select(&self, blocks: &[TextBlock], mode: FilterMode) -> Vec<TextBlock> {
        let matched: Vec<bool> = blocks.iter().map(|b| self.matches(&b.section)).collect();
        let keep = mode == FilterMode::Include;
        blocks
            .iter()
            .zip(matched)
            .filter(|(_, is_match)| *is_match == keep)
            .map(|(block, _)| block.clone())
            .collect()
    }
}

impl Document {
    /// Build a copy of this document keeping (`Include`) or dropping
    /// (`Exclude`) the blocks whose section label contains any pattern.
    ///
    /// `ref_entries` of the copy are exactly the entries reachable from the
    /// surviving blocks. Returns `None` when the result would have no block
    /// left at all; the caller should keep using the original then.
    pub fn filter<S: AsRef<str>>(&self, mode: FilterMode, patterns: &[S]) -> Option<Document> {
        let matcher = SectionMatcher::new(patterns);
        debug!(%mode, patterns = ?matcher.patterns, "Filtering paper sections");

        let body_text = matcher.select(&self.pdf_parse.body_text, mode);
        let back_matter = matcher.select(&self.pdf_parse.back_matter, mode);

        if body_text.is_empty() && back_matter.is_empty() {
            warn!(%mode, patterns = ?matcher.patterns, "Filter was too harsh, paper went blank; keeping original");
            return None;
        }

        let ref_entries = self.reachable_ref_entries(body_text.iter().chain(back_matter.iter()));

        debug!(
            body = body_text.len(),
            back_matter = back_matter.len(),
            ref_entries = ref_entries.len(),
            "Filtered paper"
        );

        Some(Document {
            title: self.title.clone(),
            abstract_text: self.abstract_text.clone(),
            authors: self.authors.clone(),
            pdf_parse: PdfParse {
                body_text,
                back_matter,
                ref_entries,
            },
        })
    }

    /// Like [`Document::filter`], but falls back to a clone of `self` when
    /// the filter would empty the document.
    pub fn filter_or_keep<S: AsRef<str>>(&self, mode: FilterMode, patterns: &[S]) -> Document {
        self.filter(mode, patterns).unwrap_or_else(|| self.clone())
    }

    /// Entries referenced by `blocks` that exist in this document.
    /// Unknown ids are ignored.
    fn reachable_ref_entries<'a>(
        &self,
        blocks: impl Iterator<Item = &'a TextBlock>,
    ) -> BTreeMap<String, RefEntry> {
        let mut reachable = BTreeMap::new();
        for id in blocks.flat_map(|b| b.ref_ids()) {
            if let Some(entry) = self.pdf_parse.ref_entries.get(id) {
                reachable.insert(id.to_string(), entry.clone());
            }
        }
        reachable
    }
}
