//! Flat text rendering of a paper.
//!
//! Layout, entries separated by a blank line:
//!
//! ```text
//! # <title>
//! Authors: <First Last, Institution, Country>...
//! ## 2.1 <section>
//! <paragraphs>
//! #### Figures and Tables
//! Figure 1 caption: "<caption>"
//! Table 2: <caption>
//! | a | b |
//! ```

use std::cmp::Ordering;

use crate::model::{Author, Document, RefEntry, TextBlock};
use crate::table::table_markup_to_text;

/// Numbers upstream uses for "unnumbered".
const UNNUMBERED: &str = "0";

impl TextBlock {
    /// Header line of the block: `#` repeated by the dotted depth of the
    /// section number, or `-` when the number is not numeric or absent.
    pub fn header(&self) -> String {
        let marker = match self.sec_num.depth() {
            Some(depth) => "#".repeat(depth),
            None => "-".to_string(),
        };

        let mut parts = vec![marker];
        parts.extend(self.sec_num.label());
        if !self.section.trim().is_empty() {
            parts.push(self.section.trim().to_string());
        }
        parts.join(" ")
    }
}

impl Author {
    /// `First Last, Institution, Country`, trailing clauses only when present.
    pub fn display_line(&self) -> String {
        let mut line = [self.first.trim(), self.last.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let affiliation = self.affiliation.as_ref();
        let institution = affiliation.and_then(|a| a.institution.as_deref());
        let country = affiliation
            .and_then(|a| a.location.as_ref())
            .and_then(|l| l.country.as_deref());

        for clause in [institution, country].into_iter().flatten() {
            if !clause.trim().is_empty() {
                line.push_str(", ");
                line.push_str(clause.trim());
            }
        }
        line
    }
}

/// Order `FIGREF2` before `FIGREF10`: alphabetic prefix, then number.
fn natural_ref_order(a: &str, b: &str) -> Ordering {
    fn split(id: &str) -> (&str, Option<u64>) {
        let digits_at = id
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(id.len());
        let (prefix, number) = id.split_at(digits_at);
        (prefix, number.parse().ok())
    }
    split(a).cmp(&split(b)).then_with(|| a.cmp(b))
}

fn number_or_blank(number: Option<String>) -> Option<String> {
    number
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty() && n != UNNUMBERED)
}

fn render_ref_entry(entry: &RefEntry) -> String {
    match entry {
        RefEntry::Figure(figure) => match number_or_blank(figure.fig_num.clone()) {
            Some(n) => format!("Figure {n} caption: \"{}\"", figure.text),
            None => format!("Figure caption: \"{}\"", figure.text),
        },
        RefEntry::Table(table) => {
            let mut out = match number_or_blank(table.num.map(|n| n.to_string())) {
                Some(n) => format!("Table {n}: {}", table.text),
                None => format!("Table: {}", table.text),
            };
            if let Some(markup) = table.content.as_deref() {
                let grid = table_markup_to_text(markup);
                if !grid.is_empty() {
                    out.push('\n');
                    out.push_str(grid.trim_end());
                }
            }
            out
        }
    }
}

impl Document {
    /// One `display_line` per author, newline separated. `None` without authors.
    pub fn format_authors(&self) -> Option<String> {
        let authors = self.authors.as_ref().filter(|a| !a.is_empty())?;
        Some(
            authors
                .iter()
                .map(Author::display_line)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Render the paper as a single text for the model.
    ///
    /// Consecutive blocks with the same header are merged under one header,
    /// which stitches back paragraphs that ingestion split apart.
    pub fn to_text(&self) -> String {
        let mut entries: Vec<String> = vec![format!("# {}", self.title)];

        if let Some(authors) = self.format_authors() {
            entries.push(format!("Authors: {authors}"));
        }

        let mut last_header: Option<String> = None;
        for block in self.blocks() {
            let header = block.header();
            match (&last_header, entries.last_mut()) {
                (Some(previous), Some(entry)) if *previous == header => {
                    entry.push('\n');
                    entry.push_str(&block.text);
                }
                _ => {
                    entries.push(format!("{header}\n{}", block.text));
                    last_header = Some(header);
                }
            }
        }

        let mut refs: Vec<(&String, &RefEntry)> = self.pdf_parse.ref_entries.iter().collect();
        refs.sort_by(|(a, _), (b, _)| natural_ref_order(a, b));

        if !refs.is_empty() {
            entries.push("#### Figures and Tables".to_string());
            entries.extend(refs.into_iter().map(|(_, entry)| render_ref_entry(entry)));
        }

        entries.join("\n\n")
    }
}
