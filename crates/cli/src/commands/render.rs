//! `askpaper render`: Print the text the model would read.

use std::path::Path;

use askpaper_document::{Document, FilterMode};

pub fn run(paper: &Path, include: &[String], exclude: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let document = super::load_paper(paper)?;
    println!("{}", filtered(document, include, exclude).to_text());
    Ok(())
}

/// Apply the include filter, then the exclude filter. Empty lists are no-ops.
fn filtered(document: Document, include: &[String], exclude: &[String]) -> Document {
    let document = if include.is_empty() {
        document
    } else {
        document.filter_or_keep(FilterMode::Include, include)
    };
    if exclude.is_empty() {
        document
    } else {
        document.filter_or_keep(FilterMode::Exclude, exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askpaper_document::{PdfParse, TextBlock};

    fn paper() -> Document {
        let block = |section: &str| TextBlock {
            text: format!("{section} text"),
            section: section.into(),
            ..TextBlock::default()
        };
        Document {
            title: "T".into(),
            pdf_parse: PdfParse {
                body_text: vec![block("Introduction"), block("Method"), block("References")],
                ..PdfParse::default()
            },
            ..Document::default()
        }
    }

    #[test]
    fn no_patterns_keeps_everything() {
        assert_eq!(filtered(paper(), &[], &[]), paper());
    }

    #[test]
    fn include_then_exclude() {
        let doc = filtered(paper(), &["o".into()], &["ref".into()]);
        let sections: Vec<&str> = doc.blocks().map(|b| b.section.as_str()).collect();
        assert_eq!(sections, vec!["Introduction", "Method"]);
    }
}
