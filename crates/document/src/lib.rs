//! # AskPaper Document
//!
//! The structured paper produced by upstream ingestion (PDF/TeX/JATS to
//! doc2json), and the three things the pipeline does with it before any
//! token is counted:
//!
//! 1. **Section index**: the distinct section labels ([`Document::sections`])
//! 2. **Filter**: a filtered copy keeping or dropping blocks by label ([`Document::filter`])
//! 3. **Render**: one flat text with headers and a figures/tables appendix ([`Document::to_text`])

pub mod filter;
pub mod model;
pub mod render;
pub mod sections;
pub mod table;

pub use filter::FilterMode;
pub use model::{
    Affiliation, Author, CiteSpan, Document, FigureRef, Location, PdfParse, RefEntry,
    SectionNumber, TableRef, TextBlock,
};
pub use table::table_markup_to_text;
