pub mod ask;
pub mod config_cmd;
pub mod doctor;
pub mod render;
pub mod sections;

use std::path::Path;

use askpaper_core::Result;
use askpaper_document::Document;

/// Read a doc2json paper from disk.
pub fn load_paper(path: &Path) -> Result<Document> {
    let file = std::fs::File::open(path)
        .inspect_err(|e| tracing::error!(paper = %path.display(), error = %e, "Cannot open paper"))?;
    let document = Document::from_reader(std::io::BufReader::new(file))
        .inspect_err(|e| tracing::error!(paper = %path.display(), error = %e, "Cannot parse paper"))?;
    Ok(document)
}
