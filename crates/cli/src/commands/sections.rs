//! `askpaper sections`: List the section labels of a paper.

use std::path::Path;

pub fn run(paper: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let document = super::load_paper(paper)?;
    for label in document.sections() {
        println!("{label}");
    }
    Ok(())
}
