//! Section index: the distinct section labels present in a paper.

use std::collections::HashSet;

use crate::model::Document;

impl Document {
    /// Distinct, non-empty section labels of the body and back matter,
    /// in order of first appearance.
    pub fn sections(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.blocks()
            .map(|block| block.section.trim())
            .filter(|label| !label.is_empty() && seen.insert(*label))
            .map(String::from)
            .collect()
    }
}
