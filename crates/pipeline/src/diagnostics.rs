//! Offline inspection dumps.
//!
//! When enabled, each answered question overwrites three files in the
//! configured directory: `paper.txt` (the rendered context),
//! `contexts.txt` (the chunks sent to the model) and `responses.txt`
//! (chunk answers, then the fused answer). Failing to write is only
//! logged.

use std::path::{Path, PathBuf};

use askpaper_config::DiagnosticsConfig;
use tracing::{debug, warn};

use crate::splitter::Chunk;

pub const PAPER_FILE: &str = "paper.txt";
pub const CONTEXTS_FILE: &str = "contexts.txt";
pub const RESPONSES_FILE: &str = "responses.txt";

#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: PathBuf,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `None` unless dumps are enabled.
    pub fn from_config(config: &DiagnosticsConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(&config.dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn dump_paper(&self, text: &str) {
        self.write(PAPER_FILE, text.to_string()).await;
    }

    pub async fn dump_contexts(&self, chunks: &[Chunk]) {
        let body = chunks
            .iter()
            .map(|c| format!("\nContext nr {}: {}\n", c.index, c.text))
            .collect::<Vec<_>>()
            .join("\n");
        self.write(CONTEXTS_FILE, body).await;
    }

    pub async fn dump_responses(&self, responses: &[String]) {
        let body = responses
            .iter()
            .enumerate()
            .map(|(i, r)| format!("\nResponse nr {i}: {r}\n"))
            .collect::<Vec<_>>()
            .join("\n");
        self.write(RESPONSES_FILE, body).await;
    }

    async fn write(&self, name: &str, body: String) {
        let path = self.dir.join(name);
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "Cannot create diagnostics directory");
            return;
        }
        match tokio::fs::write(&path, body).await {
            Ok(()) => debug!(path = %path.display(), "Wrote diagnostics dump"),
            Err(e) => warn!(path = %path.display(), error = %e, "Cannot write diagnostics dump"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_gives_no_dumper() {
        assert!(Diagnostics::from_config(&DiagnosticsConfig::default()).is_none());
        let enabled = DiagnosticsConfig {
            enabled: true,
            dir: PathBuf::from("/tmp/x"),
        };
        assert_eq!(Diagnostics::from_config(&enabled).unwrap().dir(), Path::new("/tmp/x"));
    }

    #[tokio::test]
    async fn writes_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let diagnostics = Diagnostics::new(dir.path().join("dumps"));

        diagnostics.dump_paper("# Title").await;
        diagnostics
            .dump_contexts(&[Chunk {
                index: 0,
                text: "first".into(),
                start: 0,
                overlap: 0,
            }])
            .await;
        diagnostics.dump_responses(&["a".into(), "b".into()]).await;

        let read = |name: &str| std::fs::read_to_string(dir.path().join("dumps").join(name)).unwrap();
        assert_eq!(read(PAPER_FILE), "# Title");
        assert_eq!(read(CONTEXTS_FILE), "\nContext nr 0: first\n");
        assert_eq!(read(RESPONSES_FILE), "\nResponse nr 0: a\n\n\nResponse nr 1: b\n");
    }

    #[tokio::test]
    async fn unwritable_directory_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, "x").unwrap();
        Diagnostics::new(&file).dump_paper("text").await;
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "x");
    }
}
