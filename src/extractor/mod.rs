/// Entity extraction: Tree-sitter parsing plus per-entity model analysis.
pub mod analyzer;
pub mod entity;
pub mod languages;
pub mod parser;
pub mod prompts;

pub use analyzer::EntityAnalyzer;
pub use entity::{CodeEntity, Complexity, EntityKind, ParsedEntity};
pub use parser::EntityParser;

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;

use languages::LanguageConfig;

/// Errors that can occur while locating or analyzing source entities.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("parse failed: {0}")]
    Parse(String),
}

/// Collect every supported source file under `root`, sorted by path.
///
/// The walk respects `.gitignore` but does not skip hidden files. A file
/// given directly as `root` is returned when its extension is supported.
pub fn collect_source_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let root = root.as_ref();
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(false)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .is_some_and(LanguageConfig::is_supported_extension)
        })
        .collect();

    files.sort();
    files
}
