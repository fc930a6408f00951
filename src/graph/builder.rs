use super::sqlite::{NodeRecord, SqliteGraph};
use super::GraphError;
use crate::extractor::{EntityKind, EntityParser, collect_source_files};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub files: usize,
    pub failed: usize,
    pub classes: usize,
    pub functions: usize,
    pub methods: usize,
}

impl IndexSummary {
    pub fn nodes(&self) -> usize {
        self.classes + self.functions + self.methods
    }
}

/// Seed the graph with one node per class, function and method under `root`.
///
/// Functions defined directly in a class body become `Method` nodes. Files
/// that cannot be read are logged and skipped.
pub fn index_repository<P: AsRef<Path>>(
    graph: &SqliteGraph,
    parser: &EntityParser,
    root: P,
) -> Result<IndexSummary, GraphError> {
    let root = root.as_ref();
    let mut summary = IndexSummary::default();

    for path in collect_source_files(root) {
        let entities = match parser.parse_file(&path) {
            Ok(entities) => entities,
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                summary.failed += 1;
                continue;
            }
        };

        // Store paths relative to the root, with forward slashes on every platform.
        let rel = path.strip_prefix(root).unwrap_or(&path);
        let file = rel.to_string_lossy().replace('\\', "/");

        for entity in &entities {
            let label = entity.graph_label();
            match entity.kind {
                EntityKind::Class => summary.classes += 1,
                EntityKind::Function if entity.parent.is_some() => summary.methods += 1,
                EntityKind::Function => summary.functions += 1,
            }

            graph.upsert_node(&NodeRecord {
                label,
                name: &entity.name,
                file: &file,
                start_line: Some(entity.start_line),
                end_line: Some(entity.end_line),
            })?;
        }
        summary.files += 1;
    }

    info!(
        "Indexed {} nodes from {} files ({} failed)",
        summary.nodes(),
        summary.files,
        summary.failed
    );
    Ok(summary)
}
