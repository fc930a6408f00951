use super::{ENRICH_NODE_QUERY, GraphError, GraphSession, enrichment_params};
use crate::extractor::{AnalyzerError, EntityAnalyzer, collect_source_files};
use crate::ollama::LanguageModel;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    OllamaUnavailable,
}

/// Outcome of one enrichment run.
///
/// Serializes as `{"status": "skipped", "reason": ...}` or
/// `{"status": "completed", "enhanced_entities": ..., "model_used": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentReport {
    Skipped {
        reason: SkipReason,
    },
    Completed {
        /// Entities whose statement matched at least one graph node.
        enhanced_entities: usize,
        model_used: String,
        files_processed: usize,
        files_failed: usize,
        entities_analyzed: usize,
    },
}

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Default, Clone, Copy)]
struct FileOutcome {
    entities: usize,
    matched: usize,
}

/// Walks a repository and writes model annotations onto existing graph nodes.
pub struct GraphEnricher<'a, M: LanguageModel + ?Sized> {
    analyzer: EntityAnalyzer<'a, M>,
}

impl<'a, M: LanguageModel + ?Sized> GraphEnricher<'a, M> {
    pub fn new(model: &'a M) -> Result<Self, AnalyzerError> {
        Ok(Self {
            analyzer: EntityAnalyzer::new(model)?,
        })
    }

    pub fn from_analyzer(analyzer: EntityAnalyzer<'a, M>) -> Self {
        Self { analyzer }
    }

    /// Enrich every graph node that matches an entity found under `repo_path`.
    ///
    /// Returns early with [`EnrichmentReport::Skipped`] when the model is not
    /// available; in that case no file is read and the session is untouched.
    /// Failures in one file are logged and the walk continues.
    pub fn enhance_knowledge_graph<P, S>(&self, repo_path: P, session: &mut S) -> EnrichmentReport
    where
        P: AsRef<Path>,
        S: GraphSession + ?Sized,
    {
        let model = self.analyzer.model();
        if !model.is_available() {
            warn!(
                "Ollama model {} not available. Skipping enhancement.",
                model.model_name()
            );
            return EnrichmentReport::Skipped {
                reason: SkipReason::OllamaUnavailable,
            };
        }

        info!("Enhancing knowledge graph with {}", model.model_name());

        let files = collect_source_files(repo_path.as_ref());
        let mut enhanced_entities = 0;
        let mut files_processed = 0;
        let mut files_failed = 0;
        let mut entities_analyzed = 0;

        for path in &files {
            match self.enrich_file(path, session) {
                Ok(outcome) => {
                    files_processed += 1;
                    entities_analyzed += outcome.entities;
                    enhanced_entities += outcome.matched;
                }
                Err(e) => {
                    files_failed += 1;
                    error!("Error processing {}: {e}", path.display());
                }
            }
        }

        info!(
            "Enhanced {enhanced_entities} of {entities_analyzed} entities in {files_processed} files ({files_failed} failed)"
        );

        EnrichmentReport::Completed {
            enhanced_entities,
            model_used: model.model_name().to_string(),
            files_processed,
            files_failed,
            entities_analyzed,
        }
    }

    fn enrich_file<S: GraphSession + ?Sized>(
        &self,
        path: &Path,
        session: &mut S,
    ) -> Result<FileOutcome, EnrichError> {
        let entities = self.analyzer.analyze_file(path)?;
        let mut outcome = FileOutcome {
            entities: entities.len(),
            matched: 0,
        };

        for entity in &entities {
            let tags = self.analyzer.extract_semantic_tags(&entity.source, &entity.name);
            let params = enrichment_params(entity, &tags);
            // A name shared by several nodes still counts once.
            if session.run(ENRICH_NODE_QUERY, &params)? > 0 {
                outcome.matched += 1;
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Params;
    use crate::ollama::mock::ScriptedModel;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    /// Records every statement and reports a fixed number of matches per name.
    #[derive(Default)]
    struct RecordingSession {
        calls: Vec<(String, Params)>,
        matches: Vec<(&'static str, usize)>,
        fail_on: Option<&'static str>,
    }

    impl GraphSession for RecordingSession {
        fn run(&mut self, query: &str, params: &Params) -> Result<usize, GraphError> {
            let name = params["name"].as_str().unwrap_or_default().to_string();
            self.calls.push((query.to_string(), params.clone()));
            if self.fail_on == Some(name.as_str()) {
                return Err(GraphError::UnsupportedStatement("boom".to_string()));
            }
            Ok(self
                .matches
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, count)| *count)
                .unwrap_or(0))
        }
    }

    fn scripted() -> ScriptedModel {
        ScriptedModel::new("codellama:7b-instruct")
            .answer("concise 1-2 sentence", "Does a thing.")
            .answer("one per line", "os\nsys")
            .answer("rate its complexity", "HIGH")
            .answer("semantic tags", "Utility, IO")
    }

    #[test]
    fn test_unavailable_model_skips() {
        let model = ScriptedModel::unavailable("codellama:7b-instruct");
        let enricher = GraphEnricher::new(&model).unwrap();
        let mut session = RecordingSession::default();

        let report = enricher.enhance_knowledge_graph("/nonexistent/repo", &mut session);

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"status": "skipped", "reason": "ollama_unavailable"})
        );
        assert!(session.calls.is_empty());
        assert!(model.prompts().is_empty());
    }

    #[test]
    fn test_completed_report_counts_matches() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("a.py"),
            "class Store:\n    def save(self):\n        pass\n",
        )
        .unwrap();
        fs::write(temp_dir.path().join("b.py"), "def helper():\n    return 1\n").unwrap();

        let model = scripted();
        let enricher = GraphEnricher::new(&model).unwrap();
        let mut session = RecordingSession {
            matches: vec![("Store", 1), ("save", 2)],
            ..Default::default()
        };

        let report = enricher.enhance_knowledge_graph(temp_dir.path(), &mut session);

        // `save` matches two nodes but is one entity; `helper` matches none.
        assert_eq!(
            report,
            EnrichmentReport::Completed {
                enhanced_entities: 2,
                model_used: "codellama:7b-instruct".to_string(),
                files_processed: 2,
                files_failed: 0,
                entities_analyzed: 3,
            }
        );
        assert_eq!(session.calls.len(), 3);

        let (query, params) = &session.calls[0];
        assert_eq!(query, ENRICH_NODE_QUERY);
        assert_eq!(params["name"], json!("Store"));
        assert_eq!(params["purpose"], json!("Does a thing."));
        assert_eq!(params["complexity"], json!("HIGH"));
        assert_eq!(params["tags"], json!(["utility", "io"]));
        assert_eq!(params["relationships"], json!(["os", "sys"]));
    }

    #[test]
    fn test_tags_are_computed_from_entity_source() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("m.py"), "def ping():\n    return 'pong'\n").unwrap();

        let model = scripted();
        let enricher = GraphEnricher::new(&model).unwrap();
        let mut session = RecordingSession::default();
        enricher.enhance_knowledge_graph(temp_dir.path(), &mut session);

        let tag_prompt = model
            .prompts()
            .into_iter()
            .find(|p| p.contains("semantic tags"))
            .unwrap();
        assert!(tag_prompt.contains("def ping():\n    return 'pong'"));
    }

    #[test]
    fn test_file_failure_does_not_stop_walk() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("a.py"), "def broken():\n    pass\n").unwrap();
        fs::write(temp_dir.path().join("b.py"), "def fine():\n    pass\n").unwrap();

        let model = scripted();
        let enricher = GraphEnricher::new(&model).unwrap();
        let mut session = RecordingSession {
            matches: vec![("fine", 1)],
            fail_on: Some("broken"),
            ..Default::default()
        };

        let report = enricher.enhance_knowledge_graph(temp_dir.path(), &mut session);
        match report {
            EnrichmentReport::Completed {
                enhanced_entities,
                files_processed,
                files_failed,
                ..
            } => {
                assert_eq!(enhanced_entities, 1);
                assert_eq!(files_processed, 1);
                assert_eq!(files_failed, 1);
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn test_non_utf8_entity_does_not_abort_file() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("mixed.py"),
            b"def ok():\n    pass\n\ndef bad():\n    # caf\xe9\n    return 1\n",
        )
        .unwrap();

        let model = scripted();
        let enricher = GraphEnricher::new(&model).unwrap();
        let mut session = RecordingSession {
            matches: vec![("ok", 1)],
            ..Default::default()
        };

        let report = enricher.enhance_knowledge_graph(temp_dir.path(), &mut session);
        assert_eq!(
            report,
            EnrichmentReport::Completed {
                enhanced_entities: 1,
                model_used: "codellama:7b-instruct".to_string(),
                files_processed: 1,
                files_failed: 0,
                entities_analyzed: 1,
            }
        );
        assert_eq!(session.calls.len(), 1);
        assert_eq!(session.calls[0].1["name"], json!("ok"));
    }

    #[test]
    fn test_completed_serialization() {
        let report = EnrichmentReport::Completed {
            enhanced_entities: 4,
            model_used: "m".to_string(),
            files_processed: 2,
            files_failed: 0,
            entities_analyzed: 5,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], json!("completed"));
        assert_eq!(value["enhanced_entities"], json!(4));
        assert_eq!(value["model_used"], json!("m"));
    }
}
