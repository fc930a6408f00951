/// End-to-end tests against a loopback Ollama stand-in.
///
/// Covers the HTTP contract of the client and the full
/// index → enrich flow on a SQLite graph.
mod common;

use common::{Behavior, FakeOllama, canned_responder};
use kgenrich::extractor::{Complexity, EntityAnalyzer, EntityParser};
use kgenrich::graph::{EnrichmentReport, GraphEnricher, SqliteGraph, index_repository};
use kgenrich::ollama::{LanguageModel, OllamaClient, OllamaError};
use std::fs;
use tempfile::tempdir;

const MODEL: &str = "codellama:7b-instruct";

const SHAPES_PY: &str = "\
import math

class Square:
    def __init__(self, side):
        self.side = side

    def area(self):
        return self.side ** 2

def make(side):
    return Square(side)
";

#[test]
fn test_available_when_family_installed() {
    let server = FakeOllama::start(Behavior::with_models(
        &["llama3:8b", "codellama:13b"],
        canned_responder,
    ));
    let client = OllamaClient::new(&server.config(MODEL)).unwrap();
    assert!(client.is_available());
    assert_eq!(server.tag_requests(), 1);
}

#[test]
fn test_unavailable_when_family_missing() {
    let server = FakeOllama::start(Behavior::with_models(&["llama3:8b"], canned_responder));
    let client = OllamaClient::new(&server.config(MODEL)).unwrap();
    assert!(!client.is_available());
}

#[test]
fn test_unavailable_on_non_200() {
    let mut behavior = Behavior::with_models(&["codellama:7b-instruct"], canned_responder);
    behavior.tags_status = 404;
    let server = FakeOllama::start(behavior);
    let client = OllamaClient::new(&server.config(MODEL)).unwrap();

    assert!(!client.is_available());
    assert!(matches!(
        client.list_models(),
        Err(OllamaError::Status { status: 404, .. })
    ));
}

#[test]
fn test_generate_request_and_trimmed_response() {
    let server = FakeOllama::start(Behavior::with_models(&[MODEL], canned_responder));
    // Trailing slash on the base URL is tolerated.
    let mut config = server.config(MODEL);
    config.url = format!("{}/", server.url());
    let client = OllamaClient::new(&config).unwrap();

    let answer = client.query("Describe this", 0.3);
    assert_eq!(answer, "Computes a geometric quantity.");

    let bodies = server.generate_bodies();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["model"], MODEL);
    assert_eq!(body["prompt"], "Describe this");
    assert_eq!(body["stream"], false);
    let options = &body["options"];
    assert!((options["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    assert!((options["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    assert!((options["repeat_penalty"].as_f64().unwrap() - 1.1).abs() < 1e-6);
}

#[test]
fn test_generate_failure_yields_empty_string() {
    let mut behavior = Behavior::with_models(&[MODEL], canned_responder);
    behavior.generate_status = 500;
    let server = FakeOllama::start(behavior);
    let client = OllamaClient::new(&server.config(MODEL)).unwrap();

    assert_eq!(client.query("anything", 0.1), "");
    assert!(matches!(
        client.generate("anything", 0.1),
        Err(OllamaError::Status { status: 500, .. })
    ));
}

#[test]
fn test_analyzer_over_http() {
    let server = FakeOllama::start(Behavior::with_models(&[MODEL], canned_responder));
    let client = OllamaClient::new(&server.config(MODEL)).unwrap();
    let analyzer = EntityAnalyzer::new(&client).unwrap();

    let entities = analyzer.analyze_source(SHAPES_PY).unwrap();
    let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Square", "__init__", "area", "make"]);

    let area = &entities[2];
    assert_eq!(area.parent.as_deref(), Some("Square"));
    assert_eq!(area.purpose, "Computes a geometric quantity.");
    assert_eq!(area.relationships, ["math", "Square"]);
    assert_eq!(area.complexity, Complexity::Low);
    assert!(area.dependencies.is_empty());

    // Three independent prompts per entity.
    assert_eq!(server.generate_bodies().len(), 3 * entities.len());
}

#[test]
fn test_index_then_enrich() {
    let repo = tempdir().unwrap();
    fs::create_dir_all(repo.path().join("geo")).unwrap();
    fs::write(repo.path().join("geo/shapes.py"), SHAPES_PY).unwrap();

    let db_dir = tempdir().unwrap();
    let mut graph = SqliteGraph::open(db_dir.path().join("graph.db")).unwrap();
    let parser = EntityParser::new().unwrap();
    let summary = index_repository(&graph, &parser, repo.path()).unwrap();
    assert_eq!(summary.classes, 1);
    assert_eq!(summary.methods, 2);
    assert_eq!(summary.functions, 1);

    let server = FakeOllama::start(Behavior::with_models(&[MODEL], canned_responder));
    let client = OllamaClient::new(&server.config(MODEL)).unwrap();
    let enricher = GraphEnricher::new(&client).unwrap();

    let report = enricher.enhance_knowledge_graph(repo.path(), &mut graph);
    assert_eq!(
        report,
        EnrichmentReport::Completed {
            enhanced_entities: 4,
            model_used: MODEL.to_string(),
            files_processed: 1,
            files_failed: 0,
            entities_analyzed: 4,
        }
    );

    let area = &graph.nodes_named("area").unwrap()[0];
    assert_eq!(area.label, "Method");
    assert_eq!(area.ai_purpose.as_deref(), Some("Computes a geometric quantity."));
    assert_eq!(area.ai_complexity.as_deref(), Some("LOW"));
    assert_eq!(area.ai_tags, ["geometry", "math"]);
    assert_eq!(area.ai_relationships, ["math", "Square"]);
    assert!(area.enriched_at.is_some());

    // Tag prompts carry the real entity source.
    let bodies = server.generate_bodies();
    assert!(bodies.iter().any(|b| {
        let prompt = b["prompt"].as_str().unwrap_or_default();
        prompt.contains("semantic tags") && prompt.contains("return self.side ** 2")
    }));
}

#[test]
fn test_repeated_names_count_each_entity_once() {
    let repo = tempdir().unwrap();
    for file in ["a.py", "b.py", "c.py"] {
        fs::write(
            repo.path().join(file),
            "class X:\n    def __init__(self):\n        pass\n",
        )
        .unwrap();
    }

    let mut graph = SqliteGraph::open_in_memory().unwrap();
    let parser = EntityParser::new().unwrap();
    index_repository(&graph, &parser, repo.path()).unwrap();
    assert_eq!(graph.node_count().unwrap(), 6);

    let server = FakeOllama::start(Behavior::with_models(&[MODEL], canned_responder));
    let client = OllamaClient::new(&server.config(MODEL)).unwrap();
    let report = GraphEnricher::new(&client)
        .unwrap()
        .enhance_knowledge_graph(repo.path(), &mut graph);

    let (enhanced_entities, entities_analyzed) = match report {
        EnrichmentReport::Completed {
            enhanced_entities,
            entities_analyzed,
            ..
        } => (enhanced_entities, entities_analyzed),
        other => panic!("unexpected report: {other:?}"),
    };
    assert_eq!(entities_analyzed, 6);
    assert_eq!(enhanced_entities, 6);
    assert!(enhanced_entities <= graph.node_count().unwrap());
}

#[test]
fn test_enrich_skipped_when_model_missing() {
    let repo = tempdir().unwrap();
    fs::write(repo.path().join("shapes.py"), SHAPES_PY).unwrap();

    let mut graph = SqliteGraph::open_in_memory().unwrap();
    let parser = EntityParser::new().unwrap();
    index_repository(&graph, &parser, repo.path()).unwrap();

    let server = FakeOllama::start(Behavior::with_models(&["mistral:7b"], canned_responder));
    let client = OllamaClient::new(&server.config(MODEL)).unwrap();
    let report = GraphEnricher::new(&client)
        .unwrap()
        .enhance_knowledge_graph(repo.path(), &mut graph);

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({"status": "skipped", "reason": "ollama_unavailable"})
    );
    assert!(server.generate_bodies().is_empty());
    assert!(graph.nodes_named("area").unwrap()[0].ai_purpose.is_none());
}
