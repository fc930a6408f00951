//! Knowledge-graph side of the enrichment flow.
//!
//! The driver only needs something that can execute a parameterized statement
//! and report how many rows it matched: the [`GraphSession`] capability. A
//! Neo4j/Bolt session, the bundled [`SqliteGraph`], or a test double can all
//! stand behind it.
use serde_json::{Map, Value, json};
use thiserror::Error;

pub mod builder;
pub mod enrich;
pub mod sqlite;

pub use builder::{IndexSummary, index_repository};
pub use enrich::{EnrichmentReport, GraphEnricher, SkipReason};
pub use sqlite::{GraphNode, NodeRecord, SqliteGraph};

use crate::extractor::CodeEntity;

/// Named statement parameters (`$name` → value).
pub type Params = Map<String, Value>;

/// Node labels an entity may be stored under.
pub const ENTITY_LABELS: [&str; 3] = ["Class", "Function", "Method"];

/// Writes the model annotations onto every code node with a matching name.
pub const ENRICH_NODE_QUERY: &str = "\
MATCH (n {name: $name})
WHERE n:Class OR n:Function OR n:Method
SET n.ai_purpose = $purpose,
    n.ai_complexity = $complexity,
    n.ai_tags = $tags,
    n.ai_relationships = $relationships
RETURN n";

/// Errors reported by a graph session.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("missing or invalid parameter `{0}`")]
    InvalidParameter(&'static str),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Anything able to execute a parameterized query and report the matched-row count.
pub trait GraphSession {
    fn run(&mut self, query: &str, params: &Params) -> Result<usize, GraphError>;
}

/// Parameters for [`ENRICH_NODE_QUERY`].
pub fn enrichment_params(entity: &CodeEntity, tags: &[String]) -> Params {
    let mut params = Params::new();
    params.insert("name".to_string(), json!(entity.name));
    params.insert("purpose".to_string(), json!(entity.purpose));
    params.insert("complexity".to_string(), json!(entity.complexity.as_str()));
    params.insert("tags".to_string(), json!(tags));
    params.insert("relationships".to_string(), json!(entity.relationships));
    params
}
