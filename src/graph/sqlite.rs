//! Local knowledge graph stored in SQLite.
use super::{ENRICH_NODE_QUERY, ENTITY_LABELS, GraphError, GraphSession, Params};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use serde_json::Value;
use std::path::Path;
use tracing::info;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL,
    name TEXT NOT NULL,
    file TEXT NOT NULL DEFAULT '',
    start_line INTEGER,
    end_line INTEGER,
    ai_purpose TEXT,
    ai_complexity TEXT,
    ai_tags TEXT,
    ai_relationships TEXT,
    enriched_at DATETIME,
    UNIQUE(label, name, file)
);

CREATE INDEX IF NOT EXISTS idx_nodes_name ON nodes(name);
CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes(label);
"#;

const NODE_COLUMNS: &str = "id, label, name, file, start_line, end_line, ai_purpose, \
     ai_complexity, ai_tags, ai_relationships, enriched_at";

/// A node to create or refresh.
#[derive(Debug, Clone)]
pub struct NodeRecord<'a> {
    pub label: &'a str,
    pub name: &'a str,
    pub file: &'a str,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
}

/// A stored node with its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: i64,
    pub label: String,
    pub name: String,
    pub file: String,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub ai_purpose: Option<String>,
    pub ai_complexity: Option<String>,
    pub ai_tags: Vec<String>,
    pub ai_relationships: Vec<String>,
    pub enriched_at: Option<DateTime<Utc>>,
}

/// A wrapper around a SQLite connection holding code-structure nodes.
pub struct SqliteGraph {
    conn: Connection,
}

impl SqliteGraph {
    /// Open a graph database at the given path and initialize the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let path = path.as_ref();
        info!("Opening graph database: {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Open an in-memory graph (useful for testing).
    pub fn open_in_memory() -> Result<Self, GraphError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Insert a node, or refresh its location if it already exists.
    pub fn upsert_node(&self, node: &NodeRecord<'_>) -> Result<i64, GraphError> {
        let id = self.conn.query_row(
            r#"
            INSERT INTO nodes (label, name, file, start_line, end_line)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(label, name, file) DO UPDATE SET
                start_line = excluded.start_line,
                end_line = excluded.end_line
            RETURNING id
            "#,
            params![
                node.label,
                node.name,
                node.file,
                node.start_line.map(|x| x as i64),
                node.end_line.map(|x| x as i64),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// All nodes with the given name, ordered by id.
    pub fn nodes_named(&self, name: &str) -> Result<Vec<GraphNode>, GraphError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE name = ? ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![name], map_raw_node)?;

        let mut nodes = Vec::new();
        for row in rows {
            nodes.push(row?.decode()?);
        }
        Ok(nodes)
    }

    pub fn node_count(&self) -> Result<usize, GraphError> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM nodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn enrich_nodes(&self, params: &Params) -> Result<usize, GraphError> {
        let name = str_param(params, "name")?;
        let purpose = str_param(params, "purpose")?;
        let complexity = str_param(params, "complexity")?;
        let tags = array_param(params, "tags")?
            .ok_or(GraphError::InvalidParameter("tags"))?;
        let relationships = array_param(params, "relationships")?;

        let labels = ENTITY_LABELS
            .iter()
            .map(|l| format!("'{l}'"))
            .collect::<Vec<_>>()
            .join(", ");

        let updated = self.conn.execute(
            &format!(
                r#"
                UPDATE nodes SET
                    ai_purpose = ?1,
                    ai_complexity = ?2,
                    ai_tags = ?3,
                    ai_relationships = COALESCE(?4, ai_relationships),
                    enriched_at = ?5
                WHERE name = ?6 AND label IN ({labels})
                "#
            ),
            params![purpose, complexity, tags, relationships, Utc::now(), name],
        )?;
        Ok(updated)
    }
}

impl GraphSession for SqliteGraph {
    /// Only [`ENRICH_NODE_QUERY`] is understood; whitespace differences are ignored.
    fn run(&mut self, query: &str, params: &Params) -> Result<usize, GraphError> {
        if normalize(query) != normalize(ENRICH_NODE_QUERY) {
            return Err(GraphError::UnsupportedStatement(
                query.lines().next().unwrap_or_default().trim().to_string(),
            ));
        }
        self.enrich_nodes(params)
    }
}

fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn str_param<'p>(params: &'p Params, key: &'static str) -> Result<&'p str, GraphError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or(GraphError::InvalidParameter(key))
}

/// A string-array parameter re-encoded as JSON text; `None` when absent.
fn array_param(params: &Params, key: &'static str) -> Result<Option<String>, GraphError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => {
            Ok(Some(serde_json::to_string(items)?))
        }
        Some(_) => Err(GraphError::InvalidParameter(key)),
    }
}

struct RawNode {
    id: i64,
    label: String,
    name: String,
    file: String,
    start_line: Option<i64>,
    end_line: Option<i64>,
    ai_purpose: Option<String>,
    ai_complexity: Option<String>,
    ai_tags: Option<String>,
    ai_relationships: Option<String>,
    enriched_at: Option<DateTime<Utc>>,
}

fn map_raw_node(row: &Row<'_>) -> rusqlite::Result<RawNode> {
    Ok(RawNode {
        id: row.get(0)?,
        label: row.get(1)?,
        name: row.get(2)?,
        file: row.get(3)?,
        start_line: row.get(4)?,
        end_line: row.get(5)?,
        ai_purpose: row.get(6)?,
        ai_complexity: row.get(7)?,
        ai_tags: row.get(8)?,
        ai_relationships: row.get(9)?,
        enriched_at: row.get(10)?,
    })
}

impl RawNode {
    fn decode(self) -> Result<GraphNode, GraphError> {
        let list = |raw: Option<String>| -> Result<Vec<String>, GraphError> {
            match raw {
                Some(text) => Ok(serde_json::from_str(&text)?),
                None => Ok(Vec::new()),
            }
        };

        Ok(GraphNode {
            id: self.id,
            label: self.label,
            name: self.name,
            file: self.file,
            start_line: self.start_line.map(|x| x as usize),
            end_line: self.end_line.map(|x| x as usize),
            ai_purpose: self.ai_purpose,
            ai_complexity: self.ai_complexity,
            ai_tags: list(self.ai_tags)?,
            ai_relationships: list(self.ai_relationships)?,
            enriched_at: self.enriched_at,
        })
    }
}
