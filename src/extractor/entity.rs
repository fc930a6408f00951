use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of definition an entity was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Class,
    Function,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Function => "function",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complexity rating assigned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "LOW",
            Complexity::Medium => "MEDIUM",
            Complexity::High => "HIGH",
        }
    }

    /// Interpret a raw model answer, falling back to [`Complexity::Medium`]
    /// for anything that is not exactly one of the three ratings.
    #[must_use]
    pub fn from_model_output(output: &str) -> Self {
        output.parse().unwrap_or_default()
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(Complexity::Low),
            "MEDIUM" => Ok(Complexity::Medium),
            "HIGH" => Ok(Complexity::High),
            other => Err(format!("unknown complexity: {other}")),
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A class or function located in a source file, before any model analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntity {
    pub name: String,
    pub kind: EntityKind,
    /// Enclosing class for methods.
    pub parent: Option<String>,
    /// Exact source text of the definition.
    pub source: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl ParsedEntity {
    /// Graph label: `Class`, `Method` (function in a class body) or `Function`.
    pub fn graph_label(&self) -> &'static str {
        graph_label(self.kind, self.parent.is_some())
    }
}

/// A parsed entity annotated by the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub purpose: String,
    pub relationships: Vec<String>,
    pub complexity: Complexity,
    /// Placeholder; never populated.
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(skip)]
    pub source: String,
}

impl CodeEntity {
    pub fn from_parsed(
        parsed: ParsedEntity,
        purpose: String,
        relationships: Vec<String>,
        complexity: Complexity,
    ) -> Self {
        Self {
            name: parsed.name,
            kind: parsed.kind,
            purpose,
            relationships,
            complexity,
            dependencies: Vec::new(),
            parent: parsed.parent,
            start_line: parsed.start_line,
            end_line: parsed.end_line,
            source: parsed.source,
        }
    }

    /// Graph label of the node this entity corresponds to.
    pub fn graph_label(&self) -> &'static str {
        graph_label(self.kind, self.parent.is_some())
    }
}

fn graph_label(kind: EntityKind, in_class: bool) -> &'static str {
    match (kind, in_class) {
        (EntityKind::Class, _) => "Class",
        (EntityKind::Function, true) => "Method",
        (EntityKind::Function, false) => "Function",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complexity_exact_values() {
        assert_eq!(Complexity::from_model_output("LOW"), Complexity::Low);
        assert_eq!(Complexity::from_model_output("MEDIUM"), Complexity::Medium);
        assert_eq!(Complexity::from_model_output("HIGH"), Complexity::High);
    }

    #[test]
    fn test_complexity_case_and_whitespace() {
        assert_eq!(Complexity::from_model_output("  low\n"), Complexity::Low);
        assert_eq!(Complexity::from_model_output("High"), Complexity::High);
    }

    #[test]
    fn test_complexity_fallback() {
        assert_eq!(Complexity::from_model_output("banana"), Complexity::Medium);
        assert_eq!(Complexity::from_model_output(""), Complexity::Medium);
        assert_eq!(Complexity::from_model_output("LOW."), Complexity::Medium);
        assert_eq!(
            Complexity::from_model_output("The complexity is HIGH"),
            Complexity::Medium
        );
    }

    #[test]
    fn test_complexity_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Complexity::High).unwrap(), json!("HIGH"));
        assert_eq!(Complexity::Low.to_string(), "LOW");
    }

    #[test]
    fn test_code_entity_serialization() {
        let parsed = ParsedEntity {
            name: "area".to_string(),
            kind: EntityKind::Function,
            parent: Some("Circle".to_string()),
            source: "def area(self):\n    return 3.14 * self.r ** 2".to_string(),
            start_line: 4,
            end_line: 5,
        };
        let entity = CodeEntity::from_parsed(
            parsed,
            "Computes the area.".to_string(),
            vec!["math".to_string()],
            Complexity::Low,
        );

        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(value["type"], json!("function"));
        assert_eq!(value["complexity"], json!("LOW"));
        assert_eq!(value["dependencies"], json!([]));
        assert_eq!(value["parent"], json!("Circle"));
        assert!(value.get("source").is_none());
        assert_eq!(entity.graph_label(), "Method");
    }

    #[test]
    fn test_graph_labels() {
        let mut entity = CodeEntity::from_parsed(
            ParsedEntity {
                name: "Circle".to_string(),
                kind: EntityKind::Class,
                parent: None,
                source: String::new(),
                start_line: 1,
                end_line: 1,
            },
            String::new(),
            Vec::new(),
            Complexity::Medium,
        );
        assert_eq!(entity.graph_label(), "Class");
        entity.kind = EntityKind::Function;
        assert_eq!(entity.graph_label(), "Function");
    }
}
