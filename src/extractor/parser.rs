use super::entity::{EntityKind, ParsedEntity};
use super::languages::LanguageConfig;
use super::AnalyzerError;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::warn;
use tree_sitter::{Node, Parser, Query, QueryCursor, StreamingIterator};

/// Tree-sitter based extractor of class and function definitions.
pub struct EntityParser {
    queries: HashMap<&'static str, Query>,
}

impl EntityParser {
    pub fn new() -> Result<Self, AnalyzerError> {
        let mut queries = HashMap::new();
        for config in LanguageConfig::get_all() {
            let query = Query::new(&config.language, config.query)
                .map_err(|e| AnalyzerError::Parse(format!("invalid {} query: {e}", config.name)))?;
            queries.insert(config.name, query);
        }
        Ok(Self { queries })
    }

    pub fn parse_file<P: AsRef<Path>>(&self, filepath: P) -> Result<Vec<ParsedEntity>, AnalyzerError> {
        let filepath = filepath.as_ref();
        let ext = filepath.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config = LanguageConfig::get_by_extension(ext)
            .ok_or_else(|| AnalyzerError::UnsupportedFile(filepath.display().to_string()))?;

        let content = fs::read(filepath).map_err(|source| AnalyzerError::Read {
            path: filepath.display().to_string(),
            source,
        })?;

        self.parse_code(&content, config.name)
    }

    pub fn parse_code(
        &self,
        source: &[u8],
        lang_name: &str,
    ) -> Result<Vec<ParsedEntity>, AnalyzerError> {
        let config = LanguageConfig::get_by_name(lang_name)
            .ok_or_else(|| AnalyzerError::UnsupportedLanguage(lang_name.to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&config.language)
            .map_err(|e| AnalyzerError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalyzerError::Parse("failed to parse code".to_string()))?;

        self.extract_entities(tree.root_node(), source, &config)
    }

    fn extract_entities(
        &self,
        root: Node,
        source: &[u8],
        config: &LanguageConfig,
    ) -> Result<Vec<ParsedEntity>, AnalyzerError> {
        let query = self
            .queries
            .get(config.name)
            .ok_or_else(|| AnalyzerError::UnsupportedLanguage(config.name.to_string()))?;
        let mut cursor = QueryCursor::new();

        let mut found: Vec<(usize, ParsedEntity)> = Vec::new();
        let mut seen = HashSet::new();

        let mut matches = cursor.matches(query, root, source);
        while let Some(m) = matches.next() {
            let mut main_node = None;
            let mut kind = None;
            let mut name = None;

            for cap in m.captures {
                match query.capture_names()[cap.index as usize] {
                    "name" => name = cap.node.utf8_text(source).ok().map(str::to_string),
                    "class" => {
                        main_node = Some(cap.node);
                        kind = Some(EntityKind::Class);
                    }
                    "function" => {
                        main_node = Some(cap.node);
                        kind = Some(EntityKind::Function);
                    }
                    _ => {}
                }
            }

            let (Some(node), Some(kind), Some(name)) = (main_node, kind, name) else {
                continue;
            };
            if !seen.insert((node.start_byte(), node.end_byte())) {
                continue;
            }

            let text = match node.utf8_text(source) {
                Ok(text) => text.to_string(),
                Err(e) => {
                    warn!("Skipping {kind} {name}: source is not valid UTF-8 ({e})");
                    continue;
                }
            };

            found.push((
                node.start_byte(),
                ParsedEntity {
                    parent: enclosing_class(node, source, config),
                    name,
                    kind,
                    source: text,
                    start_line: node.start_position().row + 1,
                    end_line: node.end_position().row + 1,
                },
            ));
        }

        found.sort_by_key(|(start, _)| *start);
        Ok(found.into_iter().map(|(_, entity)| entity).collect())
    }
}

/// Name of the class whose body directly holds `node`.
///
/// Stops at the first enclosing function, so nested helpers inside a method
/// are not reported as methods.
fn enclosing_class(node: Node, source: &[u8], config: &LanguageConfig) -> Option<String> {
    let mut parent = node.parent();
    while let Some(p) = parent {
        let kind = p.kind();
        if config.function_kinds.contains(&kind) {
            return None;
        }
        if config.class_kinds.contains(&kind) {
            return p
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
                .map(str::to_string);
        }
        parent = p.parent();
    }
    None
}
