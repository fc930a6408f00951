use super::entity::{CodeEntity, Complexity, EntityKind, ParsedEntity};
use super::parser::EntityParser;
use super::{AnalyzerError, prompts};
use crate::ollama::{DEFAULT_TEMPERATURE, LanguageModel};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Language tag used in prompt code fences.
const PROMPT_LANG: &str = "python";

/// Runs the per-entity prompts against a [`LanguageModel`].
///
/// Each entity is analyzed in isolation with three independent queries
/// (purpose, relationships, complexity); nothing is batched across entities.
pub struct EntityAnalyzer<'a, M: LanguageModel + ?Sized> {
    model: &'a M,
    parser: EntityParser,
    temperature: f32,
}

impl<'a, M: LanguageModel + ?Sized> EntityAnalyzer<'a, M> {
    pub fn new(model: &'a M) -> Result<Self, AnalyzerError> {
        Ok(Self {
            model,
            parser: EntityParser::new()?,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &M {
        self.model
    }

    pub fn extract_code_purpose(&self, code: &str, entity_name: &str, kind: EntityKind) -> String {
        let prompt = prompts::purpose_prompt(code, entity_name, kind, PROMPT_LANG);
        self.model.query(&prompt, self.temperature)
    }

    /// Dependencies named by the model, one per response line.
    pub fn extract_relationships(&self, code: &str, entity_name: &str) -> Vec<String> {
        let prompt = prompts::relationships_prompt(code, entity_name, PROMPT_LANG);
        split_lines(&self.model.query(&prompt, self.temperature))
    }

    pub fn assess_complexity(&self, code: &str) -> Complexity {
        let prompt = prompts::complexity_prompt(code, PROMPT_LANG);
        Complexity::from_model_output(&self.model.query(&prompt, self.temperature))
    }

    /// Lowercased, comma-separated tags describing the code.
    pub fn extract_semantic_tags(&self, code: &str, entity_name: &str) -> Vec<String> {
        let prompt = prompts::tags_prompt(code, entity_name, PROMPT_LANG);
        split_tags(&self.model.query(&prompt, self.temperature))
    }

    /// Annotate one parsed entity.
    pub fn analyze_entity(&self, parsed: ParsedEntity) -> CodeEntity {
        debug!("Analyzing {} {}", parsed.kind, parsed.name);
        let purpose = self.extract_code_purpose(&parsed.source, &parsed.name, parsed.kind);
        let relationships = self.extract_relationships(&parsed.source, &parsed.name);
        let complexity = self.assess_complexity(&parsed.source);
        CodeEntity::from_parsed(parsed, purpose, relationships, complexity)
    }

    /// Parse Python source and annotate every class and function in it.
    pub fn analyze_source(&self, source: &str) -> Result<Vec<CodeEntity>, AnalyzerError> {
        let parsed = self.parser.parse_code(source.as_bytes(), PROMPT_LANG)?;
        Ok(self.analyze_all(parsed))
    }

    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<CodeEntity>, AnalyzerError> {
        let path = path.as_ref();
        let parsed = self.parser.parse_file(path)?;
        info!("Analyzing {} entities in {}", parsed.len(), path.display());
        Ok(self.analyze_all(parsed))
    }

    /// Analyze several files; a file that fails is logged and skipped.
    pub fn analyze_files(&self, files: &[PathBuf]) -> Vec<CodeEntity> {
        let mut entities = Vec::new();
        for file in files {
            match self.analyze_file(file) {
                Ok(found) => entities.extend(found),
                Err(e) => error!("Error analyzing {}: {e}", file.display()),
            }
        }
        entities
    }

    fn analyze_all(&self, parsed: Vec<ParsedEntity>) -> Vec<CodeEntity> {
        parsed.into_iter().map(|p| self.analyze_entity(p)).collect()
    }
}

fn split_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_tags(response: &str) -> Vec<String> {
    response
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
