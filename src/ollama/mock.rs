/// Scripted language model for testing purposes.
///
/// Answers prompts from a fixed rule list so analysis can be exercised without
/// a running model server.
use std::sync::Mutex;

use super::LanguageModel;

/// A model that replies with the first rule whose needle appears in the prompt.
pub struct ScriptedModel {
    name: String,
    available: bool,
    rules: Vec<(String, String)>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Create an available model with no rules; every prompt gets `""`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: true,
            rules: Vec::new(),
            fallback: String::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A model whose availability check fails.
    #[must_use]
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            available: false,
            ..Self::new(name)
        }
    }

    /// Reply with `answer` to any prompt containing `needle`.
    #[must_use]
    pub fn answer(mut self, needle: impl Into<String>, answer: impl Into<String>) -> Self {
        self.rules.push((needle.into(), answer.into()));
        self
    }

    /// Reply used when no rule matches.
    #[must_use]
    pub fn otherwise(mut self, answer: impl Into<String>) -> Self {
        self.fallback = answer.into();
        self
    }

    /// Every prompt received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn query(&self, prompt: &str, _temperature: f32) -> String {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, answer)| answer.trim().to_string())
            .unwrap_or_else(|| self.fallback.trim().to_string())
    }
}
