use tree_sitter::Language;

pub struct LanguageConfig {
    pub name: &'static str,
    pub language: Language,
    pub extensions: &'static [&'static str],
    /// Captures `@name` plus one of `@class` / `@function` per definition.
    pub query: &'static str,
    /// Node kinds that open a class scope.
    pub class_kinds: &'static [&'static str],
    /// Node kinds that open a function scope.
    pub function_kinds: &'static [&'static str],
}

impl LanguageConfig {
    pub fn get_all() -> Vec<LanguageConfig> {
        vec![python_config()]
    }

    pub fn get_by_extension(ext: &str) -> Option<LanguageConfig> {
        Self::get_all()
            .into_iter()
            .find(|c| c.extensions.contains(&ext))
    }

    pub fn get_by_name(name: &str) -> Option<LanguageConfig> {
        Self::get_all().into_iter().find(|c| c.name == name)
    }

    /// Whether any configured language handles this extension.
    pub fn is_supported_extension(ext: &str) -> bool {
        Self::get_all().iter().any(|c| c.extensions.contains(&ext))
    }
}

fn python_config() -> LanguageConfig {
    LanguageConfig {
        name: "python",
        language: tree_sitter_python::LANGUAGE.into(),
        extensions: &["py"],
        query: r#"
(function_definition
  name: (identifier) @name) @function

(class_definition
  name: (identifier) @name) @class
"#,
        class_kinds: &["class_definition"],
        function_kinds: &["function_definition"],
    }
}
