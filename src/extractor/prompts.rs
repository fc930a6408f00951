//! Prompt templates sent to the model for each entity.

use super::entity::EntityKind;

pub fn purpose_prompt(code: &str, entity_name: &str, kind: EntityKind, lang: &str) -> String {
    format!(
        "
Analyze this {kind} and provide a concise 1-2 sentence description of its purpose:

```{lang}
{code}
```

Entity name: {entity_name}
Type: {kind}

Provide only the purpose description, no additional text:
"
    )
}

pub fn relationships_prompt(code: &str, entity_name: &str, lang: &str) -> String {
    format!(
        "
Analyze this code and identify what other classes, functions, or modules it depends on or interacts with:

```{lang}
{code}
```

Entity: {entity_name}

List only the names of dependencies/relationships, one per line, no explanations:
"
    )
}

pub fn complexity_prompt(code: &str, lang: &str) -> String {
    format!(
        "
Analyze this code and rate its complexity as one of: LOW, MEDIUM, HIGH

```{lang}
{code}
```

Consider factors like:
- Number of branches/conditions
- Nested loops
- Function calls
- Logic complexity

Respond with only: LOW, MEDIUM, or HIGH
"
    )
}

pub fn tags_prompt(code: &str, entity_name: &str, lang: &str) -> String {
    format!(
        "
Analyze this code and provide 3-5 semantic tags that describe its functionality:

```{lang}
{code}
```

Entity: {entity_name}

Examples of good tags: data-processing, api-client, validation, authentication, database, utility, algorithm, etc.

Provide only the tags, comma-separated:
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_code_and_names() {
        let code = "def f():\n    return 1";
        let p = purpose_prompt(code, "f", EntityKind::Function, "python");
        assert!(p.contains("```python\ndef f():\n    return 1\n```"));
        assert!(p.contains("Entity name: f"));
        assert!(p.contains("Type: function"));

        assert!(relationships_prompt(code, "f", "python").contains("one per line"));
        assert!(complexity_prompt(code, "python").contains("LOW, MEDIUM, or HIGH"));
        assert!(tags_prompt(code, "f", "python").contains("comma-separated"));
    }
}
