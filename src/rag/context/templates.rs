//! Prompt templates
//!
//! Configurable templates for formatting prompts with retrieved context and
//! user queries.

use std::collections::HashMap;

/// Named prompt templates
pub struct PromptTemplates {
    templates: HashMap<String, String>,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        let mut templates = HashMap::new();

        // Default documentation-answering template
        templates.insert(
            "default".to_string(),
            concat!(
                "You are an expert on this software library and answer questions about ",
                "its usage and API. Answer the query below using the additional provided ",
                "content. The additional content is composed of the link to the source ",
                "and the extracted contextual information. Be succinct.\n\n",
                "{citation_instruction}\n\n",
                "Context:\n{context}\n\n",
                "Query: {query}\n\n",
                "Answer:"
            )
            .to_string(),
        );

        // Concise template
        templates.insert(
            "concise".to_string(),
            concat!(
                "Answer the following question using only the provided context. ",
                "Be concise and direct.\n\n",
                "Context:\n{context}\n\n",
                "Query: {query}\n\n",
                "Answer:"
            )
            .to_string(),
        );

        // Keyword extraction template, used for lexical query routing
        templates.insert(
            "keywords".to_string(),
            concat!(
                "Extract a list of keywords from the query below for a context of ",
                "software library documentation. Answer with the keywords only, ",
                "separated by spaces.\n\n",
                "Query: {query}\n\n",
                "Keywords:"
            )
            .to_string(),
        );

        Self { templates }
    }
}

impl PromptTemplates {
    /// Create a new empty template collection
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Get a template by name, falling back to "default" if not found
    pub fn get(&self, name: &str) -> &str {
        self.templates
            .get(name)
            .or_else(|| self.templates.get("default"))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Register a custom template
    pub fn register(&mut self, name: &str, template: &str) {
        self.templates.insert(name.to_string(), template.to_string());
    }

    /// Check if a template exists
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates() {
        let templates = PromptTemplates::default();

        assert!(templates.contains("default"));
        assert!(templates.contains("concise"));
        assert!(templates.contains("keywords"));
    }

    #[test]
    fn test_get_template() {
        let templates = PromptTemplates::default();

        let default = templates.get("default");
        assert!(default.contains("{context}"));
        assert!(default.contains("{query}"));
    }

    #[test]
    fn test_fallback_to_default() {
        let templates = PromptTemplates::default();

        assert_eq!(templates.get("nonexistent"), templates.get("default"));
    }

    #[test]
    fn test_custom_template() {
        let mut templates = PromptTemplates::default();

        templates.register("custom", "Custom: {query}");
        assert_eq!(templates.get("custom"), "Custom: {query}");
    }
}
