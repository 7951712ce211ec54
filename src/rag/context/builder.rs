//! Context builder
//!
//! Assembles retrieved documents into a formatted context block and the
//! final prompt sent to the language model.

use crate::data::Document;

use super::templates::PromptTemplates;

/// Builds prompt context from retrieved documents
pub struct ContextBuilder {
    templates: PromptTemplates,
}

impl ContextBuilder {
    /// Create a new context builder with default templates
    pub fn new() -> Self {
        Self {
            templates: PromptTemplates::default(),
        }
    }

    /// Create a context builder with custom templates
    pub fn with_templates(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    /// Build a context string from retrieved documents.
    ///
    /// Documents that would push the context past `max_chars` are dropped;
    /// the cap bounds the token cost of the downstream prompt.
    pub fn build(&self, documents: &[Document], max_chars: usize) -> String {
        let mut context = String::new();
        let mut total_chars = 0;

        for document in documents {
            let entry = format!(
                "source: {}\ncontent: {}\n\n",
                document.source,
                document.text.trim()
            );

            if total_chars + entry.len() > max_chars {
                break;
            }

            context.push_str(&entry);
            total_chars += entry.len();
        }

        context.trim_end().to_string()
    }

    /// Format the complete prompt from a query and a pre-built context
    pub fn format_prompt(
        &self,
        query: &str,
        context: &str,
        template_name: &str,
        include_citations: bool,
    ) -> String {
        let template = self.templates.get(template_name);

        let citation_instruction = if include_citations {
            "Cite the source link of every piece of content you use."
        } else {
            ""
        };

        template
            .replace("{context}", context)
            .replace("{query}", query)
            .replace("{citation_instruction}", citation_instruction)
    }

    /// Format the keyword-extraction prompt for lexical query routing
    pub fn format_keyword_prompt(&self, query: &str) -> String {
        self.templates.get("keywords").replace("{query}", query)
    }

    /// Build and format a complete prompt from retrieved documents
    pub fn build_prompt(
        &self,
        query: &str,
        documents: &[Document],
        max_context_chars: usize,
        template_name: &str,
        include_citations: bool,
    ) -> String {
        let context = self.build(documents, max_context_chars);
        self.format_prompt(query, &context, template_name, include_citations)
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_context() {
        let builder = ContextBuilder::new();
        let documents = vec![
            Document::new("api/ridge", "Ridge regression docs"),
            Document::new("api/svm", "Support vector machine docs"),
        ];

        let context = builder.build(&documents, 1000);

        assert!(context.contains("source: api/ridge"));
        assert!(context.contains("Ridge regression docs"));
        assert!(context.contains("source: api/svm"));
    }

    #[test]
    fn test_build_context_respects_max_chars() {
        let builder = ContextBuilder::new();
        let documents = vec![
            Document::new("a", "x".repeat(100)),
            Document::new("b", "y".repeat(100)),
        ];

        let context = builder.build(&documents, 130);

        assert!(context.contains("source: a"));
        assert!(!context.contains("source: b"));
    }

    #[test]
    fn test_format_prompt() {
        let builder = ContextBuilder::new();

        let prompt = builder.format_prompt("What is Ridge?", "source: api/ridge", "default", true);

        assert!(prompt.contains("What is Ridge?"));
        assert!(prompt.contains("source: api/ridge"));
        assert!(prompt.contains("Cite the source"));
    }

    #[test]
    fn test_format_prompt_without_citations() {
        let builder = ContextBuilder::new();

        let prompt = builder.format_prompt("What is Ridge?", "ctx", "concise", false);

        assert!(prompt.contains("What is Ridge?"));
        assert!(!prompt.contains("Cite the source"));
    }

    #[test]
    fn test_format_keyword_prompt() {
        let builder = ContextBuilder::new();

        let prompt = builder.format_keyword_prompt("how do I fit a ridge model?");

        assert!(prompt.contains("how do I fit a ridge model?"));
        assert!(prompt.contains("Keywords:"));
    }
}
