//! Corpus loaders for various file formats
//!
//! Supports plain text, markdown, and JSONL chunk dumps. A JSONL file is
//! expected to carry one `{"source": ..., "text": ...}` record per line, the
//! format produced by the documentation scrapers.

use crate::data::Document;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Trait for loading documents from a file
pub trait DocumentLoader {
    /// Load all documents contained in the given file
    fn load(&self, path: &Path) -> Result<Vec<Document>>;

    /// Check if this loader can handle the given file extension
    fn can_load(&self, path: &Path) -> bool;
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

/// Plain text loader; the whole file becomes one document
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let text = fs::read_to_string(path)
            .context(format!("Failed to read text file: {:?}", path))?;
        let source = path.to_string_lossy().to_string();

        Ok(vec![Document::new(source, text)])
    }

    fn can_load(&self, path: &Path) -> bool {
        has_extension(path, &["txt"])
    }
}

/// Markdown loader; the whole file becomes one document
pub struct MarkdownLoader;

impl DocumentLoader for MarkdownLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let text = fs::read_to_string(path)
            .context(format!("Failed to read markdown file: {:?}", path))?;
        let source = path.to_string_lossy().to_string();

        Ok(vec![Document::new(source, text)])
    }

    fn can_load(&self, path: &Path) -> bool {
        has_extension(path, &["md", "markdown"])
    }
}

#[derive(Deserialize)]
struct JsonlRecord {
    source: String,
    text: String,
}

/// JSONL loader; every line becomes one document
pub struct JsonlLoader;

impl DocumentLoader for JsonlLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read JSONL file: {:?}", path))?;

        let mut documents = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: JsonlRecord = serde_json::from_str(line).context(format!(
                "Invalid JSONL record at {:?}:{}",
                path,
                line_no + 1
            ))?;
            documents.push(Document::new(record.source, record.text));
        }

        Ok(documents)
    }

    fn can_load(&self, path: &Path) -> bool {
        has_extension(path, &["jsonl"])
    }
}

/// Multi-format loader that delegates to specific loaders
pub struct MultiFormatLoader {
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl MultiFormatLoader {
    /// Create a new multi-format loader with all supported loaders
    pub fn new() -> Self {
        let loaders: Vec<Box<dyn DocumentLoader>> = vec![
            Box::new(TextLoader),
            Box::new(MarkdownLoader),
            Box::new(JsonlLoader),
        ];

        Self { loaders }
    }

    /// Load documents from a file, automatically selecting the loader
    pub fn load(&self, path: &Path) -> Result<Vec<Document>> {
        for loader in &self.loaders {
            if loader.can_load(path) {
                return loader.load(path);
            }
        }
        anyhow::bail!("Unsupported file format: {:?}", path)
    }

    /// Check whether any registered loader handles the file
    pub fn can_load(&self, path: &Path) -> bool {
        self.loaders.iter().any(|loader| loader.can_load(path))
    }

    /// Load all supported files in a directory (recursively) into one corpus.
    ///
    /// Files are visited in sorted path order so the corpus order is stable
    /// across runs.
    pub fn load_directory(&self, dir: &Path) -> Result<Vec<Document>> {
        let mut files = Vec::new();
        collect_files(dir, &mut files)?;
        files.sort();

        let mut documents = Vec::new();
        for file in &files {
            if self.can_load(file) {
                let mut loaded = self.load(file)?;
                tracing::debug!("Loaded {} documents from {:?}", loaded.len(), file);
                documents.append(&mut loaded);
            }
        }

        tracing::info!(
            "Loaded {} documents from {:?}",
            documents.len(),
            dir
        );
        Ok(documents)
    }
}

impl Default for MultiFormatLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_files(dir: &Path, files: &mut Vec<std::path::PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).context(format!("Failed to read directory: {:?}", dir))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_text_loader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, "some documentation text").unwrap();

        let docs = TextLoader.load(&path).unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "some documentation text");
        assert!(docs[0].source.ends_with("doc.txt"));
    }

    #[test]
    fn test_jsonl_loader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunks.jsonl");
        fs::write(
            &path,
            r#"{"source": "api/linear_model", "text": "Ridge regression"}
{"source": "api/svm", "text": "Support vector machines"}
"#,
        )
        .unwrap();

        let docs = JsonlLoader.load(&path).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source, "api/linear_model");
        assert_eq!(docs[1].text, "Support vector machines");
    }

    #[test]
    fn test_jsonl_loader_rejects_malformed_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunks.jsonl");
        fs::write(&path, "{\"source\": \"a\"}\n").unwrap();

        assert!(JsonlLoader.load(&path).is_err());
    }

    #[test]
    fn test_load_directory_is_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "second").unwrap();
        fs::write(dir.path().join("a.txt"), "first").unwrap();
        fs::write(dir.path().join("ignored.bin"), "skip").unwrap();

        let loader = MultiFormatLoader::new();
        let docs = loader.load_directory(dir.path()).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, "first");
        assert_eq!(docs[1].text, "second");
    }
}
