use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A template source file collected by the walker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub kind: SourceKind,
    pub size: u64,
    pub content: String,
}

/// Kinds of template sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Html,
    Css,
}

impl SourceKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(SourceKind::Html),
            "css" => Some(SourceKind::Css),
            _ => None,
        }
    }
}

/// Files collected from a template directory, in relative-path order
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Corpus {
    pub files: Vec<SourceFile>,
    pub files_by_kind: HashMap<String, usize>,
    pub total_size: u64,
    pub duration_ms: u128,
}

impl Corpus {
    pub fn html(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.kind == SourceKind::Html)
    }

    pub fn css(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.kind == SourceKind::Css)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Configuration for walking a template directory
#[derive(Debug, Clone)]
pub struct WalkConfig {
    pub max_file_size: u64,
    /// Directory names skipped anywhere in the tree
    pub ignore_patterns: Vec<String>,
    /// File-name globs to collect
    pub include_globs: Vec<String>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024, // 1MB
            ignore_patterns: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                "dist".to_string(),
                "build".to_string(),
                ".next".to_string(),
                "coverage".to_string(),
                "target".to_string(),
                "vendor".to_string(),
            ],
            include_globs: vec![
                "*.html".to_string(),
                "*.htm".to_string(),
                "*.css".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_from_extension() {
        assert_eq!(SourceKind::from_extension("HTML"), Some(SourceKind::Html));
        assert_eq!(SourceKind::from_extension("css"), Some(SourceKind::Css));
        assert_eq!(SourceKind::from_extension("scss"), None);
    }
}
