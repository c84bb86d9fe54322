use crate::types::*;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Collects HTML and CSS sources from a template directory
pub struct CorpusWalker {
    root_path: PathBuf,
    config: WalkConfig,
}

impl CorpusWalker {
    pub fn new(root_path: PathBuf) -> Result<Self> {
        if !root_path.exists() {
            anyhow::bail!("Path does not exist: {:?}", root_path);
        }

        if !root_path.is_dir() {
            anyhow::bail!("Path is not a directory: {:?}", root_path);
        }

        Ok(Self {
            root_path,
            config: WalkConfig::default(),
        })
    }

    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Walk the tree and read every matching source file
    pub fn walk(&self) -> Result<Corpus> {
        let start = Instant::now();
        info!("Collecting template sources under {:?}", self.root_path);

        let include = build_globset(&self.config.include_globs)?;
        let mut files = Vec::new();
        let mut files_by_kind: HashMap<String, usize> = HashMap::new();
        let mut total_size = 0u64;

        // Build walker with gitignore support
        let mut builder = WalkBuilder::new(&self.root_path);
        builder
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .hidden(true);

        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!("Error walking directory: {}", err);
                    continue;
                }
            };

            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let relative = path.strip_prefix(&self.root_path).unwrap_or(path);
            if self.should_ignore(relative) {
                continue;
            }

            let Some(file_name) = path.file_name() else {
                continue;
            };
            if !include.is_match(file_name) {
                continue;
            }

            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let Some(kind) = SourceKind::from_extension(extension) else {
                debug!("Skipping {:?}: not an HTML or CSS file", path);
                continue;
            };

            let metadata = match fs::metadata(path) {
                Ok(m) => m,
                Err(err) => {
                    warn!("Error reading metadata for {:?}: {}", path, err);
                    continue;
                }
            };

            let size = metadata.len();

            // Skip files that are too large
            if size > self.config.max_file_size {
                debug!("Skipping large file: {:?} ({} bytes)", path, size);
                continue;
            }

            let content = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(err) => {
                    warn!("Error reading file {:?}: {}", path, err);
                    continue;
                }
            };

            let relative_path = relative.to_string_lossy().replace('\\', "/");

            total_size += size;
            *files_by_kind.entry(format!("{:?}", kind)).or_insert(0) += 1;
            files.push(SourceFile {
                path: path.to_path_buf(),
                relative_path,
                kind,
                size,
                content,
            });
        }

        // Walk order is filesystem dependent
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let duration = start.elapsed();
        info!(
            "Collected {} files in {:.2}s",
            files.len(),
            duration.as_secs_f64()
        );

        Ok(Corpus {
            files,
            files_by_kind,
            total_size,
            duration_ms: duration.as_millis(),
        })
    }

    /// Whether any directory component of `relative` is an ignored name
    fn should_ignore(&self, relative: &Path) -> bool {
        let Some(parent) = relative.parent() else {
            return false;
        };
        parent.components().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            self.config.ignore_patterns.iter().any(|p| *p == name)
        })
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("Invalid glob pattern {:?}", pattern))?;
        builder.add(glob);
    }
    builder.build().context("Failed to build include glob set")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_walker_invalid_path() {
        let walker = CorpusWalker::new(PathBuf::from("/nonexistent/path"));
        assert!(walker.is_err());
    }

    #[test]
    fn test_walker_rejects_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "index.html", "<p></p>");
        assert!(CorpusWalker::new(dir.path().join("index.html")).is_err());
    }

    #[test]
    fn test_walk_collects_sources_and_skips_ignored() {
        let dir = tempdir().unwrap();
        write(dir.path(), "index.html", "<nav></nav>");
        write(dir.path(), "css/site.css", ".a { color: red }");
        write(dir.path(), "pages/about.htm", "<footer></footer>");
        write(dir.path(), "node_modules/lib/x.css", ".x {}");
        write(dir.path(), "dist/index.html", "<p></p>");
        write(dir.path(), "app.js", "console.log(1)");
        write(dir.path(), "buildings.html", "<main></main>");

        let corpus = CorpusWalker::new(dir.path().to_path_buf())
            .unwrap()
            .walk()
            .unwrap();

        let paths: Vec<_> = corpus.files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["buildings.html", "css/site.css", "index.html", "pages/about.htm"]
        );
        assert_eq!(corpus.html().count(), 3);
        assert_eq!(corpus.css().count(), 1);
        assert_eq!(corpus.files_by_kind.get("Css"), Some(&1));
    }

    #[test]
    fn test_walk_skips_large_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "big.css", &".a { color: red }\n".repeat(64));
        write(dir.path(), "small.css", ".a { color: red }");

        let config = WalkConfig {
            max_file_size: 100,
            ..WalkConfig::default()
        };
        let corpus = CorpusWalker::new(dir.path().to_path_buf())
            .unwrap()
            .with_config(config)
            .walk()
            .unwrap();
        assert_eq!(corpus.files.len(), 1);
        assert_eq!(corpus.files[0].relative_path, "small.css");
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        let dir = tempdir().unwrap();
        let config = WalkConfig {
            include_globs: vec!["[".to_string()],
            ..WalkConfig::default()
        };
        let walker = CorpusWalker::new(dir.path().to_path_buf())
            .unwrap()
            .with_config(config);
        assert!(walker.walk().is_err());
    }
}
