use crate::types::*;
use crate::walker::CorpusWalker;
use anyhow::{Context, Result};
use brain_common::DesignModel;
use brain_extract::DesignExtractor;
use brain_parsers::{CssParser, Document, HtmlParser, Stylesheet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Runs a full ingestion: walk, parse, extract, stamp
#[derive(Clone)]
pub struct Ingestor {
    root_path: PathBuf,
    config: WalkConfig,
    extractor: Arc<DesignExtractor>,
}

impl Ingestor {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            config: WalkConfig::default(),
            extractor: Arc::new(DesignExtractor::new()),
        }
    }

    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_extractor(mut self, extractor: DesignExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn root_path(&self) -> &PathBuf {
        &self.root_path
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Walk and extract on the blocking pool; the result is a complete snapshot
    pub async fn run(&self) -> Result<DesignModel> {
        let start = Instant::now();
        info!("Starting design extraction at {:?}", self.root_path);

        let walker = CorpusWalker::new(self.root_path.clone())?.with_config(self.config.clone());
        let extractor = Arc::clone(&self.extractor);

        let model = tokio::task::spawn_blocking(move || -> Result<DesignModel> {
            let corpus = walker.walk()?;
            let model = ingest_corpus(&corpus, &extractor)?;
            Ok(model)
        })
        .await
        .context("Extraction task panicked")??;

        let stats = model.stats();
        info!(
            "Extraction finished in {:.2}s: {} components, {} color / {} spacing / {} typography / {} effect tokens, {} edges",
            start.elapsed().as_secs_f64(),
            stats.components,
            stats.color_tokens,
            stats.spacing_tokens,
            stats.typography_tokens,
            stats.effect_tokens,
            stats.relationship_edges
        );
        Ok(model)
    }
}

/// Parse every source of `corpus` into one document and one stylesheet, then
/// extract and stamp the model
pub fn ingest_corpus(
    corpus: &Corpus,
    extractor: &DesignExtractor,
) -> brain_common::Result<DesignModel> {
    let html_parser = HtmlParser::new();
    let css_parser = CssParser::new();
    let mut document = Document::new();
    let mut stylesheet = Stylesheet::new();

    for file in corpus.html() {
        html_parser.parse_into(&mut document, &file.content, &file.relative_path)?;
    }
    for style in document.inline_styles() {
        let name = document
            .source_name(style.source)
            .map(|s| format!("{}#style", s))
            .unwrap_or_else(|| "inline".to_string());
        css_parser.parse_into(&mut stylesheet, &style.css, &name);
    }
    for file in corpus.css() {
        css_parser.parse_into(&mut stylesheet, &file.content, &file.relative_path);
    }
    debug!(
        "Parsed {} elements and {} style rules",
        document.len(),
        stylesheet.rules.len()
    );

    let mut model = extractor.extract(&document, &stylesheet)?;
    model.metadata.generated_at = unix_now();
    Ok(model)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_common::ComponentType;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_ingest_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("index.html"),
            r#"<html><head><style>.card { padding: 24px; }</style></head>
               <body><div class="card"><button class="btn btn--primary">Go</button></div></body></html>"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("site.css"),
            ":root { --color-blue: #0066FF; } .btn { padding: 8px 16px; background: var(--color-blue); }",
        )
        .unwrap();

        let model = Ingestor::new(dir.path().to_path_buf()).run().await.unwrap();

        assert_eq!(model.components.len(), 2);
        assert_eq!(model.components[1].component_type, ComponentType::Button);
        assert!(model.metadata.generated_at > 0);
        assert_eq!(
            model.metadata.sources,
            vec!["index.html".to_string(), "index.html#style".to_string(), "site.css".to_string()]
        );
        // Inline <style> rules are resolved like file rules
        let card = &model.components[0];
        assert_eq!(card.styling.declarations[0].value, "24px");
    }

    #[tokio::test]
    async fn test_ingest_empty_directory() {
        let dir = tempdir().unwrap();
        let model = Ingestor::new(dir.path().to_path_buf()).run().await.unwrap();
        assert!(model.components.is_empty());
        assert!(model.tokens.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_missing_directory_fails() {
        let result = Ingestor::new(PathBuf::from("/nonexistent/templates")).run().await;
        assert!(result.is_err());
    }
}
