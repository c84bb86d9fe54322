pub mod classify;
pub mod components;
pub mod resolver;
pub mod synthesis;
pub mod tokens;
pub mod values;

pub use resolver::{ElementIndex, SelectorBinding, SelectorMap, SelectorMatcher, SimpleMatcher};

use brain_common::{DesignModel, ModelMetadata, Result};
use brain_parsers::{CssParser, Document, HtmlParser, Stylesheet};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};
use values::CustomProperties;

/// Design-model extractor - turns a parsed corpus into a [`DesignModel`]
pub struct DesignExtractor {
    matcher: Box<dyn SelectorMatcher>,
}

impl DesignExtractor {
    pub fn new() -> Self {
        Self {
            matcher: Box::new(SimpleMatcher),
        }
    }

    /// Use a different selector matcher for resolution
    pub fn with_matcher(mut self, matcher: Box<dyn SelectorMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Run the full pipeline over a parsed corpus.
    ///
    /// Malformed input aborts the run; an empty corpus yields an empty model.
    /// `metadata.generated_at` is left at zero for the caller to stamp.
    pub fn extract(&self, document: &Document, stylesheet: &Stylesheet) -> Result<DesignModel> {
        let start = Instant::now();
        document.validate()?;
        stylesheet.validate()?;

        let selectors = resolver::resolve_with(document, stylesheet, self.matcher.as_ref());
        let properties = CustomProperties::collect(stylesheet);
        debug!(
            "Resolved {} selector bindings, {} custom properties",
            selectors.len(),
            properties.len()
        );

        // Segmentation and token mining only read shared inputs
        let (components, tokens) = rayon::join(
            || components::extract_components(document, &selectors, &properties),
            || tokens::extract_tokens(stylesheet, &properties),
        );

        let relationships = synthesis::build_graph(&components);
        let constraints = synthesis::build_constraints(&tokens, stylesheet);
        let patterns = synthesis::detect_patterns(&components, stylesheet);
        let philosophy = synthesis::infer_philosophy(&tokens, stylesheet);

        let mut sources: Vec<String> = Vec::new();
        for source in document.sources().iter().chain(stylesheet.sources.iter()) {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }
        let mut occurrences: BTreeMap<String, usize> = BTreeMap::new();
        for component in &components {
            *occurrences.entry(component.signature.clone()).or_default() += 1;
        }

        let model = DesignModel {
            metadata: ModelMetadata {
                sources,
                occurrences,
                ..ModelMetadata::default()
            },
            components,
            tokens,
            relationships,
            constraints,
            patterns,
            philosophy,
        };

        info!(
            "Extracted {} components, {} edges in {:?}",
            model.components.len(),
            model.relationships.edges.len(),
            start.elapsed()
        );
        Ok(model)
    }
}

impl Default for DesignExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a model from a parsed corpus with the default matcher
pub fn build_model(document: &Document, stylesheet: &Stylesheet) -> Result<DesignModel> {
    DesignExtractor::new().extract(document, stylesheet)
}

/// Parse raw HTML and CSS (including `<style>` blocks) and extract a model
pub fn extract_from_str(html: &str, css: &str) -> Result<DesignModel> {
    let document = HtmlParser::new().parse(html)?;
    let css_parser = CssParser::new();
    let mut stylesheet = Stylesheet::new();
    for inline in document.inline_styles() {
        css_parser.parse_into(&mut stylesheet, &inline.css, "inline");
    }
    css_parser.parse_into(&mut stylesheet, css, "inline");
    build_model(&document, &stylesheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_common::{ComponentCategory, ComponentType};

    const BUTTON_HTML: &str = r#"<button class="btn btn--primary">Go</button>"#;
    const BUTTON_CSS: &str = ".btn { padding: 8px 16px; } .btn--primary { background: var(--color-blue); } :root{--color-blue:#0066FF;}";

    const TEMPLATE_HTML: &str = r#"
        <header class="site-header"><nav class="nav"><ul class="nav__list"><li><a href="/">Home</a></li></ul></nav></header>
        <main>
          <article class="card card--featured"><h2 class="card__title">Hi</h2><button class="btn btn--ghost" aria-label="More">...</button></article>
          <form class="form"><input class="input" name="q"><button class="btn btn--primary">Go</button></form>
          <div role="dialog" class="modal"></div>
        </main>
        <footer class="footer"></footer>"#;
    const TEMPLATE_CSS: &str = r#"
        :root { --space-md: 16px; --color-primary: var(--blue); --blue: #0066ff; --radius: 6px; }
        .btn { padding: 8px 16px; border-radius: var(--radius); color: #fff; }
        .btn:hover { background-color: #0052cc; }
        .btn--ghost { background-color: transparent; }
        .card { padding: var(--space-md); box-shadow: 0 1px 2px rgba(0,0,0,.1); }
        .nav__list { display: flex; gap: 8px; }
        @media (min-width: 768px) { .card { padding: 24px; } }
    "#;

    #[test]
    fn test_single_button_scenario() {
        let model = extract_from_str(BUTTON_HTML, BUTTON_CSS).unwrap();

        assert_eq!(model.components.len(), 1);
        let button = &model.components[0];
        assert_eq!(button.component_type, ComponentType::Button);
        assert_eq!(button.category, ComponentCategory::Actions);
        assert_eq!(button.variants.len(), 1);
        assert_eq!(button.variants[0].name, "primary");

        assert_eq!(model.tokens.colors.base.len(), 1);
        let blue = model.tokens.colors.base.values().next().unwrap();
        assert_eq!(blue.value, "#0066FF");

        let scale: Vec<_> = model.tokens.spacing.scale.iter().map(|s| s.value.as_str()).collect();
        assert!(scale.contains(&"8px") || scale.contains(&"16px"));
        assert_eq!(model.metadata.generated_at, 0);
    }

    #[test]
    fn test_empty_template() {
        let model = extract_from_str("", "").unwrap();
        assert!(model.components.is_empty());
        assert!(model.tokens.is_empty());
        assert!(model.relationships.edges.is_empty());
    }

    #[test]
    fn test_determinism() {
        let first = extract_from_str(TEMPLATE_HTML, TEMPLATE_CSS).unwrap();
        let second = extract_from_str(TEMPLATE_HTML, TEMPLATE_CSS).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_component_completeness() {
        let document = HtmlParser::new().parse(TEMPLATE_HTML).unwrap();
        let stylesheet = CssParser::new().parse(TEMPLATE_CSS);
        let model = build_model(&document, &stylesheet).unwrap();

        for id in document.elements() {
            let node = document.node(id).unwrap();
            let count = model
                .components
                .iter()
                .filter(|c| c.structure.node == id.0)
                .count();
            let expected = usize::from(classify::is_candidate(node));
            assert_eq!(count, expected, "element <{}> at {}", node.tag, id.0);
        }
    }

    #[test]
    fn test_variant_monotonicity() {
        let model = extract_from_str(TEMPLATE_HTML, TEMPLATE_CSS).unwrap();
        for component in &model.components {
            let prefix = format!("{}--", component.name);
            let mut modifiers: Vec<&String> = component
                .structure
                .classes
                .iter()
                .filter(|c| c.starts_with(&prefix) && c.len() > prefix.len())
                .collect();
            modifiers.dedup();
            assert_eq!(component.variants.len(), modifiers.len(), "{}", component.name);
        }
    }

    #[test]
    fn test_token_traceability() {
        let model = extract_from_str(TEMPLATE_HTML, TEMPLATE_CSS).unwrap();
        let stylesheet = CssParser::new().parse(TEMPLATE_CSS);
        let literals: Vec<&str> = stylesheet
            .declarations()
            .map(|(_, d)| d.value.as_str())
            .collect();

        let domains = [
            &model.tokens.colors,
            &model.tokens.spacing.tiers,
            &model.tokens.typography.tiers,
        ];
        for tiers in domains {
            for (name, token) in tiers.semantic.iter().chain(tiers.component.iter()) {
                let traced = match token.alias_target() {
                    Some(target) => tiers.base.contains_key(target),
                    None => literals.iter().any(|l| l.contains(token.value.as_str())),
                };
                assert!(traced, "token {} is not traceable", name);
            }
        }
        assert_eq!(model.tokens.colors.semantic["color-primary"].value, "{blue}");
    }

    #[test]
    fn test_template_synthesis() {
        let model = extract_from_str(TEMPLATE_HTML, TEMPLATE_CSS).unwrap();

        let types: Vec<_> = model.components.iter().map(|c| c.component_type).collect();
        for expected in [
            ComponentType::Header,
            ComponentType::Nav,
            ComponentType::Card,
            ComponentType::Button,
            ComponentType::Form,
            ComponentType::Input,
            ComponentType::Modal,
            ComponentType::Footer,
        ] {
            assert!(types.contains(&expected), "missing {:?}", expected);
        }

        assert!(!model.relationships.edges.is_empty());
        assert_eq!(model.patterns.responsive.len(), 1);
        assert_eq!(model.constraints.breakpoints[0].px, 768.0);
        assert_eq!(
            model.patterns.naming.scheme,
            brain_common::NamingScheme::Bem
        );
        let occurrences: usize = model.metadata.occurrences.values().sum();
        assert_eq!(occurrences, model.components.len());
    }

    struct NeverMatches;

    impl SelectorMatcher for NeverMatches {
        fn matches(&self, _selector: &str, _element: &brain_parsers::ElementNode) -> bool {
            false
        }
    }

    #[test]
    fn test_custom_matcher() {
        let document = HtmlParser::new().parse(BUTTON_HTML).unwrap();
        let stylesheet = CssParser::new().parse(BUTTON_CSS);
        let model = DesignExtractor::new()
            .with_matcher(Box::new(NeverMatches))
            .extract(&document, &stylesheet)
            .unwrap();

        // Boundaries come from markup alone, styling from matched rules
        assert_eq!(model.components.len(), 1);
        assert!(model.components[0].styling.declarations.is_empty());
    }

    #[test]
    fn test_malformed_stylesheet_aborts() {
        let document = HtmlParser::new().parse(BUTTON_HTML).unwrap();
        let mut stylesheet = Stylesheet::new();
        stylesheet
            .rules
            .push(brain_parsers::StyleRule::new("  ", Vec::new()));
        assert!(matches!(
            build_model(&document, &stylesheet),
            Err(brain_common::BrainError::MalformedStylesheet(_))
        ));
    }
}
