//! The design-system model produced by one ingestion run.
//!
//! Everything here is plain data: the extractor builds it once, the query
//! surface and the dispatch layer only ever read it. The JSON shape of
//! [`DesignModel`] is the persisted document format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version stamped into every persisted model document.
pub const MODEL_VERSION: &str = "1.0.0";

pub const GENERATOR_NAME: &str = "designer-brain";

/// Complete design-system snapshot for a template corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignModel {
    pub metadata: ModelMetadata,
    pub components: Vec<ComponentRecord>,
    pub tokens: TokenSet,
    pub relationships: RelationshipGraph,
    pub constraints: ConstraintSet,
    pub patterns: PatternSet,
    pub philosophy: DesignPhilosophy,
}

impl DesignModel {
    /// Look up a component record by id
    pub fn component(&self, id: &str) -> Option<&ComponentRecord> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Components of a given type, in extraction order
    pub fn components_of_type(&self, component_type: ComponentType) -> Vec<&ComponentRecord> {
        self.components
            .iter()
            .filter(|c| c.component_type == component_type)
            .collect()
    }

    /// Informational counts; not part of the persisted contract
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            components: self.components.len(),
            color_tokens: self.tokens.colors.len(),
            spacing_tokens: self.tokens.spacing.tiers.len() + self.tokens.spacing.scale.len(),
            typography_tokens: self.tokens.typography.tiers.len(),
            effect_tokens: self.tokens.effects.len(),
            relationship_edges: self.relationships.edges.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub version: String,
    pub generator: String,
    /// Unix seconds. Zero until the ingestion orchestrator stamps it.
    pub generated_at: u64,
    pub sources: Vec<String>,
    /// Structural signature -> number of component records sharing it
    pub occurrences: BTreeMap<String, usize>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            version: MODEL_VERSION.to_string(),
            generator: GENERATOR_NAME.to_string(),
            generated_at: 0,
            sources: Vec::new(),
            occurrences: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub components: usize,
    pub color_tokens: usize,
    pub spacing_tokens: usize,
    pub typography_tokens: usize,
    pub effect_tokens: usize,
    pub relationship_edges: usize,
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Button,
    Input,
    Card,
    Modal,
    Nav,
    Header,
    Footer,
    Form,
    Table,
    List,
    Custom,
}

impl ComponentType {
    pub const ALL: &'static [ComponentType] = &[
        ComponentType::Button,
        ComponentType::Input,
        ComponentType::Card,
        ComponentType::Modal,
        ComponentType::Nav,
        ComponentType::Header,
        ComponentType::Footer,
        ComponentType::Form,
        ComponentType::Table,
        ComponentType::List,
        ComponentType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Input => "input",
            Self::Card => "card",
            Self::Modal => "modal",
            Self::Nav => "nav",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Form => "form",
            Self::Table => "table",
            Self::List => "list",
            Self::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentCategory {
    Actions,
    Forms,
    Navigation,
    Layout,
    Overlays,
    DataDisplay,
    Content,
}

impl ComponentCategory {
    pub const ALL: &'static [ComponentCategory] = &[
        ComponentCategory::Actions,
        ComponentCategory::Forms,
        ComponentCategory::Navigation,
        ComponentCategory::Layout,
        ComponentCategory::Overlays,
        ComponentCategory::DataDisplay,
        ComponentCategory::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actions => "actions",
            Self::Forms => "forms",
            Self::Navigation => "navigation",
            Self::Layout => "layout",
            Self::Overlays => "overlays",
            Self::DataDisplay => "data-display",
            Self::Content => "content",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|c| c.as_str() == value)
    }
}

impl std::fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full description ("DNA") of one detected component instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub category: ComponentCategory,
    /// Hash of tag, classes and declaration set; equal for structural duplicates
    pub signature: String,
    pub structure: ComponentStructure,
    pub styling: ComponentStyling,
    pub states: Vec<ComponentState>,
    pub interactions: Vec<Interaction>,
    pub composition: CompositionRules,
    pub variants: Vec<Variant>,
    pub usage: UsageGuidance,
    pub accessibility: AccessibilityNotes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStructure {
    pub tag: String,
    pub classes: Vec<String>,
    pub html: String,
    /// Arena index of the root element in the parsed document
    pub node: usize,
    pub source: Option<String>,
    pub selectors: Vec<String>,
    pub semantic_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStyling {
    pub css: String,
    pub declarations: Vec<StyleUsage>,
    pub custom_properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleUsage {
    pub selector: String,
    pub property: String,
    pub value: String,
    pub important: bool,
    pub usage: TokenUsage,
}

/// Whether a declaration draws on a design token or hardcodes its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TokenUsage {
    Token {
        path: String,
        resolved: Option<String>,
    },
    Literal,
}

impl TokenUsage {
    pub fn is_token(&self) -> bool {
        matches!(self, TokenUsage::Token { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Default,
    Hover,
    Focus,
    Active,
    Disabled,
    Loading,
}

impl StateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Hover => "hover",
            Self::Focus => "focus",
            Self::Active => "active",
            Self::Disabled => "disabled",
            Self::Loading => "loading",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentState {
    pub state: StateKind,
    pub selector: String,
    pub changes: Vec<StyleChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleChange {
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub trigger: String,
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionRules {
    pub allowed_children: Vec<ComponentType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub name: String,
    pub class_name: String,
    pub overrides: Vec<StyleChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageGuidance {
    pub use_cases: Vec<String>,
    pub guidelines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityNotes {
    pub role: Option<String>,
    pub label: Option<String>,
    pub aria_attributes: Vec<String>,
    pub required_attributes: Vec<String>,
    pub keyboard: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Color,
    Dimension,
    FontFamily,
    FontWeight,
    Duration,
    Number,
    String,
}

/// A W3C design-token triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignToken {
    #[serde(rename = "$value")]
    pub value: String,
    #[serde(rename = "$type")]
    pub token_type: TokenType,
    #[serde(rename = "$description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DesignToken {
    pub fn new(value: impl Into<String>, token_type: TokenType) -> Self {
        Self {
            value: value.into(),
            token_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Name of the referenced token when the value is a `{name}` alias
    pub fn alias_target(&self) -> Option<&str> {
        self.value
            .strip_prefix('{')
            .and_then(|v| v.strip_suffix('}'))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenTiers {
    pub base: BTreeMap<String, DesignToken>,
    pub semantic: BTreeMap<String, DesignToken>,
    pub component: BTreeMap<String, DesignToken>,
}

impl TokenTiers {
    pub fn len(&self) -> usize {
        self.base.len() + self.semantic.len() + self.component.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All tokens across tiers as `(name, token)` pairs, base first
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DesignToken)> {
        self.base
            .iter()
            .chain(self.semantic.iter())
            .chain(self.component.iter())
    }

    pub fn get(&self, name: &str) -> Option<&DesignToken> {
        self.base
            .get(name)
            .or_else(|| self.semantic.get(name))
            .or_else(|| self.component.get(name))
    }
}

/// One named step of an ordered scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleStep {
    pub name: String,
    pub value: String,
    pub px: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpacingTokens {
    #[serde(flatten)]
    pub tiers: TokenTiers,
    pub scale: Vec<ScaleStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypographyTokens {
    #[serde(flatten)]
    pub tiers: TokenTiers,
    pub sizes: Vec<ScaleStep>,
    pub weights: Vec<ScaleStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub colors: TokenTiers,
    pub spacing: SpacingTokens,
    pub typography: TypographyTokens,
    pub effects: TokenTiers,
}

impl TokenSet {
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
            && self.spacing.tiers.is_empty()
            && self.spacing.scale.is_empty()
            && self.typography.tiers.is_empty()
            && self.effects.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub depth: u32,
    pub frequency: usize,
    pub importance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Contains,
    Uses,
    Requires,
    Suggests,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub parent: String,
    pub child: String,
    pub kind: RelationKind,
    pub frequency: usize,
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// WCAG minimum contrast for body text
pub const MIN_CONTRAST_TEXT: f64 = 4.5;
/// WCAG minimum contrast for large text and UI components
pub const MIN_CONTRAST_LARGE: f64 = 3.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSet {
    pub spacing: SpacingConstraint,
    pub colors: ColorConstraint,
    pub contrast: ContrastMinimums,
    pub typography: TypographyConstraint,
    pub breakpoints: Vec<Breakpoint>,
    pub accessibility_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacingConstraint {
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorConstraint {
    pub allowed_tokens: Vec<String>,
    /// Literal values behind every color token, for conformance checks
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContrastMinimums {
    pub text: f64,
    pub large_text: f64,
    pub ui: f64,
}

impl Default for ContrastMinimums {
    fn default() -> Self {
        Self {
            text: MIN_CONTRAST_TEXT,
            large_text: MIN_CONTRAST_LARGE,
            ui: MIN_CONTRAST_LARGE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyConstraint {
    pub allowed_families: Vec<String>,
    pub min_font_size_px: Option<f64>,
    pub max_font_size_px: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub name: String,
    pub value: String,
    pub px: f64,
}

// ---------------------------------------------------------------------------
// Patterns & philosophy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    Bem,
    #[default]
    Custom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamingConvention {
    pub scheme: NamingScheme,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub name: String,
    pub approach: String,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSet {
    pub naming: NamingConvention,
    pub responsive: Vec<DetectedPattern>,
    pub layout: Vec<DetectedPattern>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aesthetic {
    #[default]
    Minimal,
    Modern,
    Classic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorVerbosity {
    #[default]
    Monochrome,
    Restrained,
    Vibrant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacingDensity {
    Tight,
    #[default]
    Normal,
    Loose,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerStyle {
    Rounded,
    #[default]
    Sharp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignPhilosophy {
    pub aesthetic: Aesthetic,
    pub color_scheme: ColorVerbosity,
    pub spacing_density: SpacingDensity,
    pub corner_style: CornerStyle,
    pub average_spacing_px: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_type_round_trips_through_str() {
        for t in ComponentType::ALL {
            assert_eq!(ComponentType::parse(t.as_str()), Some(*t));
        }
        assert_eq!(ComponentType::parse(" Button "), Some(ComponentType::Button));
        assert_eq!(ComponentType::parse("widget"), None);
    }

    #[test]
    fn test_token_serializes_dtcg_shape() {
        let token = DesignToken::new("#0066FF", TokenType::Color);
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["$value"], "#0066FF");
        assert_eq!(json["$type"], "color");
        assert!(json.get("$description").is_none());
    }

    #[test]
    fn test_alias_target() {
        let alias = DesignToken::new("{color-blue}", TokenType::Color);
        assert_eq!(alias.alias_target(), Some("color-blue"));
        assert_eq!(DesignToken::new("#fff", TokenType::Color).alias_target(), None);
    }

    #[test]
    fn test_empty_model_document_shape() {
        let model = DesignModel::default();
        let json = serde_json::to_value(&model).unwrap();
        for key in [
            "metadata",
            "components",
            "tokens",
            "relationships",
            "constraints",
            "patterns",
            "philosophy",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["metadata"]["version"], MODEL_VERSION);
        assert!(model.tokens.is_empty());
    }
}
