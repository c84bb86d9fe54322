//! Relationship graph, constraints, patterns and philosophy, derived from the
//! extracted components and tokens.

use crate::classify;
use crate::values;
use brain_common::{
    Aesthetic, Breakpoint, ColorConstraint, ColorVerbosity, ComponentRecord, ConstraintSet,
    ContrastMinimums, CornerStyle, DesignPhilosophy, DetectedPattern, GraphEdge, GraphNode,
    NamingConvention, NamingScheme, PatternSet, RelationKind, RelationshipGraph,
    SpacingConstraint, SpacingDensity, TokenSet, TokenType, TypographyConstraint,
};
use brain_parsers::Stylesheet;
use std::collections::HashMap;

const BREAKPOINT_NAMES: &[&str] = &["sm", "md", "lg", "xl", "2xl"];

/// Accessibility conformance target stamped into constraints
pub const ACCESSIBILITY_LEVEL: &str = "AA";

const MAX_EXAMPLES: usize = 5;

/// Static-table relationship graph over the extracted components
pub fn build_graph(components: &[ComponentRecord]) -> RelationshipGraph {
    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for component in components {
        *name_counts.entry(component.name.as_str()).or_default() += 1;
    }
    let max_frequency = name_counts.values().copied().max().unwrap_or(1).max(1);

    let nodes = components
        .iter()
        .map(|component| {
            let frequency = name_counts
                .get(component.name.as_str())
                .copied()
                .unwrap_or(1);
            GraphNode {
                id: component.id.clone(),
                name: component.name.clone(),
                component_type: component.component_type,
                depth: 0,
                frequency,
                importance: frequency as f64 / max_frequency as f64,
            }
        })
        .collect();

    let mut edges = Vec::new();
    for parent in components {
        let allowed = classify::allowed_children(parent.component_type);
        if allowed.is_empty() {
            continue;
        }
        for child in components {
            if child.id == parent.id {
                continue;
            }
            let matches = allowed.iter().any(|t| {
                *t == child.component_type || child.name.eq_ignore_ascii_case(t.as_str())
            });
            if matches {
                edges.push(GraphEdge {
                    parent: parent.id.clone(),
                    child: child.id.clone(),
                    kind: RelationKind::Contains,
                    frequency: 1,
                });
            }
        }
    }

    RelationshipGraph { nodes, edges }
}

pub fn build_constraints(tokens: &TokenSet, stylesheet: &Stylesheet) -> ConstraintSet {
    let spacing = SpacingConstraint {
        allowed_values: tokens.spacing.scale.iter().map(|s| s.value.clone()).collect(),
    };

    let mut allowed_values: Vec<String> = Vec::new();
    for (_, token) in tokens.colors.iter() {
        if token.alias_target().is_some() {
            continue;
        }
        let value = token.value.to_ascii_lowercase();
        if !allowed_values.contains(&value) {
            allowed_values.push(value);
        }
    }
    let colors = ColorConstraint {
        allowed_tokens: tokens.colors.base.keys().cloned().collect(),
        allowed_values,
    };

    let allowed_families = tokens
        .typography
        .tiers
        .iter()
        .filter(|(_, t)| t.token_type == TokenType::FontFamily)
        .map(|(name, _)| name.clone())
        .collect();
    let size_px: Vec<f64> = tokens.typography.sizes.iter().filter_map(|s| s.px).collect();
    let typography = TypographyConstraint {
        allowed_families,
        min_font_size_px: size_px.iter().copied().reduce(f64::min),
        max_font_size_px: size_px.iter().copied().reduce(f64::max),
    };

    ConstraintSet {
        spacing,
        colors,
        contrast: ContrastMinimums::default(),
        typography,
        breakpoints: breakpoints(stylesheet),
        accessibility_level: ACCESSIBILITY_LEVEL.to_string(),
    }
}

/// Distinct media-query widths, ascending
fn breakpoints(stylesheet: &Stylesheet) -> Vec<Breakpoint> {
    let mut widths: Vec<(String, f64)> = Vec::new();
    for query in &stylesheet.media_queries {
        for (value, px) in values::media_widths(query) {
            if !widths.iter().any(|(_, seen)| *seen == px) {
                widths.push((value, px));
            }
        }
    }
    widths.sort_by(|a, b| a.1.total_cmp(&b.1));

    widths
        .into_iter()
        .enumerate()
        .map(|(idx, (value, px))| Breakpoint {
            name: BREAKPOINT_NAMES
                .get(idx)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("bp-{}", idx + 1)),
            value,
            px,
        })
        .collect()
}

pub fn detect_patterns(components: &[ComponentRecord], stylesheet: &Stylesheet) -> PatternSet {
    let selectors: Vec<&str> = components
        .iter()
        .flat_map(|c| c.structure.selectors.iter().map(String::as_str))
        .collect();

    let bem: Vec<&str> = selectors
        .iter()
        .copied()
        .filter(|s| s.contains("--") || s.contains("__"))
        .collect();
    let naming = if bem.is_empty() {
        let mut examples: Vec<String> = Vec::new();
        for class in components.iter().flat_map(|c| c.structure.classes.iter()) {
            if examples.len() == MAX_EXAMPLES {
                break;
            }
            if !examples.contains(class) {
                examples.push(class.clone());
            }
        }
        NamingConvention {
            scheme: NamingScheme::Custom,
            examples,
        }
    } else {
        let mut examples: Vec<String> = Vec::new();
        for selector in bem {
            if examples.len() == MAX_EXAMPLES {
                break;
            }
            if !examples.iter().any(|e| e == selector) {
                examples.push(selector.to_string());
            }
        }
        NamingConvention {
            scheme: NamingScheme::Bem,
            examples,
        }
    };

    let mut responsive = Vec::new();
    if !stylesheet.media_queries.is_empty() {
        responsive.push(DetectedPattern {
            name: "Responsive Design".to_string(),
            approach: "mostly-fluid".to_string(),
            evidence: stylesheet
                .media_queries
                .iter()
                .take(MAX_EXAMPLES)
                .cloned()
                .collect(),
        });
    }

    let mut flex: Vec<String> = Vec::new();
    let mut grid: Vec<String> = Vec::new();
    for (rule, decl) in stylesheet.declarations() {
        if decl.property != "display" {
            continue;
        }
        let target = match decl.value.trim() {
            "flex" | "inline-flex" => &mut flex,
            "grid" | "inline-grid" => &mut grid,
            _ => continue,
        };
        if target.len() < MAX_EXAMPLES && !target.contains(&rule.selector) {
            target.push(rule.selector.clone());
        }
    }

    let mut layout = Vec::new();
    if !flex.is_empty() {
        layout.push(DetectedPattern {
            name: "Flexbox Layout".to_string(),
            approach: "flex".to_string(),
            evidence: flex,
        });
    }
    if !grid.is_empty() {
        layout.push(DetectedPattern {
            name: "Grid Layout".to_string(),
            approach: "grid".to_string(),
            evidence: grid,
        });
    }

    PatternSet {
        naming,
        responsive,
        layout,
    }
}

pub fn infer_philosophy(tokens: &TokenSet, stylesheet: &Stylesheet) -> DesignPhilosophy {
    let spacing_px: Vec<f64> = tokens.spacing.scale.iter().filter_map(|s| s.px).collect();
    let average_spacing_px = if spacing_px.is_empty() {
        0.0
    } else {
        spacing_px.iter().sum::<f64>() / spacing_px.len() as f64
    };

    let spacing_density = if spacing_px.is_empty() {
        SpacingDensity::Normal
    } else if average_spacing_px < 12.0 {
        SpacingDensity::Tight
    } else if average_spacing_px > 24.0 {
        SpacingDensity::Loose
    } else {
        SpacingDensity::Normal
    };

    let rounded = stylesheet
        .declarations()
        .any(|(_, d)| d.property.contains("radius"));
    let corner_style = if rounded {
        CornerStyle::Rounded
    } else {
        CornerStyle::Sharp
    };

    let has_shadows = stylesheet
        .declarations()
        .any(|(_, d)| d.property.contains("shadow"));
    let color_count = tokens.colors.len();

    let aesthetic = if rounded && has_shadows {
        Aesthetic::Modern
    } else if color_count <= 5 && !has_shadows {
        Aesthetic::Minimal
    } else {
        Aesthetic::Classic
    };

    let color_scheme = match color_count {
        0..=2 => ColorVerbosity::Monochrome,
        3..=6 => ColorVerbosity::Restrained,
        _ => ColorVerbosity::Vibrant,
    };

    DesignPhilosophy {
        aesthetic,
        color_scheme,
        spacing_density,
        corner_style,
        average_spacing_px,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::extract_tokens;
    use crate::values::CustomProperties;
    use brain_common::{ComponentCategory, ComponentType};
    use brain_parsers::CssParser;

    fn record(id: &str, name: &str, component_type: ComponentType) -> ComponentRecord {
        ComponentRecord {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            component_type,
            category: ComponentCategory::Content,
            signature: String::new(),
            structure: Default::default(),
            styling: Default::default(),
            states: Vec::new(),
            interactions: Vec::new(),
            composition: Default::default(),
            variants: Vec::new(),
            usage: Default::default(),
            accessibility: Default::default(),
        }
    }

    fn sheet_and_tokens(css: &str) -> (Stylesheet, TokenSet) {
        let sheet = CssParser::new().parse(css);
        let tokens = extract_tokens(&sheet, &CustomProperties::collect(&sheet));
        (sheet, tokens)
    }

    #[test]
    fn test_graph_from_static_table() {
        let components = vec![
            record("c1", "card", ComponentType::Card),
            record("b1", "btn", ComponentType::Button),
            record("b2", "btn", ComponentType::Button),
            record("n1", "nav", ComponentType::Nav),
        ];
        let graph = build_graph(&components);

        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.nodes[1].frequency, 2);
        assert_eq!(graph.nodes[1].importance, 1.0);
        assert_eq!(graph.nodes[0].importance, 0.5);

        let pairs: Vec<_> = graph
            .edges
            .iter()
            .map(|e| (e.parent.as_str(), e.child.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("c1", "b1"), ("c1", "b2"), ("n1", "b1"), ("n1", "b2")]
        );
        assert!(graph.edges.iter().all(|e| e.kind == RelationKind::Contains));
    }

    #[test]
    fn test_graph_empty() {
        let graph = build_graph(&[]);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_constraints() {
        let (sheet, tokens) = sheet_and_tokens(
            ":root { --blue: #0066FF; --primary: var(--blue); } .a { padding: 8px; color: #333; font-family: Inter; font-size: 14px } h1 { font-size: 2rem } @media (min-width: 1024px) { .a { padding: 16px } } @media (max-width: 640px) { .a { margin: 8px } }",
        );
        let constraints = build_constraints(&tokens, &sheet);

        assert_eq!(constraints.spacing.allowed_values, vec!["8px", "16px"]);
        assert_eq!(constraints.colors.allowed_tokens, vec!["blue", "color-333"]);
        assert_eq!(constraints.colors.allowed_values, vec!["#0066ff", "#333"]);
        assert_eq!(constraints.typography.allowed_families, vec!["font-family-inter"]);
        assert_eq!(constraints.typography.min_font_size_px, Some(14.0));
        assert_eq!(constraints.typography.max_font_size_px, Some(32.0));
        assert_eq!(constraints.contrast.text, 4.5);
        assert_eq!(constraints.accessibility_level, "AA");

        let bps: Vec<_> = constraints
            .breakpoints
            .iter()
            .map(|b| (b.name.as_str(), b.px))
            .collect();
        assert_eq!(bps, vec![("sm", 640.0), ("md", 1024.0)]);
    }

    #[test]
    fn test_patterns() {
        let mut card = record("c1", "card", ComponentType::Card);
        card.structure.selectors = vec![".card".to_string(), ".card__title".to_string()];
        let sheet = CssParser::new()
            .parse(".row { display: flex } .grid { display: grid } @media (min-width: 600px) { .row { display: block } }");

        let patterns = detect_patterns(&[card], &sheet);
        assert_eq!(patterns.naming.scheme, NamingScheme::Bem);
        assert_eq!(patterns.naming.examples, vec![".card__title"]);
        assert_eq!(patterns.responsive.len(), 1);
        assert_eq!(patterns.responsive[0].name, "Responsive Design");
        assert_eq!(patterns.responsive[0].approach, "mostly-fluid");
        let layouts: Vec<_> = patterns.layout.iter().map(|p| p.approach.as_str()).collect();
        assert_eq!(layouts, vec!["flex", "grid"]);
    }

    #[test]
    fn test_custom_naming_without_modifiers() {
        let mut card = record("c1", "card", ComponentType::Card);
        card.structure.selectors = vec![".card".to_string()];
        card.structure.classes = vec!["card".to_string()];
        let patterns = detect_patterns(&[card], &Stylesheet::new());
        assert_eq!(patterns.naming.scheme, NamingScheme::Custom);
        assert!(patterns.responsive.is_empty());
    }

    #[test]
    fn test_philosophy() {
        let (sheet, tokens) =
            sheet_and_tokens(".a { padding: 4px 8px; border-radius: 4px; box-shadow: 0 1px 2px #000 }");
        let philosophy = infer_philosophy(&tokens, &sheet);
        assert_eq!(philosophy.spacing_density, SpacingDensity::Tight);
        assert_eq!(philosophy.corner_style, CornerStyle::Rounded);
        assert_eq!(philosophy.aesthetic, Aesthetic::Modern);
        assert_eq!(philosophy.average_spacing_px, 6.0);

        let (sheet, tokens) = sheet_and_tokens(".a { margin: 32px 48px }");
        let philosophy = infer_philosophy(&tokens, &sheet);
        assert_eq!(philosophy.spacing_density, SpacingDensity::Loose);
        assert_eq!(philosophy.corner_style, CornerStyle::Sharp);
        assert_eq!(philosophy.aesthetic, Aesthetic::Minimal);
        assert_eq!(philosophy.color_scheme, ColorVerbosity::Monochrome);
    }

    #[test]
    fn test_normal_density_band() {
        let (sheet, tokens) = sheet_and_tokens(".a { padding: 12px 20px }");
        let philosophy = infer_philosophy(&tokens, &sheet);
        assert_eq!(philosophy.average_spacing_px, 16.0);
        assert_eq!(philosophy.spacing_density, SpacingDensity::Normal);

        for css in [".a { padding: 12px }", ".a { margin: 24px }", ".a { color: red }"] {
            let (sheet, tokens) = sheet_and_tokens(css);
            assert_eq!(
                infer_philosophy(&tokens, &sheet).spacing_density,
                SpacingDensity::Normal,
                "{}",
                css
            );
        }
    }
}
