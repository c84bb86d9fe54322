//! Design token mining
//!
//! Scans the full declaration stream, independent of component boundaries,
//! and builds the base / semantic / component token tiers per domain. Every
//! value is either a custom-property declaration or a literal observed in the
//! source; aliases only ever point at base tokens that exist.

use crate::values::{self, CustomProperties};
use brain_common::{DesignToken, ScaleStep, TokenSet, TokenTiers, TokenType, TypographyTokens};
use brain_parsers::Stylesheet;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Properties whose literal color values become base tokens
const COLOR_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "border-color",
    "fill",
    "stroke",
    "outline-color",
];

const SPACING_SCALE: &[&str] = &["xs", "sm", "md", "lg", "xl", "2xl"];

const SIZE_SCALE: &[&str] = &["xs", "sm", "base", "lg", "xl", "2xl", "3xl", "4xl", "5xl", "6xl"];

const WEIGHT_NAMES: &[(u32, &str)] = &[
    (100, "thin"),
    (200, "extralight"),
    (300, "light"),
    (400, "regular"),
    (500, "medium"),
    (600, "semibold"),
    (700, "bold"),
    (800, "extrabold"),
    (900, "black"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Base,
    Semantic,
    Component,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    Color,
    Spacing,
    Typography,
    Effects,
}

/// Name-substring tiering shared by every domain
fn tier_for(name: &str) -> Tier {
    let lower = name.to_ascii_lowercase();
    if lower.contains("primary") || lower.contains("secondary") {
        Tier::Semantic
    } else if lower.contains("button") || lower.contains("card") {
        Tier::Component
    } else {
        Tier::Base
    }
}

fn tier_map(tiers: &mut TokenTiers, tier: Tier) -> &mut BTreeMap<String, DesignToken> {
    match tier {
        Tier::Base => &mut tiers.base,
        Tier::Semantic => &mut tiers.semantic,
        Tier::Component => &mut tiers.component,
    }
}

/// Domain of a non-color root custom property, by name then value
fn domain_for(name: &str, value: &str) -> Option<Domain> {
    let lower = name.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["font", "text", "leading", "tracking", "line-height", "letter"]) {
        Some(Domain::Typography)
    } else if has(&[
        "shadow",
        "radius",
        "border",
        "opacity",
        "transition",
        "duration",
        "ease",
    ]) {
        Some(Domain::Effects)
    } else if has(&["space", "spacing", "gap", "gutter"]) || values::is_length(value) {
        Some(Domain::Spacing)
    } else {
        None
    }
}

fn typography_type(name: &str, value: &str) -> TokenType {
    let lower = name.to_ascii_lowercase();
    if lower.contains("family") || value.contains(',') || value.contains('"') {
        TokenType::FontFamily
    } else if lower.contains("weight") {
        TokenType::FontWeight
    } else if values::is_length(value) {
        TokenType::Dimension
    } else if value.parse::<f64>().is_ok() {
        TokenType::Number
    } else {
        TokenType::String
    }
}

fn effect_type(name: &str, value: &str) -> TokenType {
    let lower = name.to_ascii_lowercase();
    let value = value.trim().to_ascii_lowercase();
    if lower.contains("radius") || values::is_length(&value) {
        TokenType::Dimension
    } else if lower.contains("duration")
        || value.ends_with("ms")
        || (value.ends_with('s') && value.trim_end_matches('s').parse::<f64>().is_ok())
    {
        TokenType::Duration
    } else if value.parse::<f64>().is_ok() {
        TokenType::Number
    } else {
        TokenType::String
    }
}

/// First-seen-ordered frequency counter
#[derive(Debug, Default)]
struct Histogram {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Histogram {
    fn add(&mut self, value: &str) {
        match self.index.get(value) {
            Some(idx) => self.entries[*idx].1 += 1,
            None => {
                self.index.insert(value.to_string(), self.entries.len());
                self.entries.push((value.to_string(), 1));
            }
        }
    }

    /// Entries by descending count; ties keep first-seen order
    fn by_frequency(&self) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    fn first_seen(&self) -> &[(String, usize)] {
        &self.entries
    }
}

/// Mine the token system from a stylesheet
pub fn extract_tokens(stylesheet: &Stylesheet, properties: &CustomProperties) -> TokenSet {
    let mut tokens = TokenSet::default();

    mine_root_properties(stylesheet, properties, &mut tokens);
    mine_literal_colors(stylesheet, &mut tokens.colors);
    tokens.spacing.scale = spacing_scale(stylesheet, properties);
    mine_typography(stylesheet, &mut tokens.typography);
    mine_effects(stylesheet, &mut tokens.effects);

    debug!(
        "Mined tokens: {} colors, {} spacing steps, {} typography, {} effects",
        tokens.colors.len(),
        tokens.spacing.scale.len(),
        tokens.typography.tiers.len(),
        tokens.effects.len()
    );
    tokens
}

/// Custom properties declared under `:root`/`html`, split by domain and tier
fn mine_root_properties(
    stylesheet: &Stylesheet,
    properties: &CustomProperties,
    tokens: &mut TokenSet,
) {
    let mut declared: Vec<(String, String)> = Vec::new();
    for rule in stylesheet.rules.iter().filter(|r| r.is_root_scope()) {
        for decl in rule.declarations.iter().filter(|d| d.is_custom_property()) {
            if !declared.iter().any(|(name, _)| *name == decl.property) {
                declared.push((decl.property.clone(), decl.value.clone()));
            }
        }
    }

    // Base entries first so aliases can point at them
    for pass in [Tier::Base, Tier::Semantic, Tier::Component] {
        for (property, raw) in &declared {
            let name = property.trim_start_matches('-').to_string();
            if tier_for(&name) != pass {
                continue;
            }

            let resolved = properties.resolve(raw);
            let is_color = resolved.as_deref().is_some_and(values::is_color);
            let domain = if is_color {
                Domain::Color
            } else {
                match domain_for(&name, raw) {
                    Some(domain) => domain,
                    None => continue,
                }
            };

            let tiers = match domain {
                Domain::Color => &mut tokens.colors,
                Domain::Spacing => &mut tokens.spacing.tiers,
                Domain::Typography => &mut tokens.typography.tiers,
                Domain::Effects => &mut tokens.effects,
            };
            let token_type = match domain {
                Domain::Color => TokenType::Color,
                Domain::Spacing => TokenType::Dimension,
                Domain::Typography => typography_type(&name, resolved.as_deref().unwrap_or(raw)),
                Domain::Effects => effect_type(&name, resolved.as_deref().unwrap_or(raw)),
            };

            let Some(token) = root_token(raw, resolved.as_deref(), pass, tiers, token_type) else {
                debug!("Skipping unresolvable custom property {}", property);
                continue;
            };
            tier_map(tiers, pass).entry(name).or_insert(token);
        }
    }
}

/// Token for one root custom property; aliases reference existing base entries
fn root_token(
    raw: &str,
    resolved: Option<&str>,
    tier: Tier,
    tiers: &TokenTiers,
    token_type: TokenType,
) -> Option<DesignToken> {
    let refs = values::var_refs(raw);
    if tier != Tier::Base && refs.len() == 1 && raw.trim().starts_with("var(") {
        let target = refs[0].trim_start_matches('-');
        if tiers.base.contains_key(target) {
            return Some(
                DesignToken::new(format!("{{{}}}", target), token_type)
                    .with_description(format!("Alias of {}", refs[0])),
            );
        }
    }

    if refs.is_empty() {
        return Some(DesignToken::new(raw.trim(), token_type));
    }
    // Substituted values are still made of source literals
    resolved.map(|value| {
        DesignToken::new(value, token_type).with_description(format!("Resolved from {}", raw.trim()))
    })
}

/// Literal colors on color properties become generated base tokens
fn mine_literal_colors(stylesheet: &Stylesheet, colors: &mut TokenTiers) {
    for (_, decl) in stylesheet.declarations() {
        if !COLOR_PROPERTIES.contains(&decl.property.as_str()) {
            continue;
        }
        let value = decl.value.trim();
        if values::has_var_ref(value) || !values::is_color(value) {
            continue;
        }

        let known = colors
            .base
            .values()
            .any(|t| t.value.eq_ignore_ascii_case(value));
        if known {
            continue;
        }
        let name = unique_name(&colors.base, format!("color-{}", values::slug(value)));
        colors.base.insert(
            name,
            DesignToken::new(value, TokenType::Color)
                .with_description(format!("Literal from {}", decl.property)),
        );
    }
}

/// `name`, or `name-2`, `name-3`... when already taken
fn unique_name(tokens: &BTreeMap<String, DesignToken>, name: String) -> String {
    if !tokens.contains_key(&name) {
        return name;
    }
    (2..)
        .map(|n| format!("{}-{}", name, n))
        .find(|candidate| !tokens.contains_key(candidate))
        .unwrap_or(name)
}

/// Top six spacing magnitudes by frequency
fn spacing_scale(stylesheet: &Stylesheet, properties: &CustomProperties) -> Vec<ScaleStep> {
    let mut histogram = Histogram::default();
    for (_, decl) in stylesheet.declarations() {
        if !values::is_spacing_property(&decl.property) {
            continue;
        }
        let Some(value) = properties.resolve(&decl.value) else {
            continue;
        };
        for length in values::length_tokens(&value) {
            histogram.add(&length);
        }
    }

    histogram
        .by_frequency()
        .into_iter()
        .zip(SPACING_SCALE)
        .map(|((value, count), name)| ScaleStep {
            name: name.to_string(),
            px: values::to_px(&value),
            value,
            count,
        })
        .collect()
}

fn normalize_weight(value: &str) -> Option<u32> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(400),
        "bold" => Some(700),
        "lighter" => Some(300),
        "bolder" => Some(800),
        other => other
            .parse::<u32>()
            .ok()
            .filter(|w| (100..=900).contains(w)),
    }
}

fn weight_name(weight: u32) -> String {
    WEIGHT_NAMES
        .iter()
        .find(|(w, _)| *w == weight)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| weight.to_string())
}

fn mine_typography(stylesheet: &Stylesheet, typography: &mut TypographyTokens) {
    let mut families = Histogram::default();
    let mut sizes = Histogram::default();
    let mut weights = Histogram::default();
    let mut line_heights = Histogram::default();
    let mut letter_spacings = Histogram::default();

    for (_, decl) in stylesheet.declarations() {
        let value = decl.value.trim();
        if value.is_empty() || values::has_var_ref(value) {
            continue;
        }
        match decl.property.as_str() {
            "font-family" => families.add(value),
            "font-size" => sizes.add(&value.to_ascii_lowercase()),
            "font-weight" => {
                if let Some(weight) = normalize_weight(value) {
                    weights.add(&weight.to_string());
                }
            }
            "line-height" => line_heights.add(value),
            "letter-spacing" => letter_spacings.add(value),
            _ => {}
        }
    }

    let base = &mut typography.tiers.base;

    for (value, _) in families.first_seen() {
        let first = value.split(',').next().unwrap_or(value);
        let name = unique_name(base, format!("font-family-{}", values::slug(first)));
        base.insert(name, DesignToken::new(value.clone(), TokenType::FontFamily));
    }

    // Stable sort keeps first-seen order among equal or unparseable sizes
    let mut ordered: Vec<(String, usize)> = sizes.first_seen().to_vec();
    ordered.sort_by(|a, b| {
        let pa = values::to_px(&a.0).unwrap_or(f64::MAX);
        let pb = values::to_px(&b.0).unwrap_or(f64::MAX);
        pa.total_cmp(&pb)
    });
    typography.sizes = ordered
        .into_iter()
        .enumerate()
        .map(|(idx, (value, count))| ScaleStep {
            name: SIZE_SCALE
                .get(idx)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("{}xl", idx - SIZE_SCALE.len() + 7)),
            px: values::to_px(&value),
            value,
            count,
        })
        .collect();
    for step in &typography.sizes {
        base.entry(format!("font-size-{}", step.name))
            .or_insert_with(|| DesignToken::new(step.value.clone(), TokenType::Dimension));
    }

    let mut ordered: Vec<(String, usize)> = weights.first_seen().to_vec();
    ordered.sort_by_key(|(value, _)| value.parse::<u32>().unwrap_or(0));
    typography.weights = ordered
        .into_iter()
        .map(|(value, count)| ScaleStep {
            name: weight_name(value.parse().unwrap_or(0)),
            value,
            px: None,
            count,
        })
        .collect();
    for step in &typography.weights {
        base.entry(format!("font-weight-{}", step.name))
            .or_insert_with(|| DesignToken::new(step.value.clone(), TokenType::FontWeight));
    }

    for (idx, (value, _)) in line_heights.first_seen().iter().enumerate() {
        let token_type = if value.parse::<f64>().is_ok() {
            TokenType::Number
        } else {
            TokenType::Dimension
        };
        base.entry(format!("line-height-{}", idx + 1))
            .or_insert_with(|| DesignToken::new(value.clone(), token_type));
    }
    for (idx, (value, _)) in letter_spacings.first_seen().iter().enumerate() {
        base.entry(format!("letter-spacing-{}", idx + 1))
            .or_insert_with(|| DesignToken::new(value.clone(), TokenType::Dimension));
    }
}

fn mine_effects(stylesheet: &Stylesheet, effects: &mut TokenTiers) {
    let mut shadows = Histogram::default();
    let mut borders = Histogram::default();
    let mut radii = Histogram::default();
    let mut opacities = Histogram::default();
    let mut durations = Histogram::default();

    for (_, decl) in stylesheet.declarations() {
        let value = decl.value.trim();
        if value.is_empty() || values::has_var_ref(value) {
            continue;
        }
        let property = decl.property.as_str();
        if property == "box-shadow" {
            shadows.add(value);
        } else if property.ends_with("radius") {
            radii.add(value);
        } else if property.starts_with("border") && property != "border-color" {
            borders.add(value);
        } else if property == "opacity" {
            opacities.add(value);
        } else if property == "transition-duration" || property == "animation-duration" {
            durations.add(value);
        }
    }

    let groups = [
        ("shadow", &shadows, TokenType::String),
        ("border", &borders, TokenType::String),
        ("radius", &radii, TokenType::Dimension),
        ("opacity", &opacities, TokenType::Number),
        ("duration", &durations, TokenType::Duration),
    ];
    for (prefix, histogram, token_type) in groups {
        for (idx, (value, _)) in histogram.first_seen().iter().enumerate() {
            effects
                .base
                .entry(format!("{}-{}", prefix, idx + 1))
                .or_insert_with(|| DesignToken::new(value.clone(), token_type));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_parsers::CssParser;

    fn mine(css: &str) -> TokenSet {
        let sheet = CssParser::new().parse(css);
        let props = CustomProperties::collect(&sheet);
        extract_tokens(&sheet, &props)
    }

    #[test]
    fn test_single_button_tokens() {
        let tokens = mine(
            ".btn { padding: 8px 16px; } .btn--primary { background: var(--color-blue); } :root{--color-blue:#0066FF;}",
        );

        assert_eq!(tokens.colors.base.len(), 1);
        assert_eq!(tokens.colors.base["color-blue"].value, "#0066FF");
        assert_eq!(tokens.colors.base["color-blue"].token_type, TokenType::Color);
        assert!(tokens.colors.semantic.is_empty());

        let scale: Vec<_> = tokens.spacing.scale.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(scale, vec!["8px", "16px"]);
        assert_eq!(tokens.spacing.scale[0].name, "xs");
    }

    #[test]
    fn test_color_tiers_and_aliases() {
        let tokens = mine(
            ":root { --blue-500: #0066ff; --color-primary: var(--blue-500); --button-bg: #111; --secondary: var(--nope); } .a { color: #FF0000; } .b { color: #0066FF; }",
        );

        assert_eq!(tokens.colors.semantic["color-primary"].value, "{blue-500}");
        assert_eq!(tokens.colors.component["button-bg"].value, "#111");
        // Unresolvable alias is dropped rather than invented
        assert!(tokens.colors.semantic.get("secondary").is_none());
        assert_eq!(tokens.colors.base["color-ff0000"].value, "#FF0000");
        // #0066FF already exists as a base value
        assert!(tokens.colors.base.get("color-0066ff").is_none());
    }

    #[test]
    fn test_literal_color_names_never_collide() {
        let tokens = mine(
            ":root { --color-ff0000: #00ff00; } .a { color: #ff0000 } .b { color: rgb(0,0,0) } .c { fill: rgb(0, 0, 0) }",
        );
        let base = &tokens.colors.base;

        assert_eq!(base["color-ff0000"].value, "#00ff00");
        assert_eq!(base["color-ff0000-2"].value, "#ff0000");
        assert_eq!(base["color-rgb-0-0-0"].value, "rgb(0,0,0)");
        assert_eq!(base["color-rgb-0-0-0-2"].value, "rgb(0, 0, 0)");
    }

    #[test]
    fn test_spacing_frequency_and_cap() {
        let tokens = mine(
            ".a { margin: 4px } .b { padding: 8px 8px } .c { gap: 12px } .d { margin: 2px 3px 5px 6px 7px } .e { padding: 0 }",
        );
        let scale: Vec<_> = tokens
            .spacing
            .scale
            .iter()
            .map(|s| (s.name.as_str(), s.value.as_str(), s.count))
            .collect();
        assert_eq!(
            scale,
            vec![
                ("xs", "8px", 2),
                ("sm", "4px", 1),
                ("md", "12px", 1),
                ("lg", "2px", 1),
                ("xl", "3px", 1),
                ("2xl", "5px", 1),
            ]
        );
    }

    #[test]
    fn test_typography_scale() {
        let tokens = mine(
            "body { font-family: Inter, sans-serif; font-size: 1rem; font-weight: normal; line-height: 1.5 } h1 { font-size: 32px; font-weight: bold } small { font-size: 12px; font-weight: 700 }",
        );
        let sizes: Vec<_> = tokens
            .typography
            .sizes
            .iter()
            .map(|s| (s.name.as_str(), s.value.as_str()))
            .collect();
        assert_eq!(sizes, vec![("xs", "12px"), ("sm", "1rem"), ("base", "32px")]);

        let weights: Vec<_> = tokens
            .typography
            .weights
            .iter()
            .map(|s| (s.name.as_str(), s.value.as_str(), s.count))
            .collect();
        assert_eq!(weights, vec![("regular", "400", 1), ("bold", "700", 2)]);

        let base = &tokens.typography.tiers.base;
        assert_eq!(base["font-family-inter"].value, "Inter, sans-serif");
        assert_eq!(base["line-height-1"].token_type, TokenType::Number);
    }

    #[test]
    fn test_effects() {
        let tokens = mine(
            ".card { box-shadow: 0 1px 2px rgba(0,0,0,.2); border-radius: 8px; border: 1px solid #ddd; opacity: .9 } .x { border-radius: 8px }",
        );
        assert_eq!(tokens.effects.base["shadow-1"].value, "0 1px 2px rgba(0,0,0,.2)");
        assert_eq!(tokens.effects.base["radius-1"].value, "8px");
        assert!(tokens.effects.base.get("radius-2").is_none());
        assert_eq!(tokens.effects.base["border-1"].value, "1px solid #ddd");
        assert_eq!(tokens.effects.base["opacity-1"].token_type, TokenType::Number);
    }

    #[test]
    fn test_empty_stylesheet_has_no_tokens() {
        assert!(mine("").is_empty());
    }
}
