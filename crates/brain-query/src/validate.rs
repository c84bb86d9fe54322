use brain_common::{ConstraintSet, Result};
use brain_extract::values;
use brain_parsers::{CssParser, ElementNode, HtmlParser};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Points deducted per issue category
pub const ISSUE_PENALTY: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    HardcodedColor,
    OffScaleSpacing,
    MissingAccessibility,
}

/// One category of nonconformance with every offending value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
    pub occurrences: Vec<String>,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub score: u32,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let penalty = ISSUE_PENALTY * issues.len() as u32;
        Self {
            valid: issues.is_empty(),
            score: 100u32.saturating_sub(penalty),
            issues,
        }
    }
}

/// Score candidate markup and styles against the model's constraints.
/// Nonconformance is reported in the returned report, never as an error.
pub fn validate(constraints: &ConstraintSet, html: &str, css: &str) -> Result<ValidationReport> {
    let document = HtmlParser::new().parse(html)?;
    let mut stylesheet = CssParser::new().parse(css);
    for style in document.inline_styles() {
        CssParser::new().parse_into(&mut stylesheet, &style.css, "inline");
    }

    let mut colors: Vec<String> = Vec::new();
    let mut spacing: Vec<String> = Vec::new();
    for (rule, decl) in stylesheet.declarations() {
        if decl.is_custom_property() {
            continue;
        }
        for color in values::color_literals(&decl.value) {
            if !is_allowed_color(constraints, &color) {
                push_unique(&mut colors, format!("{} {{ {}: {} }}", rule.selector, decl.property, color));
            }
        }
        if values::is_spacing_property(&decl.property) {
            for length in values::length_tokens(&decl.value) {
                if !is_on_scale(constraints, &length) {
                    push_unique(&mut spacing, length);
                }
            }
        }
    }

    let mut issues = Vec::new();
    if !colors.is_empty() {
        issues.push(ValidationIssue {
            kind: IssueKind::HardcodedColor,
            message: format!("{} hardcoded colors are not design tokens", colors.len()),
            occurrences: colors,
            suggestion: color_suggestion(constraints),
        });
    }
    if !spacing.is_empty() {
        issues.push(ValidationIssue {
            kind: IssueKind::OffScaleSpacing,
            message: format!("{} spacing values are outside the scale", spacing.len()),
            suggestion: spacing_suggestion(constraints, &spacing),
            occurrences: spacing,
        });
    }

    let accessible = document
        .elements()
        .into_iter()
        .filter_map(|id| document.node(id))
        .any(has_accessibility_attribute);
    if !accessible {
        issues.push(ValidationIssue {
            kind: IssueKind::MissingAccessibility,
            message: "No element declares a role, aria-* attribute or alt text".to_string(),
            occurrences: Vec::new(),
            suggestion: "Add roles, aria labels and alt text for assistive technology".to_string(),
        });
    }

    let report = ValidationReport::from_issues(issues);
    debug!(
        "Validation scored {} with {} issues",
        report.score,
        report.issues.len()
    );
    Ok(report)
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn is_allowed_color(constraints: &ConstraintSet, color: &str) -> bool {
    constraints
        .colors
        .allowed_values
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(color))
}

/// An empty scale constrains nothing
fn is_on_scale(constraints: &ConstraintSet, length: &str) -> bool {
    let allowed = &constraints.spacing.allowed_values;
    if allowed.is_empty() {
        return true;
    }
    match values::to_px(length) {
        Some(px) => allowed
            .iter()
            .filter_map(|v| values::to_px(v))
            .any(|a| (a - px).abs() < 0.01),
        None => allowed.iter().any(|a| a.eq_ignore_ascii_case(length)),
    }
}

fn has_accessibility_attribute(element: &ElementNode) -> bool {
    element.attributes.iter().any(|(name, _)| {
        let name = name.to_ascii_lowercase();
        name == "role" || name == "alt" || name.starts_with("aria-")
    })
}

fn color_suggestion(constraints: &ConstraintSet) -> String {
    if constraints.colors.allowed_tokens.is_empty() {
        return "Define colors as custom properties and reference them with var()".to_string();
    }
    format!(
        "Use color tokens instead: {}",
        constraints.colors.allowed_tokens.join(", ")
    )
}

fn spacing_suggestion(constraints: &ConstraintSet, offending: &[String]) -> String {
    let scale: Vec<(String, f64)> = constraints
        .spacing
        .allowed_values
        .iter()
        .filter_map(|v| values::to_px(v).map(|px| (v.clone(), px)))
        .collect();

    let replacements: Vec<String> = offending
        .iter()
        .filter_map(|value| {
            let px = values::to_px(value)?;
            let (nearest, _) = scale
                .iter()
                .min_by(|a, b| (a.1 - px).abs().total_cmp(&(b.1 - px).abs()))?;
            Some(format!("{} -> {}", value, nearest))
        })
        .collect();

    if replacements.is_empty() {
        format!(
            "Use the spacing scale: {}",
            constraints.spacing.allowed_values.join(", ")
        )
    } else {
        format!("Snap to the spacing scale: {}", replacements.join(", "))
    }
}
