use brain_common::{
    BrainError, ComponentRecord, ComponentType, ConstraintSet, DesignModel, DesignPhilosophy,
    Result, TokenSet, TokenTiers,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write;
use tracing::{debug, info};

/// Exemplars bundled into one generation context
pub const MAX_EXEMPLARS: usize = 3;

/// What the external generator is asked to build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub description: String,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default = "default_include_tokens")]
    pub include_tokens: bool,
}

fn default_include_tokens() -> bool {
    true
}

impl GenerationRequest {
    pub fn new(component_type: ComponentType, description: impl Into<String>) -> Self {
        Self {
            component_type,
            description: description.into(),
            variant: None,
            include_tokens: true,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn without_tokens(mut self) -> Self {
        self.include_tokens = false;
        self
    }
}

/// Everything needed to ground a generation request in the extracted style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    pub request: GenerationRequest,
    pub exemplars: Vec<ComponentRecord>,
    pub tokens: Option<TokenSet>,
    pub constraints: ConstraintSet,
    pub philosophy: DesignPhilosophy,
}

/// Select exemplars of the requested type and bundle them with the model's
/// tokens, constraints and philosophy
pub fn assemble_generation_context(
    model: &DesignModel,
    request: GenerationRequest,
) -> Result<GenerationContext> {
    let candidates = model.components_of_type(request.component_type);
    if candidates.is_empty() {
        return Err(BrainError::NoExemplars {
            component_type: request.component_type.to_string(),
        });
    }

    let exemplars = select_exemplars(candidates, request.variant.as_deref());
    info!(
        "Assembled generation context for {} with {} exemplars",
        request.component_type,
        exemplars.len()
    );

    Ok(GenerationContext {
        tokens: request.include_tokens.then(|| model.tokens.clone()),
        constraints: model.constraints.clone(),
        philosophy: model.philosophy.clone(),
        exemplars,
        request,
    })
}

fn has_variant(component: &ComponentRecord, variant: &str) -> bool {
    component
        .variants
        .iter()
        .any(|v| v.name.eq_ignore_ascii_case(variant) || v.class_name.eq_ignore_ascii_case(variant))
}

/// Variant carriers first, then structurally distinct records before duplicates
fn select_exemplars(
    candidates: Vec<&ComponentRecord>,
    variant: Option<&str>,
) -> Vec<ComponentRecord> {
    let (mut ordered, rest): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| variant.is_some_and(|v| has_variant(c, v)));
    ordered.extend(rest);

    let mut seen = HashSet::new();
    let (distinct, duplicates): (Vec<_>, Vec<_>) = ordered
        .into_iter()
        .partition(|c| seen.insert(c.signature.as_str()));
    if !duplicates.is_empty() {
        debug!("Deferring {} structural duplicates", duplicates.len());
    }

    distinct
        .into_iter()
        .chain(duplicates)
        .take(MAX_EXEMPLARS)
        .cloned()
        .collect()
}

/// Lowercase label of a unit enum as it appears in the model document
fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

impl GenerationContext {
    /// Markdown brief for the external generator
    pub fn render_prompt(&self) -> String {
        let mut out = String::new();
        let request = &self.request;

        let _ = writeln!(out, "# Generate a {} component\n", request.component_type);
        let _ = writeln!(out, "{}\n", request.description.trim());
        if let Some(variant) = &request.variant {
            let _ = writeln!(out, "Variant: **{}**\n", variant);
        }

        let p = &self.philosophy;
        out.push_str("## Design philosophy\n\n");
        let _ = writeln!(out, "- Aesthetic: {}", label(&p.aesthetic));
        let _ = writeln!(out, "- Color scheme: {}", label(&p.color_scheme));
        let _ = writeln!(
            out,
            "- Spacing: {} (average {:.1}px)",
            label(&p.spacing_density),
            p.average_spacing_px
        );
        let _ = writeln!(out, "- Corners: {}\n", label(&p.corner_style));

        if let Some(tokens) = &self.tokens {
            out.push_str("## Design tokens\n\n");
            write_tiers(&mut out, "Colors", &tokens.colors);
            write_tiers(&mut out, "Spacing", &tokens.spacing.tiers);
            write_tiers(&mut out, "Typography", &tokens.typography.tiers);
            write_tiers(&mut out, "Effects", &tokens.effects);
        }

        self.write_constraints(&mut out);

        out.push_str("## Reference components\n\n");
        for exemplar in &self.exemplars {
            let _ = writeln!(out, "### {}\n", exemplar.name);
            let _ = writeln!(out, "{}\n", exemplar.description);
            let _ = writeln!(out, "```html\n{}\n```\n", exemplar.structure.html);
            if !exemplar.styling.css.is_empty() {
                let _ = writeln!(out, "```css\n{}\n```\n", exemplar.styling.css);
            }
        }
        out
    }

    fn write_constraints(&self, out: &mut String) {
        let c = &self.constraints;
        out.push_str("## Constraints\n\n");
        if !c.spacing.allowed_values.is_empty() {
            let _ = writeln!(out, "- Spacing scale: {}", c.spacing.allowed_values.join(", "));
        }
        if !c.colors.allowed_tokens.is_empty() {
            let _ = writeln!(out, "- Color tokens only: {}", c.colors.allowed_tokens.join(", "));
        }
        if !c.typography.allowed_families.is_empty() {
            let _ = writeln!(out, "- Font families: {}", c.typography.allowed_families.join(", "));
        }
        if !c.breakpoints.is_empty() {
            let points: Vec<String> = c
                .breakpoints
                .iter()
                .map(|b| format!("{} ({})", b.name, b.value))
                .collect();
            let _ = writeln!(out, "- Breakpoints: {}", points.join(", "));
        }
        let _ = writeln!(
            out,
            "- Accessibility: WCAG {}, text contrast at least {}:1\n",
            c.accessibility_level, c.contrast.text
        );
    }
}

fn write_tiers(out: &mut String, title: &str, tiers: &TokenTiers) {
    if tiers.is_empty() {
        return;
    }
    let _ = writeln!(out, "### {}\n", title);
    for (name, token) in tiers.iter() {
        let _ = writeln!(out, "- `{}`: {}", name, token.value);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_extract::extract_from_str;

    const HTML: &str = r#"
        <button class="btn">One</button>
        <button class="btn btn--ghost">Two</button>
        <button class="btn">Three</button>
        <button class="btn btn--primary">Four</button>
        <div class="card">Body</div>"#;

    const CSS: &str = r#"
        :root { --color-primary: #0066FF; }
        .btn { padding: 8px 16px; background: var(--color-primary); }
        .btn--primary { color: #fff; }
        .btn--ghost { background: transparent; }
        .card { padding: 24px; border-radius: 8px; }"#;

    fn model() -> DesignModel {
        extract_from_str(HTML, CSS).unwrap()
    }

    #[test]
    fn test_unrepresented_type_has_no_exemplars() {
        let model = model();
        let result = assemble_generation_context(
            &model,
            GenerationRequest::new(ComponentType::Table, "A pricing table"),
        );
        match result {
            Err(BrainError::NoExemplars { component_type }) => assert_eq!(component_type, "table"),
            other => panic!("expected NoExemplars, got {:?}", other.map(|c| c.exemplars.len())),
        }
    }

    #[test]
    fn test_exemplars_capped_and_variant_first() {
        let model = model();
        let context = assemble_generation_context(
            &model,
            GenerationRequest::new(ComponentType::Button, "A call to action").with_variant("primary"),
        )
        .unwrap();

        assert_eq!(context.exemplars.len(), MAX_EXEMPLARS);
        assert!(context.exemplars.iter().all(|c| c.component_type == ComponentType::Button));
        assert!(has_variant(&context.exemplars[0], "primary"));
        assert!(context.tokens.is_some());
        assert_eq!(context.constraints, model.constraints);
    }

    #[test]
    fn test_structural_duplicates_are_deferred() {
        let model = model();
        let context = assemble_generation_context(
            &model,
            GenerationRequest::new(ComponentType::Button, "Buttons"),
        )
        .unwrap();

        let signatures: HashSet<_> = context.exemplars.iter().map(|c| &c.signature).collect();
        assert_eq!(signatures.len(), context.exemplars.len());
    }

    #[test]
    fn test_without_tokens() {
        let model = model();
        let context = assemble_generation_context(
            &model,
            GenerationRequest::new(ComponentType::Card, "A feature card").without_tokens(),
        )
        .unwrap();
        assert!(context.tokens.is_none());
        assert_eq!(context.exemplars.len(), 1);
    }

    #[test]
    fn test_render_prompt() {
        let model = model();
        let context = assemble_generation_context(
            &model,
            GenerationRequest::new(ComponentType::Button, "A signup button").with_variant("primary"),
        )
        .unwrap();

        let prompt = context.render_prompt();
        assert!(prompt.starts_with("# Generate a button component"));
        assert!(prompt.contains("Variant: **primary**"));
        assert!(prompt.contains("`color-primary`"));
        assert!(prompt.contains("```html"));
        assert!(prompt.contains("WCAG AA"));
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"type": "card", "description": "Pricing card"}"#).unwrap();
        assert!(request.include_tokens);
        assert_eq!(request.variant, None);
    }
}
