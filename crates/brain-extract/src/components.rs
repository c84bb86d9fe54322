//! Component segmentation and DNA extraction
//!
//! Every element that satisfies the boundary rule becomes exactly one
//! [`ComponentRecord`]. Nested candidates are all emitted and structural
//! duplicates are not merged; each record carries a `signature` so callers
//! can group them.

use crate::classify;
use crate::resolver::{SelectorBinding, SelectorMap};
use crate::values::{self, CustomProperties};
use brain_common::{
    AccessibilityNotes, ComponentRecord, ComponentState, ComponentStructure, ComponentStyling,
    ComponentType, CompositionRules, Interaction, StateKind, StyleChange, StyleUsage, TokenUsage,
    UsageGuidance, Variant,
};
use brain_parsers::{Document, ElementNode, NodeId};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// Extract one record per boundary-satisfying element, in document order
pub fn extract_components(
    document: &Document,
    selectors: &SelectorMap,
    properties: &CustomProperties,
) -> Vec<ComponentRecord> {
    let extractor = ComponentExtractor {
        document,
        selectors,
        properties,
    };

    let records: Vec<ComponentRecord> = document
        .elements()
        .into_iter()
        .filter_map(|id| {
            let element = document.node(id)?;
            classify::is_candidate(element).then(|| extractor.extract(id, element))
        })
        .collect();

    debug!("Extracted {} component records", records.len());
    records
}

struct ComponentExtractor<'a> {
    document: &'a Document,
    selectors: &'a SelectorMap,
    properties: &'a CustomProperties,
}

impl ComponentExtractor<'_> {
    fn extract(&self, id: NodeId, element: &ElementNode) -> ComponentRecord {
        let classes: Vec<String> = element.classes().iter().map(|c| c.to_string()).collect();
        let base_class = base_class(&classes);
        let name = base_class
            .clone()
            .unwrap_or_else(|| element.tag.clone());

        let component_type = classify::infer_type(element);
        let bindings: Vec<&SelectorBinding> = self.selectors.for_element(id).collect();
        let source = self.document.source_name(element.source).map(String::from);

        let styling = self.styling(&bindings);
        let states = detect_states(&bindings);
        let interactions = detect_interactions(&states, &styling);
        let variants = base_class
            .as_deref()
            .map(|base| detect_variants(base, &classes, &bindings))
            .unwrap_or_default();

        let mut selector_list: Vec<String> = Vec::new();
        for binding in &bindings {
            if !selector_list.contains(&binding.selector) {
                selector_list.push(binding.selector.clone());
            }
        }

        let structure = ComponentStructure {
            tag: element.tag.clone(),
            classes,
            html: self.document.serialize(id),
            node: id.0,
            source: source.clone(),
            selectors: selector_list,
            semantic_tags: self.semantic_tags(id),
        };

        let record_id = Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("{}:{}:{}", source.as_deref().unwrap_or(""), id.0, name).as_bytes(),
        )
        .to_string();

        ComponentRecord {
            id: record_id,
            description: describe(component_type, &name, &variants),
            category: classify::category_for(component_type),
            signature: signature(element, &styling),
            usage: usage_for(component_type, &variants, &states, &styling),
            accessibility: accessibility_for(component_type, element),
            composition: CompositionRules {
                allowed_children: classify::allowed_children(component_type).to_vec(),
            },
            name,
            component_type,
            structure,
            styling,
            states,
            interactions,
            variants,
        }
    }

    fn styling(&self, bindings: &[&SelectorBinding]) -> ComponentStyling {
        let mut css = String::new();
        let mut declarations = Vec::new();
        let mut custom_properties = BTreeMap::new();

        for binding in bindings {
            if binding.declarations.is_empty() {
                continue;
            }
            css.push_str(&binding.selector);
            css.push_str(" {\n");
            for decl in &binding.declarations {
                css.push_str(&format!("  {}: {};\n", decl.property, decl.value));

                if decl.is_custom_property() {
                    custom_properties
                        .entry(decl.property.clone())
                        .or_insert_with(|| decl.value.clone());
                    continue;
                }

                let refs = values::var_refs(&decl.value);
                let usage = match refs.first() {
                    Some(path) => {
                        let resolved = self.properties.resolve(&decl.value);
                        for name in &refs {
                            if let Some(value) = self.properties.resolve(&format!("var({})", name))
                            {
                                custom_properties.entry(name.clone()).or_insert(value);
                            }
                        }
                        TokenUsage::Token {
                            path: path.clone(),
                            resolved,
                        }
                    }
                    None => TokenUsage::Literal,
                };

                declarations.push(StyleUsage {
                    selector: binding.selector.clone(),
                    property: decl.property.clone(),
                    value: decl.value.clone(),
                    important: decl.important,
                    usage,
                });
            }
            css.push_str("}\n");
        }

        ComponentStyling {
            css,
            declarations,
            custom_properties,
        }
    }

    /// Semantic tags found in the subtree, in document order
    fn semantic_tags(&self, id: NodeId) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for node in self
            .document
            .descendants(id)
            .into_iter()
            .filter_map(|d| self.document.node(d))
        {
            if classify::SEMANTIC_TAGS.contains(&node.tag.as_str()) && !tags.contains(&node.tag) {
                tags.push(node.tag.clone());
            }
        }
        tags
    }
}

/// First non-modifier class, or the block part of a lone modifier
fn base_class(classes: &[String]) -> Option<String> {
    classes
        .iter()
        .find(|c| !c.contains("--"))
        .cloned()
        .or_else(|| {
            classes
                .first()
                .and_then(|c| c.split("--").next())
                .filter(|block| !block.is_empty())
                .map(String::from)
        })
}

/// Whether `selector` references `.class` as a whole class name
fn mentions_class(selector: &str, class: &str) -> bool {
    let needle = format!(".{}", class);
    selector.match_indices(&needle).any(|(idx, _)| {
        selector[idx + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '-' || c == '_'))
    })
}

fn state_kind(selector: &str) -> Option<StateKind> {
    let lower = selector.to_ascii_lowercase();
    if lower.contains(":hover") {
        Some(StateKind::Hover)
    } else if lower.contains(":focus") {
        Some(StateKind::Focus)
    } else if lower.contains(":active") {
        Some(StateKind::Active)
    } else if lower.contains(":disabled") || lower.contains("[disabled]") {
        Some(StateKind::Disabled)
    } else if lower.contains("loading") {
        Some(StateKind::Loading)
    } else if !lower.contains(':') {
        Some(StateKind::Default)
    } else {
        // Other pseudo-classes and pseudo-elements describe no state
        None
    }
}

fn detect_states(bindings: &[&SelectorBinding]) -> Vec<ComponentState> {
    let mut states: Vec<ComponentState> = Vec::new();
    for binding in bindings {
        let Some(kind) = state_kind(&binding.selector) else {
            continue;
        };
        let changes: Vec<StyleChange> = binding
            .declarations
            .iter()
            .filter(|d| !d.is_custom_property())
            .map(|d| StyleChange {
                property: d.property.clone(),
                value: d.value.clone(),
            })
            .collect();
        if changes.is_empty() {
            continue;
        }

        match states
            .iter_mut()
            .find(|s| s.state == kind && s.selector == binding.selector)
        {
            Some(existing) => existing.changes.extend(changes),
            None => states.push(ComponentState {
                state: kind,
                selector: binding.selector.clone(),
                changes,
            }),
        }
    }
    states
}

fn detect_interactions(states: &[ComponentState], styling: &ComponentStyling) -> Vec<Interaction> {
    let mut interactions: Vec<Interaction> = Vec::new();
    let mut push = |trigger: &str, effect: String| {
        if !interactions
            .iter()
            .any(|i| i.trigger == trigger && i.effect == effect)
        {
            interactions.push(Interaction {
                trigger: trigger.to_string(),
                effect,
            });
        }
    };

    for state in states {
        let trigger = match state.state {
            StateKind::Hover => "pointer hover",
            StateKind::Focus => "keyboard focus",
            StateKind::Active => "press",
            StateKind::Disabled => "disabled",
            StateKind::Default | StateKind::Loading => continue,
        };
        let properties: Vec<&str> = state.changes.iter().map(|c| c.property.as_str()).collect();
        push(trigger, format!("changes {}", properties.join(", ")));
    }

    for decl in &styling.declarations {
        if decl.property == "transition" || decl.property == "transition-property" {
            push("state change", format!("animates {}", decl.value));
        }
    }

    interactions
}

fn detect_variants(base: &str, classes: &[String], bindings: &[&SelectorBinding]) -> Vec<Variant> {
    let prefix = format!("{}--", base);
    let mut variants: Vec<Variant> = Vec::new();

    for class in classes {
        let Some(suffix) = class.strip_prefix(&prefix) else {
            continue;
        };
        if suffix.is_empty() || variants.iter().any(|v| v.class_name == *class) {
            continue;
        }

        let overrides = bindings
            .iter()
            .filter(|b| mentions_class(&b.selector, class))
            .flat_map(|b| b.declarations.iter())
            .map(|d| StyleChange {
                property: d.property.clone(),
                value: d.value.clone(),
            })
            .collect();

        variants.push(Variant {
            name: suffix.to_string(),
            class_name: class.clone(),
            overrides,
        });
    }
    variants
}

/// Structural hash over tag, class set and declaration set
fn signature(element: &ElementNode, styling: &ComponentStyling) -> String {
    let mut classes = element.classes();
    classes.sort_unstable();
    classes.dedup();

    let mut declarations: Vec<String> = styling
        .declarations
        .iter()
        .map(|d| format!("{}:{}", d.property, d.value))
        .collect();
    declarations.sort();
    declarations.dedup();

    let key = format!(
        "{}|{}|{}",
        element.tag,
        classes.join(" "),
        declarations.join(";")
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

fn describe(component_type: ComponentType, name: &str, variants: &[Variant]) -> String {
    let type_name = component_type.as_str();
    let mut title = type_name.to_string();
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }

    if variants.is_empty() {
        format!("{} component '{}'", title, name)
    } else {
        let names: Vec<&str> = variants.iter().map(|v| v.name.as_str()).collect();
        format!(
            "{} component '{}' with variants: {}",
            title,
            name,
            names.join(", ")
        )
    }
}

fn usage_for(
    component_type: ComponentType,
    variants: &[Variant],
    states: &[ComponentState],
    styling: &ComponentStyling,
) -> UsageGuidance {
    let mut guidelines = Vec::new();

    if !variants.is_empty() {
        let names: Vec<&str> = variants.iter().map(|v| v.class_name.as_str()).collect();
        guidelines.push(format!("Pick a variant with a modifier class: {}", names.join(", ")));
    }

    let interactive: Vec<&str> = states
        .iter()
        .filter(|s| s.state != StateKind::Default)
        .map(|s| s.state.as_str())
        .collect();
    if !interactive.is_empty() {
        guidelines.push(format!("Styles are defined for: {}", interactive.join(", ")));
    }

    let token_backed = styling
        .declarations
        .iter()
        .filter(|d| d.usage.is_token())
        .count();
    if token_backed > 0 {
        guidelines.push(format!(
            "{} of {} declarations use design tokens; keep new values on tokens",
            token_backed,
            styling.declarations.len()
        ));
    }

    UsageGuidance {
        use_cases: classify::use_cases(component_type)
            .iter()
            .map(|s| s.to_string())
            .collect(),
        guidelines,
    }
}

fn accessibility_for(component_type: ComponentType, element: &ElementNode) -> AccessibilityNotes {
    let label = ["aria-label", "aria-labelledby", "title", "alt"]
        .iter()
        .find_map(|attr| element.attr(attr))
        .map(String::from);

    AccessibilityNotes {
        role: element.role().map(String::from),
        label,
        aria_attributes: element
            .attributes
            .iter()
            .filter(|(name, _)| name.starts_with("aria-"))
            .map(|(name, _)| name.clone())
            .collect(),
        required_attributes: classify::required_attributes(component_type)
            .iter()
            .map(|s| s.to_string())
            .collect(),
        keyboard: classify::keyboard_hints(component_type)
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use brain_common::ComponentCategory;
    use brain_parsers::{CssParser, HtmlParser};

    fn extract(html: &str, css: &str) -> Vec<ComponentRecord> {
        let doc = HtmlParser::new().parse(html).unwrap();
        let sheet = CssParser::new().parse(css);
        let map = resolve(&doc, &sheet);
        let props = CustomProperties::collect(&sheet);
        extract_components(&doc, &map, &props)
    }

    #[test]
    fn test_button_record() {
        let records = extract(
            r#"<button class="btn btn--primary">Go</button>"#,
            ".btn { padding: 8px 16px; } .btn--primary { background: var(--color-blue); } .btn:hover { opacity: 0.9 } :root{--color-blue:#0066FF;}",
        );

        assert_eq!(records.len(), 1);
        let button = &records[0];
        assert_eq!(button.name, "btn");
        assert_eq!(button.component_type, ComponentType::Button);
        assert_eq!(button.category, ComponentCategory::Actions);
        assert_eq!(button.variants.len(), 1);
        assert_eq!(button.variants[0].name, "primary");
        assert_eq!(button.variants[0].overrides[0].property, "background");
        assert_eq!(
            button.structure.selectors,
            vec![".btn", ".btn--primary", ".btn:hover"]
        );

        let background = button
            .styling
            .declarations
            .iter()
            .find(|d| d.property == "background")
            .unwrap();
        assert_eq!(
            background.usage,
            TokenUsage::Token {
                path: "--color-blue".to_string(),
                resolved: Some("#0066FF".to_string()),
            }
        );
        assert_eq!(
            button.styling.custom_properties.get("--color-blue").map(String::as_str),
            Some("#0066FF")
        );

        let hover = button
            .states
            .iter()
            .find(|s| s.state == StateKind::Hover)
            .unwrap();
        assert_eq!(hover.changes[0].value, "0.9");
        assert!(button.interactions.iter().any(|i| i.trigger == "pointer hover"));
    }

    #[test]
    fn test_nested_candidates_are_all_emitted() {
        let records = extract(
            r#"<div class="card"><button class="btn">A</button><button class="btn">B</button></div>"#,
            "",
        );
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["card", "btn", "btn"]);
        // Distinct records, same structure
        assert_ne!(records[1].id, records[2].id);
        assert_eq!(records[1].signature, records[2].signature);
        // No matching CSS still yields a record
        assert!(records[0].styling.declarations.is_empty());
        assert!(records[0].styling.css.is_empty());
    }

    #[test]
    fn test_variant_count_matches_modifier_classes() {
        let records = extract(
            r#"<div class="card card--wide card--dark card--wide other--x"></div>"#,
            "",
        );
        let names: Vec<_> = records[0].variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["wide", "dark"]);
    }

    #[test]
    fn test_semantic_tag_without_class() {
        let records = extract(r#"<nav aria-label="Main"><a href="/">Home</a></nav>"#, "");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "nav");
        assert_eq!(records[0].component_type, ComponentType::Nav);
        assert_eq!(records[0].accessibility.label.as_deref(), Some("Main"));
        assert_eq!(records[0].accessibility.aria_attributes, vec!["aria-label"]);
    }

    #[test]
    fn test_state_kinds() {
        assert_eq!(state_kind(".btn:focus-visible"), Some(StateKind::Focus));
        assert_eq!(state_kind(".btn:active"), Some(StateKind::Active));
        assert_eq!(state_kind(".tab:ACTIVE"), Some(StateKind::Active));
        assert_eq!(state_kind(".btn[disabled]"), Some(StateKind::Disabled));
        assert_eq!(state_kind(".btn.is-loading"), Some(StateKind::Loading));
        assert_eq!(state_kind(".btn"), Some(StateKind::Default));
        assert_eq!(state_kind(".btn::before"), None);
    }

    #[test]
    fn test_mentions_class() {
        assert!(mentions_class(".btn--primary:hover", "btn--primary"));
        assert!(!mentions_class(".btn--primary-dark", "btn--primary"));
    }

    #[test]
    fn test_base_class() {
        let classes = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(base_class(&classes(&["btn--primary", "btn"])), Some("btn".into()));
        assert_eq!(base_class(&classes(&["btn--primary"])), Some("btn".into()));
        assert_eq!(base_class(&[]), None);
    }
}
