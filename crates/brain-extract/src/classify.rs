//! Fixed classification tables: component boundaries, type cascade,
//! categories, composition and per-type guidance.

use brain_common::{ComponentCategory, ComponentType};
use brain_parsers::ElementNode;

/// Tags that make an element a component candidate on their own
pub const SEMANTIC_TAGS: &[&str] = &[
    "header", "nav", "main", "article", "section", "aside", "footer", "button", "form", "table",
    "figure", "dialog",
];

/// Boundary rule: non-empty class, semantic tag, or an explicit role
pub fn is_candidate(element: &ElementNode) -> bool {
    !element.classes().is_empty()
        || SEMANTIC_TAGS.contains(&element.tag.as_str())
        || element.role().is_some()
}

struct TypeRule {
    component_type: ComponentType,
    tags: &'static [&'static str],
    roles: &'static [&'static str],
    class_hints: &'static [&'static str],
}

/// Ordered cascade. Tags and roles are tried across every rule before any
/// class hint, and within each pass the first match wins.
const TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        component_type: ComponentType::Button,
        tags: &["button"],
        roles: &["button"],
        class_hints: &["btn", "button"],
    },
    TypeRule {
        component_type: ComponentType::Input,
        tags: &["input", "textarea", "select"],
        roles: &["textbox", "combobox", "searchbox"],
        class_hints: &["input", "field"],
    },
    TypeRule {
        component_type: ComponentType::Modal,
        tags: &["dialog"],
        roles: &["dialog", "alertdialog"],
        class_hints: &["modal", "dialog"],
    },
    TypeRule {
        component_type: ComponentType::Nav,
        tags: &["nav"],
        roles: &["navigation", "menu", "menubar"],
        class_hints: &["nav", "menu"],
    },
    TypeRule {
        component_type: ComponentType::Header,
        tags: &["header"],
        roles: &["banner"],
        class_hints: &["header"],
    },
    TypeRule {
        component_type: ComponentType::Footer,
        tags: &["footer"],
        roles: &["contentinfo"],
        class_hints: &["footer"],
    },
    TypeRule {
        component_type: ComponentType::Form,
        tags: &["form"],
        roles: &["form", "search"],
        class_hints: &["form"],
    },
    TypeRule {
        component_type: ComponentType::Table,
        tags: &["table"],
        roles: &["table", "grid"],
        class_hints: &["table"],
    },
    TypeRule {
        component_type: ComponentType::List,
        tags: &["ul", "ol", "dl"],
        roles: &["list"],
        class_hints: &["list"],
    },
    TypeRule {
        component_type: ComponentType::Card,
        tags: &["article"],
        roles: &["article"],
        class_hints: &["card"],
    },
];

/// Infer the component type of an element
pub fn infer_type(element: &ElementNode) -> ComponentType {
    let role = element.role().map(str::to_ascii_lowercase);
    let by_markup = TYPE_RULES.iter().find(|rule| {
        rule.tags.contains(&element.tag.as_str())
            || role.as_deref().is_some_and(|r| rule.roles.contains(&r))
    });
    if let Some(rule) = by_markup {
        return rule.component_type;
    }

    // BEM element classes name a part of their block, not a component
    let classes: Vec<String> = element
        .classes()
        .iter()
        .filter(|c| !c.contains("__"))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    TYPE_RULES
        .iter()
        .find(|rule| {
            classes
                .iter()
                .any(|c| rule.class_hints.iter().any(|hint| c.contains(hint)))
        })
        .map(|rule| rule.component_type)
        .unwrap_or(ComponentType::Custom)
}

pub fn category_for(component_type: ComponentType) -> ComponentCategory {
    match component_type {
        ComponentType::Button => ComponentCategory::Actions,
        ComponentType::Input | ComponentType::Form => ComponentCategory::Forms,
        ComponentType::Nav => ComponentCategory::Navigation,
        ComponentType::Header | ComponentType::Footer => ComponentCategory::Layout,
        ComponentType::Modal => ComponentCategory::Overlays,
        ComponentType::Table | ComponentType::List => ComponentCategory::DataDisplay,
        ComponentType::Card | ComponentType::Custom => ComponentCategory::Content,
    }
}

/// Static composition table
pub fn allowed_children(component_type: ComponentType) -> &'static [ComponentType] {
    use ComponentType::*;
    match component_type {
        Card => &[Button, Input, List, Custom],
        Modal => &[Header, Footer, Button, Form, Input, Custom],
        Nav => &[List, Button],
        Header => &[Nav, Button, Custom],
        Footer => &[Nav, List, Custom],
        Form => &[Input, Button],
        Table => &[Button, Custom],
        List => &[Card, Button, Custom],
        Button | Input | Custom => &[],
    }
}

pub fn use_cases(component_type: ComponentType) -> &'static [&'static str] {
    match component_type {
        ComponentType::Button => &[
            "Primary and secondary calls to action",
            "Form submission",
            "Triggering dialogs and menus",
        ],
        ComponentType::Input => &["Collecting user text", "Search fields", "Form data entry"],
        ComponentType::Card => &[
            "Grouping related content",
            "Product or article previews",
            "Dashboard tiles",
        ],
        ComponentType::Modal => &["Confirmations", "Focused sub-tasks", "Blocking alerts"],
        ComponentType::Nav => &["Site navigation", "Section switching"],
        ComponentType::Header => &["Page branding", "Top-level navigation container"],
        ComponentType::Footer => &["Secondary links", "Legal and contact information"],
        ComponentType::Form => &["Sign-up and login", "Settings", "Data entry workflows"],
        ComponentType::Table => &["Tabular data", "Comparisons", "Admin listings"],
        ComponentType::List => &["Collections of similar items", "Feature lists"],
        ComponentType::Custom => &["Template-specific layout or content block"],
    }
}

pub fn required_attributes(component_type: ComponentType) -> &'static [&'static str] {
    match component_type {
        ComponentType::Button => &["type", "aria-label (icon-only buttons)"],
        ComponentType::Input => &["id", "name", "associated <label> or aria-label"],
        ComponentType::Modal => &["role=\"dialog\"", "aria-modal=\"true\"", "aria-labelledby"],
        ComponentType::Nav => &["aria-label"],
        ComponentType::Form => &["action or submit handler", "labels for every field"],
        ComponentType::Table => &["<caption> or aria-label", "scope on header cells"],
        ComponentType::Card
        | ComponentType::Header
        | ComponentType::Footer
        | ComponentType::List
        | ComponentType::Custom => &[],
    }
}

pub fn keyboard_hints(component_type: ComponentType) -> &'static [&'static str] {
    match component_type {
        ComponentType::Button => &["Enter and Space activate", "Visible focus indicator"],
        ComponentType::Input => &["Tab focuses the field", "Visible focus indicator"],
        ComponentType::Modal => &[
            "Escape closes",
            "Focus is trapped while open",
            "Focus returns to the trigger on close",
        ],
        ComponentType::Nav => &["Tab moves between links", "Arrow keys inside menus"],
        ComponentType::Form => &["Enter submits", "Logical tab order"],
        ComponentType::Table => &["Interactive cells reachable by Tab"],
        ComponentType::Card
        | ComponentType::Header
        | ComponentType::Footer
        | ComponentType::List
        | ComponentType::Custom => &[],
    }
}
