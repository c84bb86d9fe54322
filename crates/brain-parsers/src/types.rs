use brain_common::{BrainError, Result};
use serde::{Deserialize, Serialize};

/// Index of an element in a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A child of an element: either text or another element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Child {
    Element(NodeId),
    Text(String),
}

/// An HTML element with its ordered attributes and children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Child>,
    /// Index into [`Document::sources`]
    pub source: usize,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>, attributes: Vec<(String, String)>, source: usize) -> Self {
        Self {
            tag: tag.into(),
            attributes,
            children: Vec::new(),
            source,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whitespace-split view of the `class` attribute
    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|v| !v.is_empty())
    }

    pub fn role(&self) -> Option<&str> {
        self.attr("role").map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().filter_map(|c| match c {
            Child::Element(id) => Some(*id),
            Child::Text(_) => None,
        })
    }
}

/// CSS text found in a `<style>` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineStyle {
    pub source: usize,
    pub css: String,
}

/// Arena of parsed elements, possibly spanning several source files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    nodes: Vec<ElementNode>,
    roots: Vec<NodeId>,
    sources: Vec<String>,
    inline_styles: Vec<InlineStyle>,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&ElementNode> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn source_name(&self, index: usize) -> Option<&str> {
        self.sources.get(index).map(String::as_str)
    }

    pub fn inline_styles(&self) -> &[InlineStyle] {
        &self.inline_styles
    }

    pub fn add_source(&mut self, name: impl Into<String>) -> usize {
        self.sources.push(name.into());
        self.sources.len() - 1
    }

    pub fn add_inline_style(&mut self, source: usize, css: impl Into<String>) {
        self.inline_styles.push(InlineStyle {
            source,
            css: css.into(),
        });
    }

    /// Add a detached element; attach it with [`append_child`](Self::append_child)
    /// or [`push_root`](Self::push_root)
    pub fn create_element(
        &mut self,
        tag: impl Into<String>,
        attributes: Vec<(String, String)>,
        source: usize,
    ) -> NodeId {
        self.nodes.push(ElementNode::new(tag, attributes, source));
        NodeId(self.nodes.len() - 1)
    }

    pub fn push_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(Child::Element(child));
        }
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(Child::Text(text.into()));
        }
    }

    /// All elements in document order (pre-order, roots in insertion order)
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            self.collect_preorder(*root, &mut out);
        }
        out
    }

    /// The subtree rooted at `id` in pre-order, including `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_preorder(id, &mut out);
        out
    }

    /// Pre-order walk of a subtree. A forest subtree never exceeds the arena
    /// size, so the walk stops there if the arena is not a forest.
    fn collect_preorder(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let start = out.len();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            if out.len() - start >= self.nodes.len() {
                break;
            }
            out.push(current);
            let children: Vec<NodeId> = node.child_elements().collect();
            stack.extend(children.into_iter().rev());
        }
    }

    /// Serialize the subtree rooted at `id` back to markup
    pub fn serialize(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        out.push('<');
        out.push_str(&node.tag);
        for (name, value) in &node.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&node.tag.as_str()) {
            return;
        }
        for child in &node.children {
            match child {
                Child::Element(child_id) => self.write_node(*child_id, out),
                Child::Text(text) => out.push_str(&escape_text(text)),
            }
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }

    /// Check the arena is a forest: every reference resolves, every element
    /// is attached exactly once, and tags are non-empty.
    pub fn validate(&self) -> Result<()> {
        let mut attached = vec![0usize; self.nodes.len()];

        for root in &self.roots {
            let slot = attached.get_mut(root.0).ok_or_else(|| {
                BrainError::MalformedTree(format!("root {} does not exist", root.0))
            })?;
            *slot += 1;
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if node.tag.trim().is_empty() {
                return Err(BrainError::MalformedTree(format!(
                    "element {} has an empty tag name",
                    index
                )));
            }
            if !self.sources.is_empty() && node.source >= self.sources.len() {
                return Err(BrainError::MalformedTree(format!(
                    "element {} references unknown source {}",
                    index, node.source
                )));
            }
            for child in node.child_elements() {
                let slot = attached.get_mut(child.0).ok_or_else(|| {
                    BrainError::MalformedTree(format!(
                        "element {} references missing child {}",
                        index, child.0
                    ))
                })?;
                *slot += 1;
            }
        }

        for (index, count) in attached.iter().enumerate() {
            match count {
                1 => {}
                0 => {
                    return Err(BrainError::MalformedTree(format!(
                        "element {} is not attached to the tree",
                        index
                    )))
                }
                _ => {
                    return Err(BrainError::MalformedTree(format!(
                        "element {} is attached {} times",
                        index, count
                    )))
                }
            }
        }

        Ok(())
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// A single `property: value` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }

    pub fn is_custom_property(&self) -> bool {
        self.property.starts_with("--")
    }
}

/// A style rule with its raw selector text and ordered declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
    /// Enclosing `@media` condition, if the rule is nested in one
    pub media: Option<String>,
    pub source: usize,
}

impl StyleRule {
    pub fn new(selector: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            selector: selector.into(),
            declarations,
            media: None,
            source: 0,
        }
    }

    /// Whether the rule targets the document root (`:root` or `html`)
    pub fn is_root_scope(&self) -> bool {
        self.selector
            .split(',')
            .map(str::trim)
            .any(|s| s == ":root" || s.eq_ignore_ascii_case("html"))
    }
}

/// An ordered list of style rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stylesheet {
    pub rules: Vec<StyleRule>,
    /// Every `@media` condition seen, in source order
    pub media_queries: Vec<String>,
    pub sources: Vec<String>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn add_source(&mut self, name: impl Into<String>) -> usize {
        self.sources.push(name.into());
        self.sources.len() - 1
    }

    /// Every declaration in rule order, paired with its rule
    pub fn declarations(&self) -> impl Iterator<Item = (&StyleRule, &Declaration)> {
        self.rules
            .iter()
            .flat_map(|rule| rule.declarations.iter().map(move |decl| (rule, decl)))
    }

    pub fn validate(&self) -> Result<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.selector.trim().is_empty() {
                return Err(BrainError::MalformedStylesheet(format!(
                    "rule {} has an empty selector",
                    index
                )));
            }
            if let Some(decl) = rule.declarations.iter().find(|d| d.property.trim().is_empty()) {
                return Err(BrainError::MalformedStylesheet(format!(
                    "rule {} ('{}') has a declaration without a property (value '{}')",
                    index, rule.selector, decl.value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_class_list_is_split_view() {
        let node = ElementNode::new("div", attrs(&[("class", "  card  card--wide ")]), 0);
        assert_eq!(node.classes(), vec!["card", "card--wide"]);
    }

    #[test]
    fn test_elements_in_document_order() {
        let mut doc = Document::new();
        let root = doc.create_element("main", vec![], 0);
        let a = doc.create_element("section", vec![], 0);
        let b = doc.create_element("button", vec![], 0);
        let c = doc.create_element("footer", vec![], 0);
        doc.push_root(root);
        doc.append_child(root, a);
        doc.append_child(a, b);
        doc.append_child(root, c);

        assert_eq!(doc.elements(), vec![root, a, b, c]);
        assert_eq!(doc.descendants(a), vec![a, b]);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_descendants_of_detached_cycle_terminate() {
        let mut doc = Document::new();
        let a = doc.create_element("div", vec![], 0);
        let b = doc.create_element("div", vec![], 0);
        doc.append_child(a, b);
        doc.append_child(b, a);

        // Each element is attached once, yet neither is reachable from a root
        assert!(doc.elements().is_empty());
        assert_eq!(doc.descendants(a).len(), 2);
    }

    #[test]
    fn test_descendants_of_wide_tree() {
        let mut doc = Document::new();
        let root = doc.create_element("ul", vec![], 0);
        doc.push_root(root);
        for _ in 0..5_000 {
            let item = doc.create_element("li", vec![], 0);
            doc.append_child(root, item);
        }

        let children: Vec<NodeId> = doc.node(root).unwrap().child_elements().collect();
        assert_eq!(doc.descendants(root).len(), 5_001);
        for child in children {
            assert_eq!(doc.descendants(child), vec![child]);
        }
    }

    #[test]
    fn test_serialize_escapes_and_voids() {
        let mut doc = Document::new();
        let div = doc.create_element("div", attrs(&[("title", "a\"b")]), 0);
        let img = doc.create_element("img", attrs(&[("alt", "x")]), 0);
        doc.push_root(div);
        doc.append_child(div, img);
        doc.append_text(div, "1 < 2");

        assert_eq!(
            doc.serialize(div),
            "<div title=\"a&quot;b\"><img alt=\"x\">1 &lt; 2</div>"
        );
    }

    #[test]
    fn test_validate_rejects_missing_child() {
        let mut doc = Document::new();
        let div = doc.create_element("div", vec![], 0);
        doc.push_root(div);
        doc.append_child(div, NodeId(42));
        assert!(matches!(doc.validate(), Err(BrainError::MalformedTree(_))));
    }

    #[test]
    fn test_validate_rejects_shared_child() {
        let mut doc = Document::new();
        let a = doc.create_element("div", vec![], 0);
        let b = doc.create_element("div", vec![], 0);
        let shared = doc.create_element("span", vec![], 0);
        doc.push_root(a);
        doc.push_root(b);
        doc.append_child(a, shared);
        doc.append_child(b, shared);
        let err = doc.validate().unwrap_err();
        assert!(err.to_string().contains("attached 2 times"));
    }

    #[test]
    fn test_validate_rejects_detached_and_empty_tag() {
        let mut doc = Document::new();
        let a = doc.create_element("div", vec![], 0);
        doc.push_root(a);
        doc.create_element("span", vec![], 0);
        assert!(doc.validate().is_err());

        let mut doc = Document::new();
        let empty = doc.create_element(" ", vec![], 0);
        doc.push_root(empty);
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_root_scope_detection() {
        assert!(StyleRule::new(":root", vec![]).is_root_scope());
        assert!(StyleRule::new("html, body", vec![]).is_root_scope());
        assert!(!StyleRule::new(".root", vec![]).is_root_scope());
    }

    #[test]
    fn test_stylesheet_validate() {
        let mut sheet = Stylesheet::new();
        sheet.rules.push(StyleRule::new(".a", vec![Declaration::new("color", "red")]));
        assert!(sheet.validate().is_ok());
        sheet.rules.push(StyleRule::new("", vec![]));
        assert!(matches!(
            sheet.validate(),
            Err(BrainError::MalformedStylesheet(_))
        ));
    }
}
