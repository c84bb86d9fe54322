//! Selector resolution
//!
//! Binds every selector of every style rule to the elements it matches. Only
//! the subject compound of a selector is matched (tag, `.class`, `#id`);
//! combinators, pseudo-classes and attribute filters are ignored here and
//! read back from the raw selector text by the component extractor.

use brain_parsers::{Declaration, Document, ElementNode, NodeId, Stylesheet};
use serde::Serialize;
use std::collections::HashMap;

/// One selector of a rule, with the elements it matched
#[derive(Debug, Clone, Serialize)]
pub struct SelectorBinding {
    pub selector: String,
    /// Index of the originating rule in the stylesheet
    pub rule: usize,
    pub elements: Vec<NodeId>,
    pub declarations: Vec<Declaration>,
    pub media: Option<String>,
}

/// Decides whether a single (comma-free) selector applies to an element
pub trait SelectorMatcher: Send + Sync {
    fn matches(&self, selector: &str, element: &ElementNode) -> bool;

    /// Every element `selector` applies to, in document order. The default
    /// tests each element with [`SelectorMatcher::matches`].
    fn select(&self, selector: &str, index: &ElementIndex<'_>) -> Vec<NodeId> {
        index
            .all()
            .iter()
            .copied()
            .filter(|id| {
                index
                    .document()
                    .node(*id)
                    .is_some_and(|node| self.matches(selector, node))
            })
            .collect()
    }
}

/// Tag, class and id lookups over one document, built once per run
pub struct ElementIndex<'a> {
    document: &'a Document,
    all: Vec<NodeId>,
    by_tag: HashMap<&'a str, Vec<NodeId>>,
    by_class: HashMap<&'a str, Vec<NodeId>>,
    by_id: HashMap<&'a str, Vec<NodeId>>,
    /// Class list per arena slot
    classes: Vec<Vec<&'a str>>,
}

impl<'a> ElementIndex<'a> {
    pub fn new(document: &'a Document) -> Self {
        let all = document.elements();
        let mut index = Self {
            document,
            all: Vec::new(),
            by_tag: HashMap::new(),
            by_class: HashMap::new(),
            by_id: HashMap::new(),
            classes: vec![Vec::new(); document.len()],
        };

        for &id in &all {
            let Some(node) = document.node(id) else {
                continue;
            };
            index.by_tag.entry(node.tag.as_str()).or_default().push(id);
            if let Some(element_id) = node.id() {
                index.by_id.entry(element_id).or_default().push(id);
            }
            let mut classes = node.classes();
            classes.dedup();
            for class in &classes {
                let list = index.by_class.entry(*class).or_default();
                // Repeated class tokens would list the element twice
                if list.last() != Some(&id) {
                    list.push(id);
                }
            }
            index.classes[id.0] = classes;
        }
        index.all = all;
        index
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Every element in document order
    pub fn all(&self) -> &[NodeId] {
        &self.all
    }

    pub fn with_tag(&self, tag: &str) -> &[NodeId] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn with_class(&self, class: &str) -> &[NodeId] {
        self.by_class.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn with_id(&self, id: &str) -> &[NodeId] {
        self.by_id.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn classes_of(&self, id: NodeId) -> &[&'a str] {
        self.classes.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Subject-compound matcher over tag, class and id
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleMatcher;

#[derive(Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    id: Option<String>,
}

impl Compound {
    /// `:root`, `*` and bare pseudo selectors have nothing structural to match
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.classes.is_empty() && self.id.is_none()
    }

    fn accepts(&self, tag: &str, id: Option<&str>, classes: &[&str]) -> bool {
        if self.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        if self.id.is_some() && self.id.as_deref() != id {
            return false;
        }
        self.classes
            .iter()
            .all(|class| classes.contains(&class.as_str()))
    }
}

impl SimpleMatcher {
    /// Parse the right-most compound of `selector`, dropping pseudo and attribute parts
    fn subject(selector: &str) -> Compound {
        let last = selector
            .split(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~'))
            .filter(|part| !part.is_empty())
            .last()
            .unwrap_or("");

        let mut compound = Compound::default();
        let mut current = String::new();
        let mut kind = 't';
        let mut depth = 0usize;

        let flush = |kind: char, current: &mut String, compound: &mut Compound| {
            if !current.is_empty() {
                let value = std::mem::take(current);
                match kind {
                    't' if value != "*" => compound.tag = Some(value.to_ascii_lowercase()),
                    '.' => compound.classes.push(value),
                    '#' => compound.id = Some(value),
                    _ => {}
                }
            }
        };

        for c in last.chars() {
            if depth > 0 {
                match c {
                    '[' | '(' => depth += 1,
                    ']' | ')' => depth -= 1,
                    _ => {}
                }
                continue;
            }
            match c {
                '.' | '#' | ':' => {
                    flush(kind, &mut current, &mut compound);
                    kind = c;
                }
                '[' | '(' => {
                    flush(kind, &mut current, &mut compound);
                    kind = '[';
                    depth = 1;
                }
                _ => current.push(c),
            }
        }
        flush(kind, &mut current, &mut compound);
        compound
    }
}

impl SelectorMatcher for SimpleMatcher {
    fn matches(&self, selector: &str, element: &ElementNode) -> bool {
        let compound = Self::subject(selector);
        !compound.is_empty() && compound.accepts(&element.tag, element.id(), &element.classes())
    }

    /// Parses the selector once and starts from the narrowest index list
    fn select(&self, selector: &str, index: &ElementIndex<'_>) -> Vec<NodeId> {
        let compound = Self::subject(selector);
        if compound.is_empty() {
            return Vec::new();
        }

        let candidates: &[NodeId] = if let Some(id) = &compound.id {
            index.with_id(id)
        } else if !compound.classes.is_empty() {
            compound
                .classes
                .iter()
                .map(|class| index.with_class(class))
                .min_by_key(|list| list.len())
                .unwrap_or(&[])
        } else if let Some(tag) = &compound.tag {
            index.with_tag(tag)
        } else {
            &[]
        };

        candidates
            .iter()
            .copied()
            .filter(|&id| {
                index.document().node(id).is_some_and(|node| {
                    compound.accepts(&node.tag, node.id(), index.classes_of(id))
                })
            })
            .collect()
    }
}

/// Selector bindings for one ingestion run
#[derive(Debug, Default)]
pub struct SelectorMap {
    bindings: Vec<SelectorBinding>,
    by_element: Vec<Vec<usize>>,
}

impl SelectorMap {
    pub fn bindings(&self) -> &[SelectorBinding] {
        &self.bindings
    }

    /// Bindings matching `id`, in stylesheet order
    pub fn for_element(&self, id: NodeId) -> impl Iterator<Item = &SelectorBinding> + '_ {
        self.by_element
            .get(id.0)
            .into_iter()
            .flatten()
            .map(move |idx| &self.bindings[*idx])
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Resolve every selector in `stylesheet` against `document` with [`SimpleMatcher`]
pub fn resolve(document: &Document, stylesheet: &Stylesheet) -> SelectorMap {
    resolve_with(document, stylesheet, &SimpleMatcher)
}

pub fn resolve_with(
    document: &Document,
    stylesheet: &Stylesheet,
    matcher: &dyn SelectorMatcher,
) -> SelectorMap {
    let index = ElementIndex::new(document);
    let mut map = SelectorMap {
        bindings: Vec::new(),
        by_element: vec![Vec::new(); document.len()],
    };

    for (rule_idx, rule) in stylesheet.rules.iter().enumerate() {
        for selector in rule.selector.split(',').map(str::trim) {
            if selector.is_empty() {
                continue;
            }

            let matched = matcher.select(selector, &index);

            let binding_idx = map.bindings.len();
            for id in &matched {
                map.by_element[id.0].push(binding_idx);
            }
            // Dangling selectors are kept with an empty match set
            map.bindings.push(SelectorBinding {
                selector: selector.to_string(),
                rule: rule_idx,
                elements: matched,
                declarations: rule.declarations.clone(),
                media: rule.media.clone(),
            });
        }
    }

    map
}
