//! HTML parsing
//!
//! Uses html5ever's RcDom and converts it into the element arena consumed by
//! the extractor. `<script>` subtrees are dropped; `<style>` text is kept aside
//! as inline CSS.

use crate::types::{Document, NodeId};
use brain_common::Result;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use tracing::debug;

/// HTML5 parser
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a single HTML string into a fresh document
    pub fn parse(&self, html: &str) -> Result<Document> {
        let mut document = Document::new();
        self.parse_into(&mut document, html, "inline")?;
        Ok(document)
    }

    /// Parse `html` and append its element tree to `document` under a new source
    pub fn parse_into(&self, document: &mut Document, html: &str, source_name: &str) -> Result<()> {
        let source = document.add_source(source_name);
        if html.trim().is_empty() {
            debug!("Skipping empty HTML source {}", source_name);
            return Ok(());
        }

        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        let before = document.len();
        self.convert_node(&dom.document, document, None, source);
        debug!(
            "Parsed {} elements from {}",
            document.len() - before,
            source_name
        );
        Ok(())
    }

    fn convert_node(
        &self,
        handle: &Handle,
        document: &mut Document,
        parent: Option<NodeId>,
        source: usize,
    ) {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, document, parent, source);
                }
            }
            RcNodeData::Element { name, attrs, .. } => {
                let tag = name.local.to_string().to_ascii_lowercase();
                match tag.as_str() {
                    "script" | "noscript" => return,
                    "style" => {
                        let css = Self::text_content(handle);
                        if !css.trim().is_empty() {
                            document.add_inline_style(source, css);
                        }
                        return;
                    }
                    _ => {}
                }

                let attributes = attrs
                    .borrow()
                    .iter()
                    .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                    .collect();

                let id = document.create_element(tag, attributes, source);
                match parent {
                    Some(parent) => document.append_child(parent, id),
                    None => document.push_root(id),
                }

                for child in handle.children.borrow().iter() {
                    self.convert_node(child, document, Some(id), source);
                }
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if let Some(parent) = parent {
                    if !text.trim().is_empty() {
                        document.append_text(parent, text);
                    }
                }
            }
            // Doctype, comments and processing instructions carry no structure
            _ => {}
        }
    }

    fn text_content(handle: &Handle) -> String {
        let mut out = String::new();
        for child in handle.children.borrow().iter() {
            if let RcNodeData::Text { contents } = &child.data {
                out.push_str(&contents.borrow());
            }
        }
        out
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}
