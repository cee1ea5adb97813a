//! Conversion of the markdown tree into the HTML tree.
//!
//! Every markdown node kind is converted by a [`Handler`] looked up in a
//! [`HandlerMap`]. Extension nodes get their handlers registered the same
//! way as core ones, and callers can replace any of them. A node kind with
//! no handler is never dropped silently: it becomes a placeholder element
//! naming the kind and a warning is recorded.
//!
//! Nodes may carry `h_name`/`h_properties` hints set by markdown passes;
//! they override the tag and add attributes of the element a handler
//! produces.

mod footnotes;
mod handlers;

use std::collections::HashMap;

use crate::hast::{self, Element};
use crate::mdast::{self, NodeData, NodeKind};
use crate::options::PipelineOptions;

use self::footnotes::Footnotes;

/// Converts one markdown node into zero or more HTML nodes.
pub type Handler = fn(&mut Bridge<'_>, &mdast::Node) -> Vec<hast::Node>;

/// Handlers by node kind.
#[derive(Debug, Clone)]
pub struct HandlerMap {
    handlers: HashMap<NodeKind, Handler>,
}

impl Default for HandlerMap {
    fn default() -> Self {
        Self::standard()
    }
}

impl HandlerMap {
    /// No handlers at all; every node becomes a placeholder.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Handlers for the CommonMark and GFM node kinds only.
    #[must_use]
    pub fn core() -> Self {
        let mut map = Self::empty();
        handlers::register_core(&mut map);
        map
    }

    /// Handlers for every node kind the parser and the standard passes
    /// produce.
    #[must_use]
    pub fn standard() -> Self {
        let mut map = Self::empty();
        handlers::register_core(&mut map);
        handlers::register_extensions(&mut map);
        map
    }

    /// Register a handler, returning the one it replaces.
    pub fn register(&mut self, kind: NodeKind, handler: Handler) -> Option<Handler> {
        self.handlers.insert(kind, handler)
    }

    #[must_use]
    pub fn with(mut self, kind: NodeKind, handler: Handler) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn unregister(&mut self, kind: NodeKind) -> Option<Handler> {
        self.handlers.remove(&kind)
    }

    #[must_use]
    pub fn get(&self, kind: NodeKind) -> Option<Handler> {
        self.handlers.get(&kind).copied()
    }

    #[must_use]
    pub fn contains(&self, kind: NodeKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

/// State of one conversion.
pub struct Bridge<'a> {
    handlers: &'a HandlerMap,
    options: &'a PipelineOptions,
    footnotes: Footnotes,
    warnings: Vec<String>,
}

impl<'a> Bridge<'a> {
    #[must_use]
    pub fn new(handlers: &'a HandlerMap, options: &'a PipelineOptions) -> Self {
        Self {
            handlers,
            options,
            footnotes: Footnotes::default(),
            warnings: Vec::new(),
        }
    }

    /// Convert a whole markdown tree.
    ///
    /// Returns the HTML root and the warnings recorded on the way.
    pub fn convert_tree(mut self, root: &mdast::Node) -> (hast::Node, Vec<String>) {
        self.footnotes.collect(root);
        let mut children = self.convert(root);

        // Root handlers return the root's children.
        if let Some(section) = footnotes::section(&mut self) {
            if !children.is_empty() {
                children.push(hast::Node::text("\n"));
            }
            children.push(section.into());
        }
        (hast::Node::Root(children), self.warnings)
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        self.options
    }

    pub fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Convert one node through its handler and apply its hints.
    pub fn convert(&mut self, node: &mdast::Node) -> Vec<hast::Node> {
        let kind = node.kind();
        let Some(handler) = self.handlers.get(kind) else {
            self.warn(format!("no HTML handler for '{kind}' node"));
            let placeholder = Element::new("div")
                .with_attr("data-unhandled-node", kind.as_str())
                .with_children(self.inline(node));
            return vec![placeholder.into()];
        };

        let mut nodes = handler(self, node);
        if !node.data.is_empty() {
            apply_hints(&mut nodes, &node.data);
        }
        nodes
    }

    /// Convert children without separators.
    pub fn inline(&mut self, node: &mdast::Node) -> Vec<hast::Node> {
        node.children.iter().flat_map(|c| self.convert(c)).collect()
    }

    /// Convert block children, separated by newlines.
    pub fn blocks(&mut self, node: &mdast::Node) -> Vec<hast::Node> {
        let mut out = Vec::new();
        for child in &node.children {
            let converted = self.convert(child);
            if converted.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(hast::Node::text("\n"));
            }
            out.extend(converted);
        }
        out
    }

    pub(crate) fn footnotes(&mut self) -> &mut Footnotes {
        &mut self.footnotes
    }
}

/// Apply `h_name`/`h_properties` to the single element a handler produced.
fn apply_hints(nodes: &mut [hast::Node], data: &NodeData) {
    let [hast::Node::Element(el)] = nodes else {
        return;
    };
    if let Some(name) = &data.h_name {
        el.tag.clone_from(name);
    }
    for (name, value) in &data.h_properties {
        if name == "class" {
            el.add_class(value);
        } else {
            el.set_attr(name, value);
        }
    }
}

/// Convert a markdown tree with the given handlers.
#[must_use]
pub fn to_hast(
    root: &mdast::Node,
    handlers: &HandlerMap,
    options: &PipelineOptions,
) -> (hast::Node, Vec<String>) {
    Bridge::new(handlers, options).convert_tree(root)
}
