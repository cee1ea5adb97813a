//! Markdown tree.
//!
//! Every node exclusively owns its children, so the tree is acyclic by
//! construction. Passes mutate it in place and walk it depth-first in
//! document order.

use std::fmt;

use crate::directive::DirectiveArgs;
use crate::fence::FenceDirectives;

/// Byte range of a block node in the document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Column alignment of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

/// Fenced or indented code block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Code {
    /// Language tag, the first word of the info string.
    pub lang: Option<String>,
    /// Meta tokens not yet consumed by any pass.
    pub meta: Option<String>,
    /// Code content without the fences.
    pub value: String,
    /// Directives parsed out of the meta string.
    pub fence: FenceDirectives,
}

/// Parsed directive (`:name`, `::name`, `:::name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub args: DirectiveArgs,
}

/// Type-specific payload of a markdown node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Root,
    Paragraph,
    Heading {
        depth: u8,
        id: Option<String>,
        classes: Vec<String>,
    },
    ThematicBreak,
    Blockquote {
        alert: Option<String>,
    },
    List {
        ordered: bool,
        start: Option<u64>,
    },
    ListItem {
        checked: Option<bool>,
        /// Loose items render their paragraphs; tight items render the
        /// paragraph content directly.
        spread: bool,
    },
    Code(Code),
    Html(String),
    Text(String),
    Emphasis,
    Strong,
    Delete,
    InlineCode(String),
    Break,
    Link {
        url: String,
        title: String,
    },
    Image {
        url: String,
        title: String,
        alt: String,
    },
    Table {
        align: Vec<Align>,
    },
    TableRow {
        header: bool,
    },
    TableCell {
        colspan: u32,
    },
    FootnoteReference {
        label: String,
    },
    FootnoteDefinition {
        label: String,
    },
    DefinitionList,
    DefinitionTerm,
    DefinitionDescription,
    Superscript,
    Subscript,
    Mark,
    /// Bracketed span `[text]{attrs}`; attributes are in the node's hints.
    Span,
    /// Generic block wrapper; tag and attributes come from the hints.
    Division,
    Abbr {
        title: String,
    },
    InlineMath(String),
    Math(String),
    Figure,
    FigCaption,
    GridTable,
    ContainerDirective(Directive),
    LeafDirective(Directive),
    TextDirective(Directive),
    Embed,
    CustomBlock {
        name: String,
    },
    CustomBlockTitle,
    CustomBlockBody,
    /// ESM `import`/`export` statement kept verbatim in MDX documents.
    MdxEsm(String),
    /// `{expression}` block kept verbatim in MDX documents.
    MdxExpression(String),
}

/// Closed set of node kinds used to key bridge handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading,
    ThematicBreak,
    Blockquote,
    List,
    ListItem,
    Code,
    Html,
    Text,
    Emphasis,
    Strong,
    Delete,
    InlineCode,
    Break,
    Link,
    Image,
    Table,
    TableRow,
    TableCell,
    FootnoteReference,
    FootnoteDefinition,
    DefinitionList,
    DefinitionTerm,
    DefinitionDescription,
    Superscript,
    Subscript,
    Mark,
    Span,
    Division,
    Abbr,
    InlineMath,
    Math,
    Figure,
    FigCaption,
    GridTable,
    ContainerDirective,
    LeafDirective,
    TextDirective,
    Embed,
    CustomBlock,
    CustomBlockTitle,
    CustomBlockBody,
    MdxEsm,
    MdxExpression,
}

impl NodeKind {
    /// Name of the kind as it appears in fallback markup and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::ThematicBreak => "thematicBreak",
            Self::Blockquote => "blockquote",
            Self::List => "list",
            Self::ListItem => "listItem",
            Self::Code => "code",
            Self::Html => "html",
            Self::Text => "text",
            Self::Emphasis => "emphasis",
            Self::Strong => "strong",
            Self::Delete => "delete",
            Self::InlineCode => "inlineCode",
            Self::Break => "break",
            Self::Link => "link",
            Self::Image => "image",
            Self::Table => "table",
            Self::TableRow => "tableRow",
            Self::TableCell => "tableCell",
            Self::FootnoteReference => "footnoteReference",
            Self::FootnoteDefinition => "footnoteDefinition",
            Self::DefinitionList => "definitionList",
            Self::DefinitionTerm => "definitionTerm",
            Self::DefinitionDescription => "definitionDescription",
            Self::Superscript => "superscript",
            Self::Subscript => "subscript",
            Self::Mark => "mark",
            Self::Span => "span",
            Self::Division => "division",
            Self::Abbr => "abbr",
            Self::InlineMath => "inlineMath",
            Self::Math => "math",
            Self::Figure => "figure",
            Self::FigCaption => "figcaption",
            Self::GridTable => "gridTable",
            Self::ContainerDirective => "containerDirective",
            Self::LeafDirective => "leafDirective",
            Self::TextDirective => "textDirective",
            Self::Embed => "embed",
            Self::CustomBlock => "customBlock",
            Self::CustomBlockTitle => "customBlockTitle",
            Self::CustomBlockBody => "customBlockBody",
            Self::MdxEsm => "mdxjsEsm",
            Self::MdxExpression => "mdxFlowExpression",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overrides a pass can attach to steer the bridge.
///
/// `h_name` replaces the element name the handler produced and
/// `h_properties` are merged into its attributes (`class` is appended).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeData {
    pub h_name: Option<String>,
    pub h_properties: Vec<(String, String)>,
}

impl NodeData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.h_name.is_none() && self.h_properties.is_empty()
    }
}

/// A markdown tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub value: NodeValue,
    pub children: Vec<Node>,
    /// Source span, set on block nodes produced by the parser.
    pub position: Option<Span>,
    pub data: NodeData,
}

impl Node {
    #[must_use]
    pub fn new(value: NodeValue) -> Self {
        Self {
            value,
            children: Vec::new(),
            position: None,
            data: NodeData::default(),
        }
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(NodeValue::Text(value.into()))
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Option<Span>) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_h_name(mut self, name: impl Into<String>) -> Self {
        self.data.h_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_h_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.h_properties.push((name.into(), value.into()));
        self
    }

    /// Kind tag of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match &self.value {
            NodeValue::Root => NodeKind::Root,
            NodeValue::Paragraph => NodeKind::Paragraph,
            NodeValue::Heading { .. } => NodeKind::Heading,
            NodeValue::ThematicBreak => NodeKind::ThematicBreak,
            NodeValue::Blockquote { .. } => NodeKind::Blockquote,
            NodeValue::List { .. } => NodeKind::List,
            NodeValue::ListItem { .. } => NodeKind::ListItem,
            NodeValue::Code(_) => NodeKind::Code,
            NodeValue::Html(_) => NodeKind::Html,
            NodeValue::Text(_) => NodeKind::Text,
            NodeValue::Emphasis => NodeKind::Emphasis,
            NodeValue::Strong => NodeKind::Strong,
            NodeValue::Delete => NodeKind::Delete,
            NodeValue::InlineCode(_) => NodeKind::InlineCode,
            NodeValue::Break => NodeKind::Break,
            NodeValue::Link { .. } => NodeKind::Link,
            NodeValue::Image { .. } => NodeKind::Image,
            NodeValue::Table { .. } => NodeKind::Table,
            NodeValue::TableRow { .. } => NodeKind::TableRow,
            NodeValue::TableCell { .. } => NodeKind::TableCell,
            NodeValue::FootnoteReference { .. } => NodeKind::FootnoteReference,
            NodeValue::FootnoteDefinition { .. } => NodeKind::FootnoteDefinition,
            NodeValue::DefinitionList => NodeKind::DefinitionList,
            NodeValue::DefinitionTerm => NodeKind::DefinitionTerm,
            NodeValue::DefinitionDescription => NodeKind::DefinitionDescription,
            NodeValue::Superscript => NodeKind::Superscript,
            NodeValue::Subscript => NodeKind::Subscript,
            NodeValue::Mark => NodeKind::Mark,
            NodeValue::Span => NodeKind::Span,
            NodeValue::Division => NodeKind::Division,
            NodeValue::Abbr { .. } => NodeKind::Abbr,
            NodeValue::InlineMath(_) => NodeKind::InlineMath,
            NodeValue::Math(_) => NodeKind::Math,
            NodeValue::Figure => NodeKind::Figure,
            NodeValue::FigCaption => NodeKind::FigCaption,
            NodeValue::GridTable => NodeKind::GridTable,
            NodeValue::ContainerDirective(_) => NodeKind::ContainerDirective,
            NodeValue::LeafDirective(_) => NodeKind::LeafDirective,
            NodeValue::TextDirective(_) => NodeKind::TextDirective,
            NodeValue::Embed => NodeKind::Embed,
            NodeValue::CustomBlock { .. } => NodeKind::CustomBlock,
            NodeValue::CustomBlockTitle => NodeKind::CustomBlockTitle,
            NodeValue::CustomBlockBody => NodeKind::CustomBlockBody,
            NodeValue::MdxEsm(_) => NodeKind::MdxEsm,
            NodeValue::MdxExpression(_) => NodeKind::MdxExpression,
        }
    }

    /// Whether the node's content is literal and must never be rewritten
    /// by text passes.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(
            self.value,
            NodeValue::Code(_)
                | NodeValue::Html(_)
                | NodeValue::InlineCode(_)
                | NodeValue::InlineMath(_)
                | NodeValue::Math(_)
                | NodeValue::MdxEsm(_)
                | NodeValue::MdxExpression(_)
        )
    }

    /// Plain text of the node and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.value {
            NodeValue::Text(s) | NodeValue::InlineCode(s) | NodeValue::InlineMath(s) => {
                out.push_str(s);
            }
            NodeValue::Break => out.push('\n'),
            NodeValue::Image { alt, .. } => out.push_str(alt),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Visit every node depth-first in document order.
    pub fn walk<F: FnMut(&Node)>(&self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Visit every node mutably, parents before children.
    pub fn walk_mut<F: FnMut(&mut Node)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    /// Visit every code node mutably.
    pub fn for_each_code<F: FnMut(&mut Code)>(&mut self, f: &mut F) {
        if let NodeValue::Code(code) = &mut self.value {
            f(code);
        }
        for child in &mut self.children {
            child.for_each_code(f);
        }
    }

    /// Rewrite every list of siblings, parents before children.
    ///
    /// The callback receives the parent's children and may insert, remove
    /// or replace entries. Replacement nodes are visited afterwards.
    pub fn rewrite_children<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Vec<Node>),
    {
        if self.is_literal() {
            return;
        }
        f(&mut self.children);
        for child in &mut self.children {
            child.rewrite_children(f);
        }
    }

    /// Clear source positions in the subtree.
    ///
    /// Used for fragments parsed from a substring, whose offsets do not
    /// refer to the document source.
    pub fn clear_positions(&mut self) {
        self.walk_mut(&mut |node| node.position = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(text: &str) -> Node {
        Node::new(NodeValue::Paragraph).with_children(vec![Node::text(text)])
    }

    #[test]
    fn test_text_content_joins_descendants() {
        let node = Node::new(NodeValue::Paragraph).with_children(vec![
            Node::text("Hello "),
            Node::new(NodeValue::Strong).with_children(vec![Node::text("big")]),
            Node::new(NodeValue::InlineCode(" world".to_owned())),
        ]);
        assert_eq!(node.text_content(), "Hello big world");
    }

    #[test]
    fn test_walk_is_document_order() {
        let root = Node::new(NodeValue::Root).with_children(vec![paragraph("a"), paragraph("b")]);
        let mut seen = Vec::new();
        root.walk(&mut |node| {
            if let NodeValue::Text(text) = &node.value {
                seen.push(text.clone());
            }
        });
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_rewrite_children_skips_literal_nodes() {
        let mut root = Node::new(NodeValue::Root).with_children(vec![
            Node::new(NodeValue::Code(Code::default())).with_children(vec![Node::text("x")]),
        ]);
        let mut calls = 0;
        root.rewrite_children(&mut |_| calls += 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(NodeKind::GridTable.to_string(), "gridTable");
        assert_eq!(
            Node::new(NodeValue::Figure).kind().as_str(),
            "figure"
        );
    }
}
