//! Markdown parsing into the markdown tree.
//!
//! Builds on pulldown-cmark's event stream. The parser is permissive:
//! any input produces a tree, and syntax it cannot interpret stays as text.
//!
//! pulldown-cmark's own `$` math is left disabled; math delimiters are
//! handled by a markdown pass so a lone `$5` is never math. pulldown-cmark
//! reads a masked copy of the source (see [`crate::mask`]) so directive
//! lines and math bodies survive as typed.

use std::ops::Range;

use pulldown_cmark::{
    Alignment, BlockQuoteKind, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag,
};

use crate::document::ContentType;
use crate::fence::split_info;
use crate::mask::mask;
use crate::mdast::{Align, Code, Node, NodeValue, Span};
use crate::source::block_lines;

/// Parser options for GFM plus the extensions the passes build on.
fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_DEFINITION_LIST
        | Options::ENABLE_SUPERSCRIPT
        | Options::ENABLE_SUBSCRIPT
        | Options::ENABLE_GFM
}

/// Settings that change how source text is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep `$x$` bodies away from markdown, as for `$$x$$`.
    pub single_dollar_math: bool,
}

/// Parse a whole document.
#[must_use]
pub fn parse(source: &str, content_type: ContentType) -> Node {
    parse_with(source, content_type, ParseOptions::default())
}

/// Parse a whole document with explicit settings.
#[must_use]
pub fn parse_with(source: &str, content_type: ContentType, options: ParseOptions) -> Node {
    let mut root = TreeBuilder::new().build(source, options);
    if content_type == ContentType::Mdx {
        mark_mdx_blocks(&mut root, source);
    }
    root
}

/// Parse a markdown fragment taken out of a larger document.
///
/// Positions are cleared since they refer to the fragment, not the document.
#[must_use]
pub fn parse_fragment(source: &str) -> Vec<Node> {
    let mut root = TreeBuilder::new().build(source, ParseOptions::default());
    root.clear_positions();
    root.children
}

/// Parse a fragment expected to hold inline content only.
///
/// A single resulting paragraph is unwrapped into its inline children.
#[must_use]
pub fn parse_inline_fragment(source: &str) -> Vec<Node> {
    let mut children = parse_fragment(source);
    if children.len() == 1 && matches!(children[0].value, NodeValue::Paragraph) {
        return children.remove(0).children;
    }
    children
}

struct TreeBuilder {
    stack: Vec<Node>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Node::new(NodeValue::Root)],
        }
    }

    fn build(mut self, source: &str, options: ParseOptions) -> Node {
        let masked = mask(source, options.single_dollar_math);
        let input = masked.as_deref().unwrap_or(source);

        for (event, range) in Parser::new_ext(input, parser_options()).into_offset_iter() {
            let span = Span::new(range.start, range.end);
            match event {
                Event::Start(tag) => {
                    let node = start_node(tag).with_position(Some(span));
                    self.stack.push(node);
                }
                Event::End(_) => self.close(),
                Event::Text(text) => self.text(unmask(source, input, &text, &range), span),
                Event::Code(code) => {
                    self.push(
                        Node::new(NodeValue::InlineCode(code.into_string()))
                            .with_position(Some(span)),
                    );
                }
                Event::InlineMath(math) => {
                    self.push(Node::new(NodeValue::InlineMath(math.into_string())));
                }
                Event::DisplayMath(math) => {
                    self.push(Node::new(NodeValue::Math(math.into_string())));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    self.html(unmask(source, input, &html, &range));
                }
                Event::FootnoteReference(label) => {
                    self.push(Node::new(NodeValue::FootnoteReference {
                        label: label.into_string(),
                    }));
                }
                Event::SoftBreak => self.text("\n", span),
                Event::HardBreak => self.push(Node::new(NodeValue::Break)),
                Event::Rule => {
                    let node = match masked_line(source, input, &range) {
                        Some(line) => Node::new(NodeValue::Paragraph)
                            .with_children(vec![Node::text(line).with_position(Some(span))]),
                        None => Node::new(NodeValue::ThematicBreak),
                    };
                    self.push(node.with_position(Some(span)));
                }
                Event::TaskListMarker(checked) => self.task_marker(checked),
            }
        }

        // Unbalanced events never happen with pulldown-cmark, but close
        // anything left open rather than losing content.
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack.pop().unwrap_or_else(|| Node::new(NodeValue::Root))
    }

    fn top(&mut self) -> &mut Node {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push(&mut self, node: Node) {
        self.top().children.push(node);
    }

    fn close(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        let Some(mut node) = self.stack.pop() else {
            return;
        };
        match &mut node.value {
            NodeValue::Image { alt, .. } => {
                *alt = node.children.iter().map(Node::text_content).collect();
                node.children.clear();
            }
            NodeValue::ListItem { .. } => wrap_tight_item(&mut node),
            _ => {}
        }
        self.push(node);
    }

    fn text(&mut self, text: &str, span: Span) {
        let top = self.top();
        match &mut top.value {
            NodeValue::Code(code) => code.value.push_str(text),
            NodeValue::Html(html) => html.push_str(text),
            _ => {
                if let Some(Node {
                    value: NodeValue::Text(prev),
                    position,
                    ..
                }) = top.children.last_mut()
                {
                    prev.push_str(text);
                    if let Some(position) = position {
                        position.end = position.end.max(span.end);
                    }
                } else {
                    top.children
                        .push(Node::text(text).with_position(Some(span)));
                }
            }
        }
    }

    fn html(&mut self, html: &str) {
        let top = self.top();
        if let NodeValue::Html(block) = &mut top.value {
            block.push_str(html);
        } else {
            top.children.push(Node::new(NodeValue::Html(html.to_owned())));
        }
    }

    fn task_marker(&mut self, checked: bool) {
        if let Some(item) = self
            .stack
            .iter_mut()
            .rev()
            .find(|n| matches!(n.value, NodeValue::ListItem { .. }))
        {
            if let NodeValue::ListItem { checked: slot, .. } = &mut item.value {
                *slot = Some(checked);
            }
        }
    }
}

/// Text the parser read from a masked line, taken from the original source.
fn unmask<'a>(source: &'a str, input: &'a str, text: &'a str, range: &Range<usize>) -> &'a str {
    match (input.get(range.clone()), source.get(range.clone())) {
        (Some(seen), Some(original)) if seen == text && seen != original => original,
        _ => text,
    }
}

/// Original text of a thematic break produced by masking.
fn masked_line(source: &str, input: &str, range: &Range<usize>) -> Option<String> {
    let original = source.get(range.clone())?;
    if input.get(range.clone())? == original {
        return None;
    }
    let line = original
        .trim_start_matches(|c: char| c == '>' || c.is_whitespace())
        .trim_end();
    Some(line.to_owned())
}

fn start_node(tag: Tag<'_>) -> Node {
    let value = match tag {
        Tag::Paragraph => NodeValue::Paragraph,
        Tag::Heading {
            level, id, classes, ..
        } => NodeValue::Heading {
            depth: heading_depth(level),
            id: id.map(|id| id.into_string()),
            classes: classes.into_iter().map(|c| c.into_string()).collect(),
        },
        Tag::BlockQuote(kind) => NodeValue::Blockquote {
            alert: kind.map(|k| alert_name(k).to_owned()),
        },
        Tag::CodeBlock(kind) => {
            let (lang, meta) = match kind {
                CodeBlockKind::Fenced(info) => split_info(&info),
                CodeBlockKind::Indented => (None, None),
            };
            NodeValue::Code(Code {
                lang,
                meta,
                ..Code::default()
            })
        }
        Tag::HtmlBlock => NodeValue::Html(String::new()),
        Tag::List(start) => NodeValue::List {
            ordered: start.is_some(),
            start,
        },
        Tag::Item => NodeValue::ListItem {
            checked: None,
            spread: true,
        },
        Tag::FootnoteDefinition(label) => NodeValue::FootnoteDefinition {
            label: label.into_string(),
        },
        Tag::DefinitionList => NodeValue::DefinitionList,
        Tag::DefinitionListTitle => NodeValue::DefinitionTerm,
        Tag::DefinitionListDefinition => NodeValue::DefinitionDescription,
        Tag::Table(aligns) => NodeValue::Table {
            align: aligns.into_iter().map(convert_align).collect(),
        },
        Tag::TableHead => NodeValue::TableRow { header: true },
        Tag::TableRow => NodeValue::TableRow { header: false },
        Tag::TableCell => NodeValue::TableCell { colspan: 1 },
        Tag::Emphasis => NodeValue::Emphasis,
        Tag::Strong => NodeValue::Strong,
        Tag::Strikethrough => NodeValue::Delete,
        Tag::Superscript => NodeValue::Superscript,
        Tag::Subscript => NodeValue::Subscript,
        Tag::Link {
            dest_url, title, ..
        } => NodeValue::Link {
            url: dest_url.into_string(),
            title: title.into_string(),
        },
        Tag::Image {
            dest_url, title, ..
        } => NodeValue::Image {
            url: dest_url.into_string(),
            title: title.into_string(),
            alt: String::new(),
        },
        // Metadata blocks are not enabled; front matter is split off earlier
        Tag::MetadataBlock(_) => NodeValue::Html(String::new()),
    };
    Node::new(value)
}

/// Tight list items hold inline content directly; wrap each run of it in
/// a paragraph so later passes see the same shape as in loose items.
fn wrap_tight_item(item: &mut Node) {
    if !item.children.iter().any(is_inline) {
        return;
    }

    let mut children = Vec::with_capacity(item.children.len());
    let mut run: Vec<Node> = Vec::new();
    for child in std::mem::take(&mut item.children) {
        if is_inline(&child) {
            run.push(child);
        } else {
            flush_paragraph(&mut run, &mut children);
            children.push(child);
        }
    }
    flush_paragraph(&mut run, &mut children);

    item.children = children;
    if let NodeValue::ListItem { spread, .. } = &mut item.value {
        *spread = false;
    }
}

fn flush_paragraph(run: &mut Vec<Node>, out: &mut Vec<Node>) {
    if run.is_empty() {
        return;
    }
    let start = run.iter().find_map(|n| n.position).map(|s| s.start);
    let end = run.iter().rev().find_map(|n| n.position).map(|s| s.end);
    let position = start.zip(end).map(|(start, end)| Span::new(start, end));
    out.push(
        Node::new(NodeValue::Paragraph)
            .with_children(std::mem::take(run))
            .with_position(position),
    );
}

fn is_inline(node: &Node) -> bool {
    match node.value {
        NodeValue::Text(_)
        | NodeValue::Emphasis
        | NodeValue::Strong
        | NodeValue::Delete
        | NodeValue::InlineCode(_)
        | NodeValue::Break
        | NodeValue::Link { .. }
        | NodeValue::Image { .. }
        | NodeValue::FootnoteReference { .. }
        | NodeValue::Superscript
        | NodeValue::Subscript
        | NodeValue::InlineMath(_) => true,
        // Inline HTML carries no position, HTML blocks do.
        NodeValue::Html(_) => node.position.is_none(),
        _ => false,
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn convert_align(align: Alignment) -> Align {
    match align {
        Alignment::None => Align::None,
        Alignment::Left => Align::Left,
        Alignment::Center => Align::Center,
        Alignment::Right => Align::Right,
    }
}

fn alert_name(kind: BlockQuoteKind) -> &'static str {
    match kind {
        BlockQuoteKind::Note => "note",
        BlockQuoteKind::Tip => "tip",
        BlockQuoteKind::Important => "important",
        BlockQuoteKind::Warning => "warning",
        BlockQuoteKind::Caution => "caution",
    }
}

/// Turn top-level ESM statements and `{expression}` paragraphs into
/// verbatim MDX nodes.
fn mark_mdx_blocks(root: &mut Node, source: &str) {
    for node in &mut root.children {
        if !matches!(node.value, NodeValue::Paragraph) {
            continue;
        }
        let Some(span) = node.position else {
            continue;
        };
        let raw = block_lines(source, span).join("\n");
        let trimmed = raw.trim();

        let value = if trimmed.starts_with("import ") || trimmed.starts_with("export ") {
            NodeValue::MdxEsm(trimmed.to_owned())
        } else if trimmed.starts_with('{') && trimmed.ends_with('}') {
            NodeValue::MdxExpression(trimmed.to_owned())
        } else {
            continue;
        };
        node.value = value;
        node.children.clear();
    }
}
