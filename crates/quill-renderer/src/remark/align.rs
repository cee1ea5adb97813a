//! `[center]` ... `[/center]` alignment.
//!
//! Tags on lines of their own wrap every block between them in a flex
//! column (or a flex row for `[center:row]`). Tags inside one paragraph
//! align its text. A backslash before a tag keeps it literal.

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};
use crate::source::raw_lines;

use super::names;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Center,
    Right,
}

impl Side {
    const ALL: [Self; 3] = [Self::Left, Self::Center, Self::Right];

    fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Classes for a single aligned paragraph.
    fn text_class(self) -> &'static str {
        match self {
            Self::Left => "text-left",
            Self::Center => "text-center",
            Self::Right => "text-right",
        }
    }

    /// Classes for a range of blocks.
    fn block_classes(self, row: bool) -> &'static str {
        match (self, row) {
            (Self::Left, false) => "flex flex-col items-start",
            (Self::Center, false) => "flex flex-col items-center",
            (Self::Right, false) => "flex flex-col items-end",
            (Self::Left, true) => "flex justify-start",
            (Self::Center, true) => "flex justify-center",
            (Self::Right, true) => "flex justify-end",
        }
    }
}

/// An alignment tag found in a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    side: Side,
    row: bool,
    /// The paragraph holds nothing but the tag.
    alone: bool,
    /// Tag text as written, e.g. `[/center:row]`.
    text: String,
}

fn tag_text(side: Side, row: bool, closing: bool) -> String {
    format!(
        "[{}{}{}]",
        if closing { "/" } else { "" },
        side.as_str(),
        if row { ":row" } else { "" }
    )
}

fn tags(closing: bool) -> impl Iterator<Item = (Side, bool, String)> {
    Side::ALL
        .into_iter()
        .flat_map(move |side| [false, true].map(|row| (side, row, tag_text(side, row, closing))))
}

fn text_of(node: &Node) -> Option<&str> {
    match &node.value {
        NodeValue::Text(text) => Some(text),
        _ => None,
    }
}

/// Whether the raw source around the paragraph escapes its tag.
fn escaped(node: &Node, source: &str, at_end: bool) -> bool {
    let Some(lines) = raw_lines(source, node) else {
        return false;
    };
    let line = if at_end { lines.last() } else { lines.first() };
    line.is_some_and(|line| {
        if at_end {
            tags(true).any(|(_, _, tag)| line.trim_end().ends_with(&format!("\\{tag}")))
        } else {
            line.trim_start().starts_with("\\[")
        }
    })
}

fn opening_tag(node: &Node, source: &str) -> Option<Tag> {
    if !matches!(node.value, NodeValue::Paragraph) {
        return None;
    }
    let first = text_of(node.children.first()?)?;
    let (side, row, text) = tags(false).find(|(_, _, tag)| first.starts_with(tag.as_str()))?;
    if escaped(node, source, false) {
        return None;
    }
    let alone = node.children.len() == 1 && first.trim() == text;
    Some(Tag { side, row, alone, text })
}

fn closing_tag(node: &Node, source: &str) -> Option<Tag> {
    if !matches!(node.value, NodeValue::Paragraph) {
        return None;
    }
    let last = text_of(node.children.last()?)?.trim_end();
    let (side, row, text) = tags(true).find(|(_, _, tag)| last.ends_with(tag.as_str()))?;
    if escaped(node, source, true) {
        return None;
    }
    let alone = node.children.len() == 1 && last.trim_start() == text;
    Some(Tag { side, row, alone, text })
}

fn strip_opening(paragraph: &mut Node, tag: &str) {
    if let Some(first) = paragraph.children.first_mut()
        && let NodeValue::Text(text) = &mut first.value
        && let Some(rest) = text.strip_prefix(tag)
    {
        *text = rest.trim_start().to_owned();
    }
    drop_empty_text(paragraph);
}

fn strip_closing(paragraph: &mut Node, tag: &str) {
    if let Some(last) = paragraph.children.last_mut()
        && let NodeValue::Text(text) = &mut last.value
        && let Some(rest) = text.trim_end().strip_suffix(tag)
    {
        *text = rest.trim_end().to_owned();
    }
    drop_empty_text(paragraph);
}

fn drop_empty_text(paragraph: &mut Node) {
    paragraph
        .children
        .retain(|c| !matches!(&c.value, NodeValue::Text(t) if t.is_empty()));
}

fn is_empty_paragraph(node: &Node) -> bool {
    matches!(node.value, NodeValue::Paragraph)
        && node
            .children
            .iter()
            .all(|c| matches!(&c.value, NodeValue::Text(t) if t.trim().is_empty()))
}

/// Wraps aligned content in a `div` with alignment classes.
#[derive(Debug, Default)]
pub struct Align;

impl MarkdownPass for Align {
    fn name(&self) -> &'static str {
        names::ALIGN
    }

    fn run(&self, tree: &mut Node, cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let source = cx.source();
        tree.rewrite_children(&mut |children| wrap_ranges(children, source));
        Ok(())
    }
}

fn wrap_ranges(children: &mut Vec<Node>, source: &str) {
    let mut i = 0;
    while i < children.len() {
        if let Some(start) = opening_tag(&children[i], source)
            && let Some((end, close)) = find_close(children, i, &start, source)
        {
            let wrapped = wrap(children.drain(i..=end).collect(), &start, &close);
            if let Some(node) = wrapped {
                children.insert(i, node);
                i += 1;
            }
            continue;
        }
        i += 1;
    }
}

fn find_close(children: &[Node], start: usize, open: &Tag, source: &str) -> Option<(usize, Tag)> {
    children
        .iter()
        .enumerate()
        .skip(start)
        .find_map(|(j, node)| {
            let close = closing_tag(node, source)?;
            let paired = close.side == open.side && !(j == start && open.alone && close.alone);
            paired.then_some((j, close))
        })
}

fn wrap(mut segment: Vec<Node>, open: &Tag, close: &Tag) -> Option<Node> {
    if open.alone {
        segment.remove(0);
    } else if let Some(first) = segment.first_mut() {
        strip_opening(first, &open.text);
    }
    if segment.first().is_some_and(is_empty_paragraph) {
        segment.remove(0);
    }

    if close.alone {
        segment.pop();
    } else if let Some(last) = segment.last_mut() {
        strip_closing(last, &close.text);
    }
    if segment.last().is_some_and(is_empty_paragraph) {
        segment.pop();
    }

    if segment.is_empty() {
        return None;
    }
    let classes = if open.alone || close.alone || open.row {
        open.side.block_classes(open.row)
    } else {
        open.side.text_class()
    };
    let mut node = Node::new(NodeValue::Division).with_children(segment);
    for class in classes.split_whitespace() {
        node = node.with_h_property("class", class);
    }
    Some(node)
}
