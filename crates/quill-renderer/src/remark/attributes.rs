//! `{#id .class key=value}` attributes on inline content.
//!
//! An attribute block directly after emphasis, strong, strikethrough,
//! inline code, a link or an image is attached to that element. A
//! bracketed span `[text]{attrs}` becomes a `<span>` with the attributes.
//! Heading attributes are handled by the parser.

use crate::directive::{DirectiveArgs, parse_attr_block};
use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};

use super::names;

/// Attaches attribute blocks to the inline node they follow.
///
/// Event handler attributes (`on*`) are dropped.
#[derive(Debug, Default)]
pub struct Attributes;

impl MarkdownPass for Attributes {
    fn name(&self) -> &'static str {
        names::ATTRIBUTES
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.rewrite_children(&mut |children| {
            bracketed_spans(children);
            trailing_blocks(children);
        });
        Ok(())
    }
}

fn takes_attributes(node: &Node) -> bool {
    matches!(
        node.value,
        NodeValue::Emphasis
            | NodeValue::Strong
            | NodeValue::Delete
            | NodeValue::InlineCode(_)
            | NodeValue::Link { .. }
            | NodeValue::Image { .. }
            | NodeValue::Span
    )
}

fn apply(node: &mut Node, args: DirectiveArgs) {
    let hints = &mut node.data.h_properties;
    if let Some(id) = args.id {
        hints.push(("id".to_owned(), id));
    }
    hints.extend(args.classes.into_iter().map(|c| ("class".to_owned(), c)));
    hints.extend(
        args.attrs
            .into_iter()
            .filter(|(key, _)| !key.to_ascii_lowercase().starts_with("on")),
    );
}

/// Move a `{..}` block at the start of a text node onto the node before it.
fn trailing_blocks(children: &mut Vec<Node>) {
    let mut i = 1;
    while i < children.len() {
        let parsed = match &children[i].value {
            NodeValue::Text(text) if takes_attributes(&children[i - 1]) => {
                parse_attr_block(text).map(|(args, used)| (args, text[used..].to_owned()))
            }
            _ => None,
        };
        if let Some((args, rest)) = parsed {
            apply(&mut children[i - 1], args);
            if rest.is_empty() {
                children.remove(i);
                continue;
            }
            children[i] = Node::text(rest);
        }
        i += 1;
    }
}

/// Bracket opened in text child `open.0` at byte `open.1` and closed by
/// `]{..}` in text child `close.0` at byte `close.1`.
struct SpanMatch {
    open: (usize, usize),
    close: (usize, usize),
    /// Byte after the attribute block in the closing text.
    end: usize,
    args: DirectiveArgs,
}

fn text_of(node: &Node) -> Option<&str> {
    match &node.value {
        NodeValue::Text(text) => Some(text),
        _ => None,
    }
}

fn find_span(children: &[Node], i: usize) -> Option<SpanMatch> {
    let text = text_of(&children[i])?;
    for (open, _) in text.match_indices('[') {
        let close = match text[open + 1..].find(']') {
            Some(rel) => Some((i, open + 1 + rel)),
            None => children
                .iter()
                .enumerate()
                .skip(i + 1)
                .find_map(|(j, node)| text_of(node)?.find(']').map(|at| (j, at))),
        };
        let Some((j, at)) = close else {
            continue;
        };
        let tail = text_of(&children[j])?;
        if let Some((args, used)) = parse_attr_block(&tail[at + 1..]) {
            return Some(SpanMatch {
                open: (i, open),
                close: (j, at),
                end: at + 1 + used,
                args,
            });
        }
    }
    None
}

fn push_text(out: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        out.push(Node::text(text));
    }
}

fn bracketed_spans(children: &mut Vec<Node>) {
    let mut i = 0;
    while i < children.len() {
        let Some(found) = find_span(children, i) else {
            i += 1;
            continue;
        };
        let ((first, open), (last, close)) = (found.open, found.close);
        let head = text_of(&children[first]).unwrap_or_default().to_owned();
        let tail = text_of(&children[last]).unwrap_or_default().to_owned();

        let mut inner = Vec::new();
        if first == last {
            push_text(&mut inner, &head[open + 1..close]);
        } else {
            push_text(&mut inner, &head[open + 1..]);
            inner.extend(children[first + 1..last].iter().cloned());
            push_text(&mut inner, &tail[..close]);
        }
        let mut span = Node::new(NodeValue::Span).with_children(inner);
        apply(&mut span, found.args);

        let mut replacement = Vec::new();
        push_text(&mut replacement, &head[..open]);
        let span_at = first + replacement.len();
        replacement.push(span);
        push_text(&mut replacement, &tail[found.end..]);
        children.splice(first..=last, replacement);
        i = span_at + 1;
    }
}
