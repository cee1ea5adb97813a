//! Generic directive syntax.
//!
//! Recognises `:::name` containers, `::name` leaves and `:name[label]`
//! text directives. Other passes and the bridge give particular names a
//! meaning; unknown names fall back to a generic element.

use crate::directive::{FenceLine, find_text_directive, parse_fence_line, parse_leaf_line};
use crate::error::PassError;
use crate::mdast::{Directive, Node, NodeValue, Span};
use crate::parse::parse_inline_fragment;
use crate::pass::{MarkdownPass, RunContext};
use crate::source::raw_lines;

use super::{Descend, names, splice_matches, split_text};

/// Parses directive syntax into directive nodes.
#[derive(Debug, Default)]
pub struct Directives;

impl MarkdownPass for Directives {
    fn name(&self) -> &'static str {
        names::DIRECTIVES
    }

    fn run(&self, tree: &mut Node, cx: &mut RunContext<'_>) -> Result<(), PassError> {
        expand_blocks(&mut tree.children, cx.source());
        expand_text(tree);
        Ok(())
    }
}

fn expand_blocks(children: &mut Vec<Node>, source: &str) {
    let mut i = 0;
    while i < children.len() {
        if let Some(FenceLine::Open { name, args, colons }) = fence_at(&children[i], source) {
            let close = closing_fence(children, i + 1, colons, source);
            let body_end = close.unwrap_or(children.len());
            let position = span(children, i, close.unwrap_or(children.len() - 1));

            let mut body: Vec<Node> = children.drain(i + 1..body_end).collect();
            expand_blocks(&mut body, source);
            if close.is_some() {
                children.remove(i + 1);
            }
            children[i] = Node::new(NodeValue::ContainerDirective(Directive { name, args }))
                .with_children(body)
                .with_position(position);
        } else if let Some(leaf) = leaf_at(&children[i], source) {
            children[i] = leaf;
        } else if !children[i].is_literal() {
            expand_blocks(&mut children[i].children, source);
        }
        i += 1;
    }
}

/// Index of the sibling closing a container opened with `colons` colons.
///
/// Nested openings must be closed first. Unclosed containers run to the end
/// of their parent.
fn closing_fence(children: &[Node], from: usize, colons: usize, source: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (j, node) in children.iter().enumerate().skip(from) {
        match fence_at(node, source) {
            Some(FenceLine::Open { .. }) => depth += 1,
            Some(FenceLine::Close { colons: closing }) if depth == 0 && closing >= colons => {
                return Some(j);
            }
            Some(FenceLine::Close { .. }) => depth = depth.saturating_sub(1),
            None => {}
        }
    }
    None
}

/// The single raw line of a one-line paragraph.
fn single_line(node: &Node, source: &str) -> Option<String> {
    if !matches!(node.value, NodeValue::Paragraph) {
        return None;
    }
    let mut lines = raw_lines(source, node)?;
    (lines.len() == 1).then(|| lines.remove(0))
}

fn fence_at(node: &Node, source: &str) -> Option<FenceLine> {
    parse_fence_line(&single_line(node, source)?)
}

fn span(children: &[Node], first: usize, last: usize) -> Option<Span> {
    let start = children[first].position?.start;
    let end = children[last].position?.end;
    Some(Span::new(start, end))
}

fn leaf_at(node: &Node, source: &str) -> Option<Node> {
    let line = single_line(node, source)?;
    let (name, args) = parse_leaf_line(&line)?;
    let children = if args.has_label {
        parse_inline_fragment(&args.label)
    } else {
        Vec::new()
    };
    Some(
        Node::new(NodeValue::LeafDirective(Directive { name, args }))
            .with_children(children)
            .with_position(node.position),
    )
}

fn expand_text(tree: &mut Node) {
    split_text(tree, Descend::All, &mut |text| {
        let mut found = Vec::new();
        let mut from = 0;
        while let Some(m) = find_text_directive(text, from) {
            from = m.end;
            let children = parse_inline_fragment(&m.args.label);
            let node = Node::new(NodeValue::TextDirective(Directive {
                name: m.name,
                args: m.args,
            }))
            .with_children(children);
            found.push((m.start, m.end, node));
        }
        splice_matches(text, found)
    });
}
