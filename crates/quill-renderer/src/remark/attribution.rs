//! Blockquote attribution lines.
//!
//! A quote whose last line starts with an em dash (or `--`) names its
//! source. The quote is wrapped in a `figure.c-blockquote` with the source
//! in a `figcaption.c-blockquote__attribution`.

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};

use super::names;

const MARKERS: [&str; 3] = ["\u{2014}", "\u{2015}", "--"];

/// Moves attribution lines out of blockquotes into figure captions.
#[derive(Debug, Default)]
pub struct Attribution;

impl MarkdownPass for Attribution {
    fn name(&self) -> &'static str {
        names::ATTRIBUTION
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.rewrite_children(&mut |children| {
            for child in children.iter_mut() {
                if !matches!(child.value, NodeValue::Blockquote { alert: None }) {
                    continue;
                }
                if let Some(source) = take_attribution(child) {
                    let quote = std::mem::replace(child, Node::new(NodeValue::Root));
                    *child = wrap(quote, source);
                }
            }
        });
        Ok(())
    }
}

fn wrap(quote: Node, source: Vec<Node>) -> Node {
    let position = quote.position;
    Node::new(NodeValue::Figure)
        .with_h_property("class", "c-blockquote")
        .with_children(vec![
            quote,
            Node::new(NodeValue::FigCaption)
                .with_h_property("class", "c-blockquote__attribution")
                .with_children(source),
        ])
        .with_position(position)
}

/// Strip an attribution marker and following whitespace.
fn strip_marker(text: &str) -> Option<&str> {
    let rest = MARKERS.iter().find_map(|m| text.strip_prefix(m))?;
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

/// Remove the attribution from the quote's last paragraph.
fn take_attribution(quote: &mut Node) -> Option<Vec<Node>> {
    let paragraph = quote.children.last_mut()?;
    if !matches!(paragraph.value, NodeValue::Paragraph) {
        return None;
    }

    // Whole paragraph is the attribution.
    if let Some(NodeValue::Text(first)) = paragraph.children.first().map(|n| &n.value)
        && let Some(rest) = strip_marker(first)
    {
        let rest = rest.to_owned();
        if quote.children.len() < 2 {
            return None;
        }
        let mut paragraph = quote.children.pop()?;
        if rest.is_empty() {
            paragraph.children.remove(0);
        } else {
            paragraph.children[0] = Node::text(rest);
        }
        return Some(paragraph.children);
    }

    // Last line of a text node in the last paragraph.
    let index = paragraph
        .children
        .iter()
        .rposition(|n| matches!(&n.value, NodeValue::Text(t) if t.contains('\n')))?;
    let NodeValue::Text(text) = &paragraph.children[index].value else {
        return None;
    };
    let newline = text.rfind('\n')?;
    let rest = strip_marker(&text[newline + 1..])?.to_owned();
    let before = text[..newline].trim_end().to_owned();

    let mut source: Vec<Node> = paragraph.children.split_off(index + 1);
    if !rest.is_empty() {
        source.insert(0, Node::text(rest));
    }
    paragraph.children[index] = Node::text(before);
    Some(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdast::NodeKind;
    use crate::remark::test_support::run_pass;
    use pretty_assertions::assert_eq;

    fn check(source: &str, quote: &str, attribution: &str) {
        let (tree, _) = run_pass(&Attribution, source);
        let figure = &tree.children[0];
        assert_eq!(figure.kind(), NodeKind::Figure);
        assert_eq!(
            figure.data.h_properties,
            vec![("class".to_owned(), "c-blockquote".to_owned())]
        );
        assert_eq!(figure.children[0].text_content().trim(), quote);
        assert_eq!(figure.children[1].text_content(), attribution);
    }

    #[test]
    fn test_attribution_paragraph() {
        check(
            "> Simplicity is prerequisite.\n>\n> — Edsger Dijkstra\n",
            "Simplicity is prerequisite.",
            "Edsger Dijkstra",
        );
    }

    #[test]
    fn test_attribution_last_line() {
        check("> Stay hungry.\n> -- *Steve Jobs*\n", "Stay hungry.", "Steve Jobs");
    }

    #[test]
    fn test_plain_quote_untouched() {
        let (tree, _) = run_pass(&Attribution, "> Just a quote -- with dashes\n");
        assert_eq!(tree.children[0].kind(), NodeKind::Blockquote);
    }

    #[test]
    fn test_attribution_only_is_not_moved() {
        let (tree, _) = run_pass(&Attribution, "> — Nobody\n");
        assert_eq!(tree.children[0].kind(), NodeKind::Blockquote);
    }
}
