//! Access to raw source behind block nodes.
//!
//! Some syntaxes (grid tables, custom blocks, display math, directive
//! fences) are easier to recognise from the original lines than from the
//! inline nodes the parser already produced.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::mdast::{Node, NodeValue, Span};

/// `$$x$$` inline math, body in group 1.
pub(crate) static DOUBLE_DOLLAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$([^$]+?)\$\$").expect("invalid math regex"));

// Opening `$` not followed by whitespace or a digit, closing `$` not
// preceded by whitespace.
pub(crate) static SINGLE_DOLLAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([^\s$\d](?:[^$]*?[^\s$\\])?)\$").expect("invalid math regex")
});

/// Byte ranges of inline math bodies in `text`.
///
/// `$$` pairs are found first; single-dollar math only outside of them.
#[must_use]
pub(crate) fn inline_math_spans(text: &str, single_dollar: bool) -> Vec<Range<usize>> {
    let mut wholes = Vec::new();
    let mut bodies = Vec::new();
    for caps in DOUBLE_DOLLAR_RE.captures_iter(text) {
        if let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) {
            wholes.push(whole.range());
            bodies.push(body.range());
        }
    }
    if single_dollar {
        for caps in SINGLE_DOLLAR_RE.captures_iter(text) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if !wholes.iter().any(|w| w.start < whole.end() && whole.start() < w.end) {
                bodies.push(body.range());
            }
        }
    }
    bodies.sort_by_key(|r| r.start);
    bodies
}

/// Lines of the source covered by `span`.
///
/// Continuation lines lose the container prefix (blockquote markers, list
/// indentation) that the first line's position implies.
#[must_use]
pub fn block_lines(source: &str, span: Span) -> Vec<&str> {
    let Some(text) = source.get(span.start..span.end) else {
        return Vec::new();
    };
    let line_start = source[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let prefix_width = span.start - line_start;

    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line
            } else {
                strip_prefix(line, prefix_width)
            }
        })
        .collect()
}

/// Raw lines behind a node.
///
/// Uses the source span when the node has one. Nodes parsed from a
/// fragment have no span; for them the plain text stands in, provided the
/// node holds nothing but text.
#[must_use]
pub fn raw_lines(source: &str, node: &Node) -> Option<Vec<String>> {
    if let Some(span) = node.position {
        let lines = block_lines(source, span);
        return (!lines.is_empty()).then(|| lines.into_iter().map(str::to_owned).collect());
    }

    let plain = !node.children.is_empty()
        && node
            .children
            .iter()
            .all(|c| matches!(c.value, NodeValue::Text(_) | NodeValue::Break));
    plain.then(|| node.text_content().lines().map(str::to_owned).collect())
}

/// Strip up to `width` bytes of whitespace and `>` markers.
fn strip_prefix(line: &str, width: usize) -> &str {
    let mut end = 0;
    for (i, c) in line.char_indices() {
        if i >= width || !(c.is_whitespace() || c == '>') {
            break;
        }
        end = i + c.len_utf8();
    }
    &line[end..]
}

/// Remove the common leading whitespace of all non-blank lines.
#[must_use]
pub fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_level_lines() {
        let src = "intro\n\nline one\nline two\n";
        let lines = block_lines(src, Span::new(7, src.len()));
        assert_eq!(lines, vec!["line one", "line two"]);
    }

    #[test]
    fn test_blockquote_prefix_removed() {
        let src = "> first\n> second\n";
        let lines = block_lines(src, Span::new(2, src.len()));
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_list_indent_removed() {
        let src = "- first\n  second\n";
        let lines = block_lines(src, Span::new(2, src.len()));
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_out_of_range_span() {
        assert!(block_lines("abc", Span::new(2, 10)).is_empty());
    }

    #[test]
    fn test_raw_lines_falls_back_to_text() {
        let node = Node::new(NodeValue::Paragraph).with_children(vec![Node::text("a\nb")]);
        assert_eq!(raw_lines("", &node), Some(vec!["a".to_owned(), "b".to_owned()]));

        let node = Node::new(NodeValue::Paragraph).with_children(vec![
            Node::text("a"),
            Node::new(NodeValue::Strong).with_children(vec![Node::text("b")]),
        ]);
        assert_eq!(raw_lines("", &node), None);
    }

    #[test]
    fn test_inline_math_spans() {
        let text = "$$a$$ and $b$ and $5";
        let bodies: Vec<&str> = inline_math_spans(text, true)
            .into_iter()
            .map(|r| &text[r])
            .collect();
        assert_eq!(bodies, vec!["a", "b"]);
        assert_eq!(inline_math_spans(text, false).len(), 1);
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent(&["  a", "    b", "", "  c"]), "a\n  b\n\nc");
    }
}
