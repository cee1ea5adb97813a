//! Math delimiters.
//!
//! Display math comes from ```` ```math ```` fences and from `$$` lines
//! around a block. Inline math is `$$x$$`; single dollars are only math
//! when enabled, so prices like `$5` stay text by default.

use regex::Regex;

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};
use crate::source::{DOUBLE_DOLLAR_RE, SINGLE_DOLLAR_RE, raw_lines};

use super::{Descend, names, splice_matches, split_text};

/// Recognises display and inline math.
#[derive(Debug, Default)]
pub struct MathDelimiters {
    single_dollar: bool,
}

impl MathDelimiters {
    #[must_use]
    pub fn new(single_dollar: bool) -> Self {
        Self { single_dollar }
    }
}

impl MarkdownPass for MathDelimiters {
    fn name(&self) -> &'static str {
        names::MATH
    }

    fn run(&self, tree: &mut Node, cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let source = cx.source();
        tree.walk_mut(&mut |node| {
            if let NodeValue::Code(code) = &node.value
                && code.lang.as_deref() == Some("math")
            {
                node.value = NodeValue::Math(code.value.trim_end_matches('\n').to_owned());
            }
        });
        tree.rewrite_children(&mut |children| display_blocks(children, source));

        split_text(tree, Descend::All, &mut |text| {
            inline_math(text, &DOUBLE_DOLLAR_RE)
        });
        if self.single_dollar {
            split_text(tree, Descend::All, &mut |text| {
                inline_math(text, &SINGLE_DOLLAR_RE)
            });
        }
        Ok(())
    }
}

fn inline_math(text: &str, re: &Regex) -> Option<Vec<Node>> {
    splice_matches(
        text,
        re.captures_iter(text).filter_map(|caps| {
            let whole = caps.get(0)?;
            let math = caps.get(1)?.as_str().trim();
            Some((
                whole.start(),
                whole.end(),
                Node::new(NodeValue::InlineMath(math.to_owned())),
            ))
        }),
    )
}

/// Replace `$$`-fenced paragraph runs with display math nodes.
///
/// Blank lines inside the math split it into several paragraphs, so the
/// closing `$$` may sit in a later sibling.
fn display_blocks(children: &mut Vec<Node>, source: &str) {
    let mut i = 0;
    while i < children.len() {
        if let Some((end, math)) = display_at(children, i, source) {
            let position = children[i].position;
            children.splice(i..end, [math.with_position(position)]);
        }
        i += 1;
    }
}

fn display_at(children: &[Node], i: usize, source: &str) -> Option<(usize, Node)> {
    let lines = paragraph_lines(&children[i], source)?;
    if lines.first()?.trim() != "$$" {
        return None;
    }

    let mut body: Vec<String> = Vec::new();
    let mut current = lines[1..].to_vec();
    let mut j = i;
    loop {
        for line in &current {
            if line.trim() == "$$" {
                return Some((j + 1, Node::new(NodeValue::Math(body.join("\n")))));
            }
            if let Some(last) = line.trim_end().strip_suffix("$$") {
                body.push(last.to_owned());
                return Some((j + 1, Node::new(NodeValue::Math(body.join("\n")))));
            }
            body.push(line.clone());
        }
        j += 1;
        current = paragraph_lines(children.get(j)?, source)?;
        body.push(String::new());
    }
}

fn paragraph_lines(node: &Node, source: &str) -> Option<Vec<String>> {
    if !matches!(node.value, NodeValue::Paragraph) {
        return None;
    }
    raw_lines(source, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdast::NodeKind;
    use crate::remark::test_support::run_pass;
    use pretty_assertions::assert_eq;

    fn inline_kinds(tree: &Node) -> Vec<NodeKind> {
        tree.children[0].children.iter().map(Node::kind).collect()
    }

    #[test]
    fn test_math_fence() {
        let (tree, _) = run_pass(&MathDelimiters::new(false), "```math\nE = mc^2\n```\n");
        assert_eq!(tree.children[0].value, NodeValue::Math("E = mc^2".to_owned()));
    }

    #[test]
    fn test_display_dollars() {
        let (tree, _) = run_pass(&MathDelimiters::new(false), "$$\na^2 + b^2\n$$\n\nAfter\n");
        assert_eq!(tree.children[0].value, NodeValue::Math("a^2 + b^2".to_owned()));
        assert_eq!(tree.children[1].text_content(), "After");
    }

    #[test]
    fn test_display_spanning_blank_line() {
        let (tree, _) = run_pass(&MathDelimiters::new(false), "$$\na\n\nb\n$$\n");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].value, NodeValue::Math("a\n\nb".to_owned()));
    }

    #[test]
    fn test_unclosed_display_left_alone() {
        let (tree, _) = run_pass(&MathDelimiters::new(false), "$$\na\n");
        assert_eq!(tree.children[0].kind(), NodeKind::Paragraph);
    }

    #[test]
    fn test_inline_double_dollar() {
        let (tree, _) = run_pass(&MathDelimiters::new(false), "Euler: $$e^{i\\pi}$$ wow\n");
        assert_eq!(
            inline_kinds(&tree),
            vec![NodeKind::Text, NodeKind::InlineMath, NodeKind::Text]
        );
    }

    #[test]
    fn test_inline_math_keeps_escapes() {
        let (tree, _) = run_pass(&MathDelimiters::new(false), "Set $$\\{a\\}$$ now\n");
        assert_eq!(
            tree.children[0].children[1].value,
            NodeValue::InlineMath("\\{a\\}".to_owned())
        );
    }

    #[test]
    fn test_inline_math_ignores_emphasis_markers() {
        let (tree, _) = run_pass(
            &MathDelimiters::new(false),
            "$$a*b*c$$ and $$x_1 + y_1$$\n",
        );
        assert_eq!(
            inline_kinds(&tree),
            vec![NodeKind::InlineMath, NodeKind::Text, NodeKind::InlineMath]
        );
        assert_eq!(tree.children[0].children[0].value, NodeValue::InlineMath("a*b*c".to_owned()));
        assert_eq!(
            tree.children[0].children[2].value,
            NodeValue::InlineMath("x_1 + y_1".to_owned())
        );
    }

    #[test]
    fn test_single_dollar_disabled_by_default() {
        let (tree, _) = run_pass(&MathDelimiters::new(false), "This is $5 and not math: $x$.\n");
        assert_eq!(inline_kinds(&tree), vec![NodeKind::Text]);
    }

    #[test]
    fn test_single_dollar_enabled() {
        let (tree, _) = run_pass(&MathDelimiters::new(true), "This is $5 and not math: $x$.\n");
        assert_eq!(
            inline_kinds(&tree),
            vec![NodeKind::Text, NodeKind::InlineMath, NodeKind::Text]
        );
        assert_eq!(tree.children[0].children[1].value, NodeValue::InlineMath("x".to_owned()));
    }

    #[test]
    fn test_math_in_inline_code_untouched() {
        let (tree, _) = run_pass(&MathDelimiters::new(true), "`$x$`\n");
        assert_eq!(inline_kinds(&tree), vec![NodeKind::InlineCode]);
    }
}
