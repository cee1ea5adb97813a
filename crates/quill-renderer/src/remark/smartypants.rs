//! Curly quotes, dashes and ellipses.

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};

use super::names;

/// Educates straight quotes and ASCII dashes and ellipses.
///
/// `---` becomes an em dash, `--` an en dash and `...` an ellipsis. Quote
/// direction depends on the preceding character, which may sit in an
/// earlier sibling node.
#[derive(Debug, Default)]
pub struct SmartyPants;

impl MarkdownPass for SmartyPants {
    fn name(&self) -> &'static str {
        names::SMARTYPANTS
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        educate_children(tree, None);
        Ok(())
    }
}

/// Educate the text below `node`; returns the last character seen.
fn educate_children(node: &mut Node, mut prev: Option<char>) -> Option<char> {
    for child in &mut node.children {
        prev = if let NodeValue::Text(text) = &mut child.value {
            *text = educate(text, prev);
            text.chars().next_back().or(prev)
        } else if matches!(child.value, NodeValue::Break) {
            Some('\n')
        } else if child.is_literal() {
            child.text_content().chars().next_back().or(prev)
        } else if is_inline_container(child) {
            educate_children(child, prev)
        } else {
            // Blocks start a new quoting context.
            educate_children(child, None);
            None
        };
    }
    prev
}

fn is_inline_container(node: &Node) -> bool {
    matches!(
        node.value,
        NodeValue::Emphasis
            | NodeValue::Strong
            | NodeValue::Delete
            | NodeValue::Link { .. }
            | NodeValue::Superscript
            | NodeValue::Subscript
            | NodeValue::Mark
            | NodeValue::Span
            | NodeValue::Abbr { .. }
            | NodeValue::TextDirective(_)
    )
}

fn opens(prev: Option<char>) -> bool {
    prev.is_none_or(|c| {
        c.is_whitespace() || "([{<\u{2013}\u{2014}\"'\u{201c}\u{2018}".contains(c)
    })
}

fn educate(text: &str, mut prev: Option<char>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let (educated, used): (char, usize) = match c {
            '-' if chars[i..].starts_with(&['-', '-', '-']) => ('\u{2014}', 3),
            '-' if next == Some('-') => ('\u{2013}', 2),
            '.' if chars[i..].starts_with(&['.', '.', '.']) => ('\u{2026}', 3),
            '"' if opens(prev) => ('\u{201c}', 1),
            '"' => ('\u{201d}', 1),
            '\'' if prev.is_some_and(char::is_alphanumeric) => ('\u{2019}', 1),
            '\'' if opens(prev) && next.is_some_and(|n| !n.is_whitespace()) => ('\u{2018}', 1),
            '\'' => ('\u{2019}', 1),
            other => (other, 1),
        };
        out.push(educated);
        prev = Some(educated);
        i += used;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remark::test_support::run_pass;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quotes() {
        assert_eq!(
            educate("\"Hello,\" she said.", None),
            "\u{201c}Hello,\u{201d} she said."
        );
        assert_eq!(educate("it's 'quoted'", None), "it\u{2019}s \u{2018}quoted\u{2019}");
    }

    #[test]
    fn test_dashes_and_ellipsis() {
        assert_eq!(educate("a---b -- c...", None), "a\u{2014}b \u{2013} c\u{2026}");
    }

    #[test]
    fn test_context_from_previous_sibling() {
        let (tree, _) = run_pass(&SmartyPants, "*Rust*'s \"`code`\"\n");
        assert_eq!(
            tree.children[0].text_content(),
            "Rust\u{2019}s \u{201c}code\u{201d}"
        );
    }

    #[test]
    fn test_blocks_reset_context() {
        let (tree, _) = run_pass(&SmartyPants, "Ends here\n\n\"Starts\"\n");
        assert_eq!(tree.children[1].text_content(), "\u{201c}Starts\u{201d}");
    }

    #[test]
    fn test_code_untouched() {
        let (tree, _) = run_pass(&SmartyPants, "`\"a\" -- b`\n\n```\n\"x\"\n```\n");
        assert_eq!(tree.children[0].text_content(), "\"a\" -- b");
    }
}
