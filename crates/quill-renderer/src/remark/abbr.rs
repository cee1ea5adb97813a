//! Abbreviations.
//!
//! ```text
//! The HTML standard is long.
//!
//! *[HTML]: Hyper Text Markup Language
//! ```
//!
//! Definition paragraphs are removed and every whole-word occurrence in
//! the document becomes an `<abbr title="...">`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};
use crate::source::raw_lines;

use super::{Descend, names, splice_matches, split_text};

static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\[([^\]]+)\]:\s*(.*?)\s*$").expect("invalid abbreviation regex")
});

/// Collects abbreviation definitions and marks their occurrences.
#[derive(Debug, Default)]
pub struct Abbreviations;

impl MarkdownPass for Abbreviations {
    fn name(&self) -> &'static str {
        names::ABBREVIATIONS
    }

    fn run(&self, tree: &mut Node, cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let source = cx.source();
        let mut definitions: Vec<(String, String)> = Vec::new();
        tree.rewrite_children(&mut |children| {
            children.retain(|child| match definition_lines(child, source) {
                Some(found) => {
                    definitions.extend(found);
                    false
                }
                None => true,
            });
        });
        if definitions.is_empty() {
            return Ok(());
        }

        // Later definitions win; longer terms match first.
        let mut terms: Vec<(String, String)> = Vec::new();
        for (term, title) in definitions {
            terms.retain(|(t, _)| *t != term);
            terms.push((term, title));
        }
        terms.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let alternation = terms
            .iter()
            .map(|(term, _)| regex::escape(term))
            .collect::<Vec<_>>()
            .join("|");
        let Ok(re) = Regex::new(&alternation) else {
            return Ok(());
        };

        split_text(tree, Descend::SkipLinks, &mut |text| {
            let found = re
                .find_iter(text)
                .filter(|m| is_whole_word(text, m.start(), m.end()))
                .filter_map(|m| {
                    let (_, title) = terms.iter().find(|(term, _)| term == m.as_str())?;
                    let abbr = Node::new(NodeValue::Abbr {
                        title: title.clone(),
                    })
                    .with_children(vec![Node::text(m.as_str())]);
                    Some((m.start(), m.end(), abbr))
                });
            splice_matches(text, found)
        });
        Ok(())
    }
}

/// Definitions if every line of a paragraph is one.
fn definition_lines(node: &Node, source: &str) -> Option<Vec<(String, String)>> {
    if !matches!(node.value, NodeValue::Paragraph) {
        return None;
    }
    raw_lines(source, node)?
        .iter()
        .map(|line| {
            let caps = DEFINITION_RE.captures(line.trim())?;
            Some((caps[1].trim().to_owned(), caps[2].to_owned()))
        })
        .collect()
}

fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdast::NodeKind;
    use crate::remark::test_support::run_pass;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_abbreviations_marked() {
        let (tree, _) = run_pass(
            &Abbreviations,
            "HTML and CSS, not HTMLX.\n\n*[HTML]: Hyper Text Markup Language\n*[CSS]: Cascading Style Sheets\n",
        );
        assert_eq!(tree.children.len(), 1);
        let kinds: Vec<_> = tree.children[0].children.iter().map(Node::kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Abbr, NodeKind::Text, NodeKind::Abbr, NodeKind::Text]
        );
        assert_eq!(
            tree.children[0].children[0].value,
            NodeValue::Abbr {
                title: "Hyper Text Markup Language".to_owned()
            }
        );
        assert_eq!(tree.children[0].text_content(), "HTML and CSS, not HTMLX.");
    }

    #[test]
    fn test_inside_link_and_code_untouched() {
        let (tree, _) = run_pass(
            &Abbreviations,
            "[HTML](/html) `HTML`\n\n*[HTML]: Hyper Text Markup Language\n",
        );
        let kinds: Vec<_> = tree.children[0].children.iter().map(Node::kind).collect();
        assert!(!kinds.contains(&NodeKind::Abbr));
    }

    #[test]
    fn test_mixed_paragraph_is_not_a_definition() {
        let (tree, _) = run_pass(&Abbreviations, "*[HTML]: markup\nand more text\n");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].kind(), NodeKind::Paragraph);
    }
}
