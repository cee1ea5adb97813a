//! `==highlighted==` text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};

use super::{Descend, names, splice_matches, split_text};

static MARK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"==([^=\s](?:[^=]*[^=\s])?)==").expect("invalid mark regex"));

/// Wraps `==text==` in mark nodes.
#[derive(Debug, Default)]
pub struct Mark;

impl MarkdownPass for Mark {
    fn name(&self) -> &'static str {
        names::MARK
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        split_text(tree, Descend::All, &mut |text| {
            splice_matches(
                text,
                MARK_RE.captures_iter(text).filter_map(|caps| {
                    let whole = caps.get(0)?;
                    let mark = Node::new(NodeValue::Mark).with_children(vec![Node::text(&caps[1])]);
                    Some((whole.start(), whole.end(), mark))
                }),
            )
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdast::NodeKind;
    use crate::remark::test_support::run_pass;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mark() {
        let (tree, _) = run_pass(&Mark, "Read ==this part== twice.\n");
        let paragraph = &tree.children[0];
        assert_eq!(paragraph.children[1].kind(), NodeKind::Mark);
        assert_eq!(paragraph.children[1].text_content(), "this part");
    }

    #[test]
    fn test_arrows_and_comparisons_untouched() {
        let (tree, _) = run_pass(&Mark, "a ==> b and x == y\n");
        assert_eq!(tree.children[0].children.len(), 1);
    }
}
