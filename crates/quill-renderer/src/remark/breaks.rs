//! Soft line breaks as `<br>`.

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};

use super::{Descend, names, split_text};

/// Turns every newline inside text into a hard break.
#[derive(Debug, Default)]
pub struct Breaks;

impl MarkdownPass for Breaks {
    fn name(&self) -> &'static str {
        names::BREAKS
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        split_text(tree, Descend::All, &mut |text| {
            if !text.contains('\n') {
                return None;
            }
            let mut out = Vec::new();
            for (n, line) in text.split('\n').enumerate() {
                if n > 0 {
                    out.push(Node::new(NodeValue::Break));
                }
                if !line.is_empty() {
                    out.push(Node::text(line));
                }
            }
            Some(out)
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
    fn test_soft_break_becomes_break() {
        let (tree, _) = run_pass(&Breaks, "Roses are red\nViolets are blue\n");
        let kinds: Vec<NodeKind> = tree.children[0].children.iter().map(Node::kind).collect();
        assert_eq!(kinds, vec![NodeKind::Text, NodeKind::Break, NodeKind::Text]);
        assert_eq!(
            tree.children[0].children[2].value,
            NodeValue::Text("Violets are blue".to_owned())
        );
    }

    #[test]
    fn test_code_keeps_newlines() {
        let (tree, _) = run_pass(&Breaks, "```\na\nb\n```\n");
        assert_eq!(tree.children[0].kind(), NodeKind::Code);
        assert!(tree.children[0].children.is_empty());
    }
}
