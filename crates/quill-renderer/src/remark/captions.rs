//! Captions from labelled paragraphs.
//!
//! A paragraph starting with a caption label right after a table, code
//! block, blockquote or lone image becomes that element's caption, and the
//! pair is wrapped in a figure:
//!
//! ```text
//! | a | b |
//! |---|---|
//! | 1 | 2 |
//!
//! Table: Quarterly numbers
//! ```
//!
//! Without the blank line GFM reads the caption as one more table row; a
//! last row whose first cell starts with the label and whose other cells
//! are empty is treated the same way.

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::options::CaptionLabels;
use crate::pass::{MarkdownPass, RunContext};

use super::{names, strip_label};

/// Wraps captioned elements in figures.
#[derive(Debug, Default)]
pub struct Captions {
    labels: CaptionLabels,
}

impl Captions {
    #[must_use]
    pub fn new(labels: CaptionLabels) -> Self {
        Self { labels }
    }

    fn label_for(&self, node: &Node) -> Option<&str> {
        let label = match node.value {
            NodeValue::Table { .. } | NodeValue::GridTable => &self.labels.table,
            NodeValue::Code(_) => &self.labels.code,
            NodeValue::Blockquote { .. } => &self.labels.quote,
            NodeValue::Paragraph if lone_image(node).is_some() => &self.labels.image,
            _ => return None,
        };
        Some(label)
    }
}

impl MarkdownPass for Captions {
    fn name(&self) -> &'static str {
        names::CAPTIONS
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.rewrite_children(&mut |children| {
            let mut i = 0;
            while i < children.len() {
                if let Some(caption) = absorbed_caption(&mut children[i], &self.labels.table) {
                    let element = std::mem::replace(&mut children[i], Node::new(NodeValue::Root));
                    children[i] = figure(element, caption);
                } else if let Some(label) = self.label_for(&children[i])
                    && let Some(caption) = children.get(i + 1).and_then(|next| strip_label(next, label))
                {
                    let element = children.remove(i);
                    children[i] = figure(element, caption);
                }
                i += 1;
            }
        });
        Ok(())
    }
}

fn figure(element: Node, caption: Vec<Node>) -> Node {
    let position = element.position;
    let element = match lone_image(&element) {
        Some(image) => image.clone(),
        None => element,
    };
    Node::new(NodeValue::Figure)
        .with_children(vec![
            element,
            Node::new(NodeValue::FigCaption).with_children(caption),
        ])
        .with_position(position)
}

/// The image of a paragraph holding nothing else but whitespace.
fn lone_image(node: &Node) -> Option<&Node> {
    if !matches!(node.value, NodeValue::Paragraph) {
        return None;
    }
    let mut content = node
        .children
        .iter()
        .filter(|c| !matches!(&c.value, NodeValue::Text(t) if t.trim().is_empty()));
    let image = content.next()?;
    (matches!(image.value, NodeValue::Image { .. }) && content.next().is_none()).then_some(image)
}

/// Remove a caption row GFM absorbed into a table and return its content.
fn absorbed_caption(table: &mut Node, label: &str) -> Option<Vec<Node>> {
    if !matches!(table.value, NodeValue::Table { .. }) {
        return None;
    }
    let row = table.children.last()?;
    if matches!(row.value, NodeValue::TableRow { header: true }) {
        return None;
    }
    let (first, rest) = row.children.split_first()?;
    if rest.iter().any(|cell| !cell.text_content().trim().is_empty()) {
        return None;
    }
    let cell = Node::new(NodeValue::Paragraph).with_children(first.children.clone());
    let caption = strip_label(&cell, label)?;
    table.children.pop();
    Some(caption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdast::NodeKind;
    use crate::remark::test_support::run_pass;
    use pretty_assertions::assert_eq;

    fn captions() -> Captions {
        Captions::new(CaptionLabels::default())
    }

    fn assert_figure(node: &Node, element: NodeKind, caption: &str) {
        assert_eq!(node.kind(), NodeKind::Figure);
        assert_eq!(node.children[0].kind(), element);
        assert_eq!(node.children[1].kind(), NodeKind::FigCaption);
        assert_eq!(node.children[1].text_content(), caption);
    }

    #[test]
    fn test_table_caption_after_blank_line() {
        let (tree, _) = run_pass(
            &captions(),
            "| a | b |\n|---|---|\n| 1 | 2 |\n\nTable: My caption\n",
        );
        assert_eq!(tree.children.len(), 1);
        assert_figure(&tree.children[0], NodeKind::Table, "My caption");
    }

    #[test]
    fn test_table_caption_absorbed_as_row() {
        let (tree, _) = run_pass(&captions(), "| a | b |\n|---|---|\n| 1 | 2 |\nTable: My caption\n");
        assert_figure(&tree.children[0], NodeKind::Table, "My caption");
        let table = &tree.children[0].children[0];
        assert_eq!(table.children.len(), 2);
    }

    #[test]
    fn test_code_caption() {
        let (tree, _) = run_pass(&captions(), "```rust\nfn main() {}\n```\n\nCode: Entry point\n");
        assert_figure(&tree.children[0], NodeKind::Code, "Entry point");
    }

    #[test]
    fn test_image_caption_unwraps_paragraph() {
        let (tree, _) = run_pass(&captions(), "![Cat](cat.png)\n\nFigure: A *cat*\n");
        assert_figure(&tree.children[0], NodeKind::Image, "A cat");
    }

    #[test]
    fn test_quote_caption() {
        let (tree, _) = run_pass(&captions(), "> Be kind.\n\nSource: Everyone\n");
        assert_figure(&tree.children[0], NodeKind::Blockquote, "Everyone");
    }

    #[test]
    fn test_label_elsewhere_is_plain_text() {
        let (tree, _) = run_pass(&captions(), "Intro\n\nTable: not a caption\n");
        assert_eq!(tree.children[1].kind(), NodeKind::Paragraph);
    }
}
