//! Markdown tree passes.
//!
//! Each pass recognises one syntax extension and rewrites the tree in
//! place. Input a pass does not recognise is left untouched. Literal nodes
//! (code, inline code, math, raw HTML) are never rewritten by text passes.

mod abbr;
mod align;
mod attributes;
mod attribution;
mod breaks;
mod captions;
mod code_meta;
mod code_tabs;
mod custom_blocks;
mod directives;
mod emoji;
mod grid_tables;
mod linkify;
mod mark;
mod math;
mod replacements;
mod smartypants;
mod sub_super;
mod video;

pub use abbr::Abbreviations;
pub use align::Align;
pub use attributes::Attributes;
pub use attribution::Attribution;
pub use breaks::Breaks;
pub use captions::Captions;
pub use code_meta::CodeMeta;
pub use code_tabs::CodeTabs;
pub use custom_blocks::CustomBlocks;
pub use directives::Directives;
pub use emoji::Emoji;
pub use grid_tables::GridTables;
pub use linkify::Linkify;
pub use mark::Mark;
pub use math::MathDelimiters;
pub use replacements::{REPLACEMENT_RULES, Replacements};
pub use smartypants::SmartyPants;
pub use sub_super::SubSuper;
pub use video::VideoEmbeds;

use crate::mdast::{Node, NodeValue};
use crate::options::PipelineOptions;
use crate::pass::MarkdownPass;

/// Pass names, used to reorder or replace passes.
pub mod names {
    pub const DIRECTIVES: &str = "directives";
    pub const VIDEO_EMBEDS: &str = "video-embeds";
    pub const CUSTOM_BLOCKS: &str = "custom-blocks";
    pub const GRID_TABLES: &str = "grid-tables";
    pub const MATH: &str = "math";
    pub const CODE_TABS: &str = "code-tabs";
    pub const CODE_META: &str = "code-meta";
    pub const ALIGN: &str = "align";
    pub const CAPTIONS: &str = "captions";
    pub const ATTRIBUTION: &str = "attribution";
    pub const ATTRIBUTES: &str = "attributes";
    pub const ABBREVIATIONS: &str = "abbreviations";
    pub const MARK: &str = "mark";
    pub const SUB_SUPER: &str = "sub-super";
    pub const EMOJI: &str = "emoji";
    pub const LINKIFY: &str = "linkify";
    pub const REPLACEMENTS: &str = "replacements";
    pub const SMARTYPANTS: &str = "smartypants";
    pub const BREAKS: &str = "breaks";
}

/// Standard markdown passes in execution order.
///
/// Structural passes run before inline text passes so that text rewrites
/// never see the raw syntax of blocks, captions or directives.
#[must_use]
pub fn default_passes(options: &PipelineOptions) -> Vec<Box<dyn MarkdownPass>> {
    let mut passes: Vec<Box<dyn MarkdownPass>> = vec![
        Box::new(Directives),
        Box::new(VideoEmbeds),
        Box::new(CustomBlocks::new(options.custom_blocks.clone())),
        Box::new(GridTables),
        Box::new(MathDelimiters::new(options.single_dollar_math)),
    ];
    if options.tab_group_syntax {
        passes.push(Box::new(CodeTabs));
    }
    passes.push(Box::new(CodeMeta));
    if options.align {
        passes.push(Box::new(Align));
    }
    passes.push(Box::new(Captions::new(options.caption_labels.clone())));
    passes.push(Box::new(Attribution));
    if options.attributes {
        passes.push(Box::new(Attributes));
    }
    passes.push(Box::new(Abbreviations));
    passes.push(Box::new(Mark));
    passes.push(Box::new(SubSuper));
    if options.emoji {
        passes.push(Box::new(Emoji));
    }
    if options.linkify {
        passes.push(Box::new(Linkify));
    }
    if options.replacements {
        passes.push(Box::new(Replacements::new(&options.disabled_replacements)));
    }
    if options.smartypants {
        passes.push(Box::new(SmartyPants));
    }
    if options.breaks {
        passes.push(Box::new(Breaks));
    }
    passes
}

/// Where [`split_text`] descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Descend {
    All,
    /// Leave link and abbreviation text alone.
    SkipLinks,
}

/// Replace text nodes by the nodes `split` returns for their value.
///
/// `split` returns `None` to keep a text node as is. Replacement nodes are
/// not visited again.
pub(crate) fn split_text<F>(node: &mut Node, descend: Descend, split: &mut F)
where
    F: FnMut(&str) -> Option<Vec<Node>>,
{
    if node.is_literal() {
        return;
    }
    if descend == Descend::SkipLinks
        && matches!(node.value, NodeValue::Link { .. } | NodeValue::Abbr { .. })
    {
        return;
    }

    let mut i = 0;
    while i < node.children.len() {
        let replacement = match &node.children[i].value {
            NodeValue::Text(text) => Some(split(text)),
            _ => None,
        };
        match replacement {
            Some(Some(nodes)) => {
                let count = nodes.len();
                node.children.splice(i..=i, nodes);
                i += count;
            }
            Some(None) => i += 1,
            None => {
                split_text(&mut node.children[i], descend, split);
                i += 1;
            }
        }
    }
}

/// Rewrite the value of every text node with `map`.
pub(crate) fn map_text<F>(node: &mut Node, descend: Descend, map: &mut F)
where
    F: FnMut(&str) -> Option<String>,
{
    split_text(node, descend, &mut |text| {
        map(text).map(|mapped| vec![Node::text(mapped)])
    });
}

/// Split `text` around regex-like matches.
///
/// `matches` yields `(start, end, node)` in ascending, non-overlapping
/// order. Returns `None` when there are no matches.
pub(crate) fn splice_matches<I>(text: &str, matches: I) -> Option<Vec<Node>>
where
    I: IntoIterator<Item = (usize, usize, Node)>,
{
    let mut out = Vec::new();
    let mut last = 0;
    for (start, end, node) in matches {
        if start > last {
            out.push(Node::text(&text[last..start]));
        }
        out.push(node);
        last = end;
    }
    if out.is_empty() {
        return None;
    }
    if last < text.len() {
        out.push(Node::text(&text[last..]));
    }
    Some(out)
}

/// Paragraph whose first text child starts with `label`, with the label
/// and following whitespace removed. `None` if the label is absent.
pub(crate) fn strip_label(paragraph: &Node, label: &str) -> Option<Vec<Node>> {
    if label.is_empty() || !matches!(paragraph.value, NodeValue::Paragraph) {
        return None;
    }
    let first = paragraph.children.first()?;
    let NodeValue::Text(text) = &first.value else {
        return None;
    };
    let rest = text.strip_prefix(label)?;
    if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }

    let mut children = paragraph.children.clone();
    let rest = rest.trim_start();
    if rest.is_empty() {
        children.remove(0);
    } else {
        children[0] = Node::text(rest);
    }
    if let Some(Node {
        value: NodeValue::Text(last),
        ..
    }) = children.last_mut()
    {
        let trimmed = last.trim_end().len();
        last.truncate(trimmed);
    }
    Some(children)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::document::Document;
    use crate::mdast::Node;
    use crate::parse::parse;
    use crate::pass::{MarkdownPass, RunContext};

    /// Parse `source` and run a single pass over it.
    pub(crate) fn run_pass(pass: &dyn MarkdownPass, source: &str) -> (Node, Vec<String>) {
        let document = Document::new("test.md", source);
        let mut tree = parse(&document.source, document.content_type);
        let mut cx = RunContext::new(&document);
        pass.run(&mut tree, &mut cx).expect("pass failed");
        (tree, cx.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_text_skips_literal_and_links() {
        let mut root = Node::new(NodeValue::Paragraph).with_children(vec![
            Node::text("a"),
            Node::new(NodeValue::InlineCode("a".to_owned())),
            Node::new(NodeValue::Link {
                url: "/".to_owned(),
                title: String::new(),
            })
            .with_children(vec![Node::text("a")]),
        ]);
        map_text(&mut root, Descend::SkipLinks, &mut |t| {
            Some(t.replace('a', "b"))
        });
        assert_eq!(root.children[0].value, NodeValue::Text("b".to_owned()));
        assert_eq!(root.children[1].value, NodeValue::InlineCode("a".to_owned()));
        assert_eq!(root.children[2].text_content(), "a");
    }

    #[test]
    fn test_splice_matches() {
        let nodes = splice_matches("a-b", [(1, 2, Node::new(NodeValue::Break))]).unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(splice_matches("ab", std::iter::empty()).is_none());
    }

    #[test]
    fn test_strip_label() {
        let p = Node::new(NodeValue::Paragraph).with_children(vec![Node::text("Table: Sales  ")]);
        let rest = strip_label(&p, "Table:").unwrap();
        assert_eq!(rest, vec![Node::text("Sales")]);
        let p = Node::new(NodeValue::Paragraph).with_children(vec![Node::text("Tables: x")]);
        assert!(strip_label(&p, "Table:").is_none());
    }

    #[test]
    fn test_default_pass_order() {
        let passes = default_passes(&PipelineOptions::default());
        let names: Vec<_> = passes.iter().map(|p| p.name()).collect();
        assert_eq!(names.first(), Some(&names::DIRECTIVES));
        assert_eq!(names.last(), Some(&names::SMARTYPANTS));
        let tabs = names.iter().position(|n| *n == names::CODE_TABS).unwrap();
        let meta = names.iter().position(|n| *n == names::CODE_META).unwrap();
        assert!(tabs < meta);
    }
}
