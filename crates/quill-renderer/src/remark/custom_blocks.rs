//! `[[name | title]]` custom blocks with piped bodies.
//!
//! ```text
//! [[details | Show more]]
//! | Body markdown,
//! | one pipe per line.
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::options::{CustomBlockDefinition, TitleMode};
use crate::parse::{parse_fragment, parse_inline_fragment};
use crate::pass::{MarkdownPass, RunContext};
use crate::source::raw_lines;

use super::names;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\[([^\]|\s]+)(?:\s*\|\s*(.*))?\]\]$").expect("invalid custom block regex")
});

/// Expands custom blocks declared in the options.
#[derive(Debug, Default)]
pub struct CustomBlocks {
    definitions: BTreeMap<String, CustomBlockDefinition>,
}

impl CustomBlocks {
    #[must_use]
    pub fn new(definitions: BTreeMap<String, CustomBlockDefinition>) -> Self {
        Self { definitions }
    }
}

impl MarkdownPass for CustomBlocks {
    fn name(&self) -> &'static str {
        names::CUSTOM_BLOCKS
    }

    fn run(&self, tree: &mut Node, cx: &mut RunContext<'_>) -> Result<(), PassError> {
        if self.definitions.is_empty() {
            return Ok(());
        }
        let source = cx.source();
        tree.rewrite_children(&mut |children| {
            let mut i = 0;
            while i < children.len() {
                match self.expand(&children[i], source) {
                    Some(nodes) => {
                        let count = nodes.len();
                        children.splice(i..=i, nodes);
                        i += count;
                    }
                    None => i += 1,
                }
            }
        });
        Ok(())
    }
}

impl CustomBlocks {
    /// The block and any trailing content, or `None` if `node` is not a
    /// valid custom block.
    fn expand(&self, node: &Node, source: &str) -> Option<Vec<Node>> {
        if !matches!(node.value, NodeValue::Paragraph) {
            return None;
        }
        let lines = raw_lines(source, node)?;
        let caps = MARKER_RE.captures(lines.first()?.trim())?;
        let name = &caps[1];
        let definition = self.definitions.get(name)?;
        let given_title = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|t| !t.is_empty());

        match (definition.title, given_title) {
            (TitleMode::Required, None) | (TitleMode::None, Some(_)) => return None,
            _ => {}
        }

        let mut body = Vec::new();
        let mut consumed = 0;
        for line in &lines[1..] {
            let line = line.trim_start();
            let Some(rest) = line.strip_prefix('|') else {
                break;
            };
            body.push(rest.strip_prefix(' ').unwrap_or(rest));
            consumed += 1;
        }
        if consumed == 0 {
            return None;
        }

        let title = given_title.or(definition.default_title.as_deref());
        let mut nodes = vec![build(name, definition, title, &body.join("\n"))];
        let trailing = lines[1 + consumed..].join("\n");
        if !trailing.trim().is_empty() {
            nodes.extend(parse_fragment(&trailing));
        }
        Some(nodes)
    }
}

fn build(name: &str, definition: &CustomBlockDefinition, title: Option<&str>, body: &str) -> Node {
    let (wrapper_tag, title_tag, content_tag) = definition.tags();
    let class = std::iter::once("custom-block")
        .chain(definition.classes.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    let mut children = Vec::new();
    if let Some(title) = title {
        children.push(
            Node::new(NodeValue::CustomBlockTitle)
                .with_children(parse_inline_fragment(title))
                .with_h_name(title_tag)
                .with_h_property("class", "custom-block-heading"),
        );
    }
    children.push(
        Node::new(NodeValue::CustomBlockBody)
            .with_children(parse_fragment(body))
            .with_h_name(content_tag)
            .with_h_property("class", "custom-block-body"),
    );

    Node::new(NodeValue::CustomBlock {
        name: name.to_owned(),
    })
    .with_children(children)
    .with_h_name(wrapper_tag)
    .with_h_property("class", class)
}
