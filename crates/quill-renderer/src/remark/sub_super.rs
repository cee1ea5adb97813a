//! `~subscript~` and `^superscript^` text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};

use super::{Descend, names, splice_matches, split_text};

static SUB_SUPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"~([^\s~]+)~|\^([^\s^]+)\^").expect("invalid sub/superscript regex")
});

/// Wraps `H~2~O` and `x^2^` in subscript and superscript nodes.
///
/// The content may not contain whitespace, so `~ a ~` and `a ^ b ^ c` stay
/// text. `~~strike~~` is handled by the parser before this pass runs.
#[derive(Debug, Default)]
pub struct SubSuper;

impl MarkdownPass for SubSuper {
    fn name(&self) -> &'static str {
        names::SUB_SUPER
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        split_text(tree, Descend::All, &mut |text| {
            if !text.contains(['~', '^']) {
                return None;
            }
            splice_matches(
                text,
                SUB_SUPER_RE.captures_iter(text).filter_map(|caps| {
                    let whole = caps.get(0)?;
                    let (value, inner) = match (caps.get(1), caps.get(2)) {
                        (Some(sub), _) => (NodeValue::Subscript, sub.as_str()),
                        (None, Some(sup)) => (NodeValue::Superscript, sup.as_str()),
                        (None, None) => return None,
                    };
                    let node = Node::new(value).with_children(vec![Node::text(inner)]);
                    Some((whole.start(), whole.end(), node))
                }),
            )
        });
        Ok(())
    }
}
