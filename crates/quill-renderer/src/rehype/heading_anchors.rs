//! Self-links on headings.

use crate::error::PassError;
use crate::hast::{self, Element};
use crate::pass::{HtmlPass, RunContext};

use super::names;

/// Appends `a.heading-anchor` linking to the heading's own id.
///
/// Only `h2`–`h6` with an id get one; headings that already have an anchor
/// are skipped.
#[derive(Debug, Default)]
pub struct HeadingAnchors;

impl HtmlPass for HeadingAnchors {
    fn name(&self) -> &'static str {
        names::HEADING_ANCHORS
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.visit_elements_mut(&mut |el, _| {
            if !matches!(el.tag.as_str(), "h2" | "h3" | "h4" | "h5" | "h6") {
                return;
            }
            let Some(id) = el.attr("id") else {
                return;
            };
            let has_anchor = el
                .children
                .iter()
                .filter_map(hast::Node::as_element)
                .any(|child| child.has_class("heading-anchor"));
            if has_anchor {
                return;
            }
            el.children.push(
                Element::new("a")
                    .with_class("heading-anchor")
                    .with_attr("href", format!("#{id}"))
                    .with_attr("aria-hidden", "true")
                    .with_attr("tabindex", "-1")
                    .with_text("#")
                    .into(),
            );
        });
        Ok(())
    }
}
