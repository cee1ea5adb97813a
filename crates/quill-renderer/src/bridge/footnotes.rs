//! GFM-style footnotes.
//!
//! References are numbered in order of first use. Only referenced
//! definitions are rendered, in a `section[data-footnotes]` after the
//! content, each with a back-reference per use.

use std::collections::HashMap;

use crate::hast::{self, Element};
use crate::mdast::{self, NodeValue};

use super::Bridge;

/// A resolved footnote reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FootnoteRef {
    pub number: usize,
    pub slug: String,
    /// 1 for the first reference to a footnote, 2 for the second, ...
    pub nth: usize,
}

impl FootnoteRef {
    pub fn ref_id(&self) -> String {
        ref_id(&self.slug, self.nth)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Footnotes {
    definitions: HashMap<String, mdast::Node>,
    /// Labels in order of first reference.
    order: Vec<String>,
    uses: HashMap<String, usize>,
}

impl Footnotes {
    /// Index every definition in the tree; the first of duplicates wins.
    pub fn collect(&mut self, root: &mdast::Node) {
        root.walk(&mut |node| {
            if let NodeValue::FootnoteDefinition { label } = &node.value {
                self.definitions
                    .entry(normalize(label))
                    .or_insert_with(|| node.clone());
            }
        });
    }

    /// Record a reference. `None` if the label has no definition.
    pub fn reference(&mut self, label: &str) -> Option<FootnoteRef> {
        let key = normalize(label);
        if !self.definitions.contains_key(&key) {
            return None;
        }
        let number = match self.order.iter().position(|l| *l == key) {
            Some(index) => index + 1,
            None => {
                self.order.push(key.clone());
                self.order.len()
            }
        };
        let uses = self.uses.entry(key.clone()).or_default();
        *uses += 1;
        Some(FootnoteRef {
            number,
            slug: slug(&key),
            nth: *uses,
        })
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Id-safe form of a label.
pub(crate) fn slug(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

pub(crate) fn note_id(slug: &str) -> String {
    format!("fn-{slug}")
}

fn ref_id(slug: &str, nth: usize) -> String {
    if nth == 1 {
        format!("fnref-{slug}")
    } else {
        format!("fnref-{slug}-{nth}")
    }
}

/// Build the footnote section, or `None` when nothing was referenced.
///
/// Definitions may reference further footnotes, which are appended to the
/// list while it is being built.
pub(crate) fn section(bridge: &mut Bridge<'_>) -> Option<Element> {
    let mut items = Vec::new();
    let mut index = 0;
    while let Some(key) = bridge.footnotes.order.get(index).cloned() {
        index += 1;
        let Some(definition) = bridge.footnotes.definitions.get(&key).cloned() else {
            continue;
        };
        let slug = slug(&key);
        let uses = bridge.footnotes.uses.get(&key).copied().unwrap_or(1);

        let mut content = bridge.blocks(&definition);
        let backrefs = backrefs(&slug, index, uses);
        match content.iter_mut().rev().find_map(hast::Node::as_element_mut) {
            Some(last) if last.tag == "p" => {
                for backref in backrefs {
                    last.children.push(hast::Node::text(" "));
                    last.children.push(backref.into());
                }
            }
            _ => content.extend(backrefs.into_iter().map(hast::Node::from)),
        }

        items.push(hast::Node::text("\n"));
        items.push(
            Element::new("li")
                .with_attr("id", note_id(&slug))
                .with_children(content)
                .into(),
        );
    }
    if items.is_empty() {
        return None;
    }
    items.push(hast::Node::text("\n"));

    let label = bridge.options().footnote_label.clone();
    Some(
        Element::new("section")
            .with_flag("data-footnotes")
            .with_class("footnotes")
            .with_child(
                Element::new("h2")
                    .with_attr("id", "footnote-label")
                    .with_class("sr-only")
                    .with_text(label),
            )
            .with_text("\n")
            .with_child(Element::new("ol").with_children(items))
            .with_text("\n"),
    )
}

fn backrefs(slug: &str, number: usize, uses: usize) -> Vec<Element> {
    (1..=uses)
        .map(|nth| {
            let mut link = Element::new("a")
                .with_attr("href", format!("#{}", ref_id(slug, nth)))
                .with_flag("data-footnote-backref")
                .with_attr("aria-label", format!("Back to reference {number}"))
                .with_class("data-footnote-backref")
                .with_text("\u{21a9}");
            if nth > 1 {
                link.children
                    .push(Element::new("sup").with_text(nth.to_string()).into());
            }
            link
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_numbering() {
        let root = crate::parse::parse(
            "A[^b] B[^a] C[^b]\n\n[^a]: First\n\n[^b]: Second\n",
            crate::document::ContentType::Markdown,
        );
        let mut notes = Footnotes::default();
        notes.collect(&root);
        assert_eq!(notes.reference("b").map(|r| r.number), Some(1));
        assert_eq!(notes.reference("a").map(|r| r.number), Some(2));
        let again = notes.reference("b").unwrap();
        assert_eq!((again.number, again.nth), (1, 2));
        assert_eq!(again.ref_id(), "fnref-b-2");
        assert_eq!(notes.reference("missing"), None);
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("my note"), "my-note");
    }
}
