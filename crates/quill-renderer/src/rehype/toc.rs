//! Table of contents under a "Contents" heading.

use crate::error::PassError;
use crate::hast::{self, Element};
use crate::pass::{HtmlPass, RunContext, TocEntry};

use super::heading_ids::heading_level;
use super::names;

/// Fills the section of a top-level heading named like `heading` with a
/// nested list linking to every later heading.
///
/// Whatever the section held before is replaced, so running the pass twice
/// gives the same list. Headings need ids, so this runs after heading ids.
#[derive(Debug)]
pub struct Toc {
    heading: String,
}

impl Toc {
    #[must_use]
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into().to_lowercase(),
        }
    }

    fn is_toc_heading(&self, el: &Element) -> bool {
        heading_level(&el.tag).is_some()
            && el.text_content().trim().to_lowercase() == self.heading
    }
}

impl HtmlPass for Toc {
    fn name(&self) -> &'static str {
        names::TOC
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let hast::Node::Root(children) = tree else {
            return Ok(());
        };
        let Some((at, level)) = children.iter().enumerate().find_map(|(i, node)| {
            let el = node.as_element().filter(|el| self.is_toc_heading(el))?;
            Some((i, heading_level(&el.tag)?))
        }) else {
            return Ok(());
        };

        let end = children
            .iter()
            .enumerate()
            .skip(at + 1)
            .find(|(_, node)| {
                node.as_element()
                    .and_then(|el| heading_level(&el.tag))
                    .is_some_and(|l| l <= level)
            })
            .map_or(children.len(), |(i, _)| i);

        let entries = entries_after(&children[end..]);
        if entries.is_empty() {
            return Ok(());
        }
        tracing::debug!(entries = entries.len(), "Inserting table of contents");

        let mut section = vec![hast::Node::text("\n"), nested_list(&entries).into()];
        if end < children.len() {
            section.push(hast::Node::text("\n"));
        }
        children.splice(at + 1..end, section);
        Ok(())
    }
}

fn entries_after(nodes: &[hast::Node]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    for node in nodes {
        node.visit_elements(&mut |el| {
            if let (Some(level), Some(id)) = (heading_level(&el.tag), el.attr("id")) {
                entries.push(TocEntry {
                    level,
                    title: heading_text(el),
                    id,
                });
            }
        });
    }
    entries
}

/// Heading text without an anchor link another pass may have added.
fn heading_text(el: &Element) -> String {
    el.children
        .iter()
        .filter(|c| {
            c.as_element()
                .is_none_or(|child| !child.has_class("heading-anchor"))
        })
        .map(hast::Node::text_content)
        .collect::<String>()
        .trim()
        .to_owned()
}

fn nested_list(entries: &[TocEntry]) -> Element {
    let base = entries.iter().map(|e| e.level).min().unwrap_or(1);
    let mut next = 0;
    list_from(entries, &mut next, base)
}

fn list_from(entries: &[TocEntry], next: &mut usize, level: u8) -> Element {
    let mut items: Vec<Element> = Vec::new();
    while let Some(entry) = entries.get(*next) {
        if entry.level < level {
            break;
        }
        if entry.level > level {
            let sub = list_from(entries, next, level + 1);
            match items.last_mut() {
                Some(item) => item.children.push(sub.into()),
                None => items.push(Element::new("li").with_child(sub)),
            }
            continue;
        }
        let link = Element::new("a")
            .with_attr("href", format!("#{}", entry.id))
            .with_text(entry.title.clone());
        items.push(Element::new("li").with_child(link));
        *next += 1;
    }
    Element::new("ul").with_children(items.into_iter().map(Into::into).collect())
}
