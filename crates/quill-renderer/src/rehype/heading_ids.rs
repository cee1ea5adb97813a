//! Heading ids and the table of contents.

use std::collections::HashSet;

use crate::error::PassError;
use crate::hast;
use crate::pass::{HtmlPass, RunContext, TocEntry};

use super::names;

/// Convert heading text to a URL-safe slug.
///
/// Lowercase letters and digits are kept, runs of whitespace, hyphens and
/// underscores become a single hyphen, everything else is dropped.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    if result.is_empty() {
        result.push_str("heading");
    }
    result
}

pub(super) fn heading_level(tag: &str) -> Option<u8> {
    match tag.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
        _ => None,
    }
}

/// Assigns unique ids to headings and records them for the table of
/// contents.
///
/// Ids already present in the document are kept and reserved. A slug seen
/// before gets the suffix format with `{n}` counting up from 1, so three
/// "Hello World" headings become `hello-world`, `hello-world-1`,
/// `hello-world-2`. The set of used ids lives for one run only.
#[derive(Debug)]
pub struct HeadingIds {
    suffix_format: String,
}

impl HeadingIds {
    #[must_use]
    pub fn new(suffix_format: String) -> Self {
        Self { suffix_format }
    }

    fn unique(&self, base: &str, used: &mut HashSet<String>) -> String {
        if used.insert(base.to_owned()) {
            return base.to_owned();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}{}", self.suffix_format.replace("{n}", &n.to_string()));
            if used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Default for HeadingIds {
    fn default() -> Self {
        Self::new("-{n}".to_owned())
    }
}

impl HtmlPass for HeadingIds {
    fn name(&self) -> &'static str {
        names::HEADING_IDS
    }

    fn run(&self, tree: &mut hast::Node, cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let mut used: HashSet<String> = HashSet::new();
        tree.visit_elements(&mut |el| {
            if let Some(id) = el.attr("id") {
                used.insert(id);
            }
        });

        tree.visit_elements_mut(&mut |el, _| {
            let Some(level) = heading_level(&el.tag) else {
                return;
            };
            let title = el.text_content().trim().to_owned();
            let id = match el.attr("id") {
                Some(id) => id,
                None => {
                    let id = self.unique(&slugify(&title), &mut used);
                    el.set_attr("id", &id);
                    id
                }
            };
            cx.headings.push(TocEntry { level, title, id });
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::PipelineOptions;
    use crate::rehype::test_support::run_pass_with;
    use crate::serialize::to_html;
    use pretty_assertions::assert_eq;

    fn ids(source: &str, pass: &HeadingIds) -> Vec<String> {
        let (_, summary) = run_pass_with(pass, source, &PipelineOptions::default());
        summary.headings.into_iter().map(|h| h.id).collect()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  What's new in 2.0?  "), "whats-new-in-20");
        assert_eq!(slugify("foo -- bar_baz"), "foo-bar-baz");
        assert_eq!(slugify("Über Café"), "über-café");
        assert_eq!(slugify("!!!"), "heading");
    }

    #[test]
    fn test_duplicates_get_suffixes() {
        assert_eq!(
            ids(
                "# Hello World\n\n## Hello World\n\n### Hello World\n",
                &HeadingIds::default()
            ),
            vec!["hello-world", "hello-world-1", "hello-world-2"]
        );
    }

    #[test]
    fn test_custom_suffix_format() {
        assert_eq!(
            ids("# Intro\n\n# Intro\n", &HeadingIds::new("_{n}".to_owned())),
            vec!["intro", "intro_1"]
        );
    }

    #[test]
    fn test_explicit_ids_reserved() {
        assert_eq!(
            ids("# Setup\n\n# Other {#setup}\n", &HeadingIds::default()),
            vec!["setup-1", "setup"]
        );
    }

    #[test]
    fn test_toc_entries() {
        let (tree, summary) = run_pass_with(
            &HeadingIds::default(),
            "# Title\n\n## Getting *started*\n",
            &PipelineOptions::default(),
        );
        assert_eq!(
            summary.headings,
            vec![
                TocEntry {
                    level: 1,
                    title: "Title".to_owned(),
                    id: "title".to_owned()
                },
                TocEntry {
                    level: 2,
                    title: "Getting started".to_owned(),
                    id: "getting-started".to_owned()
                },
            ]
        );
        assert!(to_html(&tree).contains("<h2 id=\"getting-started\">"));
    }
}
