//! Bare URLs to links.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};

use super::{Descend, names, splice_matches, split_text};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:https?://|www\.)[^\s<>]+").expect("invalid url regex"));

/// Links bare `http(s)://` and `www.` URLs outside existing links.
#[derive(Debug, Default)]
pub struct Linkify;

impl MarkdownPass for Linkify {
    fn name(&self) -> &'static str {
        names::LINKIFY
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        split_text(tree, Descend::SkipLinks, &mut |text| {
            let found = URL_RE.find_iter(text).filter_map(|m| {
                let before = text[..m.start()].chars().next_back();
                if before.is_some_and(|c| c.is_alphanumeric() || c == '/' || c == '@') {
                    return None;
                }
                let display = trim_url(m.as_str());
                if display.ends_with("://") || display.len() <= "www.".len() {
                    return None;
                }
                let url = if display.starts_with("www.") {
                    format!("https://{display}")
                } else {
                    display.to_owned()
                };
                let link = Node::new(NodeValue::Link {
                    url,
                    title: String::new(),
                })
                .with_children(vec![Node::text(display)]);
                Some((m.start(), m.start() + display.len(), link))
            });
            splice_matches(text, found)
        });
        Ok(())
    }
}

/// Drop trailing punctuation and unbalanced closing parentheses.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ':', ';', '!', '?', '"', '\'', '*', '_']);
        let trimmed = match trimmed.strip_suffix(')') {
            Some(inner) if trimmed.matches('(').count() < trimmed.matches(')').count() => inner,
            _ => trimmed,
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::remark::test_support::run_pass;

    fn links(source: &str) -> Vec<(String, String)> {
        let (tree, _) = run_pass(&Linkify, source);
        let mut found = Vec::new();
        tree.walk(&mut |node| {
            if let NodeValue::Link { url, .. } = &node.value {
                found.push((url.clone(), node.text_content()));
            }
        });
        found
    }

    #[test]
    fn test_bare_urls() {
        assert_eq!(
            links("See https://example.com/docs. Or www.rust-lang.org!\n"),
            vec![
                ("https://example.com/docs".to_owned(), "https://example.com/docs".to_owned()),
                ("https://www.rust-lang.org".to_owned(), "www.rust-lang.org".to_owned()),
            ]
        );
    }

    #[test]
    fn test_parenthesized_url() {
        assert_eq!(
            links("(see https://en.wikipedia.org/wiki/Rust_(language))\n"),
            vec![(
                "https://en.wikipedia.org/wiki/Rust_(language)".to_owned(),
                "https://en.wikipedia.org/wiki/Rust_(language)".to_owned()
            )]
        );
    }

    #[test]
    fn test_existing_links_untouched() {
        assert_eq!(
            links("[docs](https://example.com) `https://example.org`\n"),
            vec![("https://example.com".to_owned(), "docs".to_owned())]
        );
    }
}
