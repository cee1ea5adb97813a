//! Titles on footnote back-references.

use crate::error::PassError;
use crate::hast;
use crate::pass::{HtmlPass, RunContext};

use super::names;

/// Sets `title` on every `a[data-footnote-backref]` from a format where
/// `{n}` is the footnote's number. Forward references are left alone.
#[derive(Debug)]
pub struct FootnoteTitles {
    format: String,
}

impl FootnoteTitles {
    #[must_use]
    pub fn new(format: String) -> Self {
        Self { format }
    }
}

impl Default for FootnoteTitles {
    fn default() -> Self {
        Self::new("Return to footnote {n}".to_owned())
    }
}

impl HtmlPass for FootnoteTitles {
    fn name(&self) -> &'static str {
        names::FOOTNOTE_TITLES
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.visit_elements_mut(&mut |section, _| {
            if section.tag != "section" || !section.has_attr("data-footnotes") {
                return;
            }
            let Some(list) = section.child_element_mut("ol") else {
                return;
            };
            let items = list
                .children
                .iter_mut()
                .filter_map(hast::Node::as_element_mut)
                .filter(|el| el.tag == "li");
            for (i, item) in items.enumerate() {
                let title = self.format.replace("{n}", &(i + 1).to_string());
                for child in &mut item.children {
                    child.visit_elements_mut(&mut |el, _| {
                        if el.tag == "a" && el.has_attr("data-footnote-backref") {
                            el.set_attr("title", &title);
                        }
                    });
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rehype::test_support::render_with;

    #[test]
    fn test_backrefs_titled() {
        let html = render_with(
            &FootnoteTitles::default(),
            "One[^a] two[^b] again[^a].\n\n[^a]: First.\n\n[^b]: Second.\n",
        );
        assert_eq!(html.matches("title=\"Return to footnote 1\"").count(), 2);
        assert_eq!(html.matches("title=\"Return to footnote 2\"").count(), 1);
        assert!(!html.contains("data-footnote-ref aria-describedby=\"footnote-label\" title"));
    }
}
