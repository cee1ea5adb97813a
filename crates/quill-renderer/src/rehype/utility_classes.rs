//! Utility classes for the structural elements of rendered content.
//!
//! Every rule adds a fixed class list to the elements it matches. Adding a
//! class already present is a no-op, so running the pass twice changes
//! nothing. Iframes are wrapped once in a responsive container.

use crate::error::PassError;
use crate::hast::{self, Element};
use crate::pass::{HtmlPass, RunContext};

use super::names;

struct Rule {
    applies: fn(&Element, &[String]) -> bool,
    classes: &'static [&'static str],
}

fn parent_is(ancestors: &[String], tag: &str) -> bool {
    ancestors.last().is_some_and(|t| t == tag)
}

static RULES: &[Rule] = &[
    Rule {
        applies: |el, _| el.tag == "p",
        classes: &["mb-8", "text-lg", "leading-relaxed"],
    },
    Rule {
        applies: |el, _| el.tag == "a" && !el.has_class("btn") && !el.has_class("heading-anchor"),
        classes: &[
            "border-b",
            "border-current",
            "shadow-[inset_0_-2px_0_0_currentColor]",
            "hover:border-blue-600",
            "hover:text-gray-900",
            "focus:border-blue-600",
            "focus:text-gray-900",
            "focus:outline-none",
            "transition-colors",
        ],
    },
    Rule {
        applies: |el, _| el.tag == "a" && el.has_class("heading-anchor"),
        classes: &[
            "hidden",
            "md:block",
            "absolute",
            "-left-4",
            "top-0",
            "w-4",
            "opacity-0",
            "group-hover:opacity-75",
            "hover:!opacity-100",
            "focus:!opacity-100",
            "border-0",
            "shadow-none",
        ],
    },
    Rule {
        applies: |el, _| matches!(el.tag.as_str(), "img" | "video"),
        classes: &[
            "block",
            "mx-auto",
            "mb-8",
            "max-w-full",
            "h-auto",
            "rounded-lg",
            "shadow-md",
        ],
    },
    Rule {
        applies: |el, _| el.tag == "figure" && !el.has_class("c-blockquote"),
        classes: &["my-8", "mx-auto", "max-w-none", "text-center"],
    },
    Rule {
        applies: |el, _| el.tag == "figure" && el.has_class("c-blockquote"),
        classes: &[
            "relative",
            "my-12",
            "px-8",
            "py-6",
            "rounded-lg",
            "bg-gray-100",
            "dark:bg-gray-800",
            "border-l-4",
            "border-[var(--color-primary)]",
        ],
    },
    Rule {
        applies: |el, _| el.tag == "figcaption" && !el.has_class("c-blockquote__attribution"),
        classes: &["text-base", "italic", "pt-3"],
    },
    Rule {
        applies: |el, _| el.tag == "figcaption" && el.has_class("c-blockquote__attribution"),
        classes: &[
            "mt-4",
            "pt-4",
            "border-t",
            "border-gray-300",
            "text-sm",
            "font-sans",
            "italic",
        ],
    },
    Rule {
        applies: |el, _| el.tag == "hr",
        classes: &[
            "bg-gray-300",
            "border-0",
            "my-16",
            "mx-auto",
            "w-96",
            "h-px",
        ],
    },
    Rule {
        applies: |el, _| matches!(el.tag.as_str(), "h2" | "h3" | "h4"),
        classes: &["mb-2", "mt-6", "relative", "first:mt-0", "group"],
    },
    Rule {
        applies: |el, _| el.tag == "ul",
        classes: &["list-disc", "list-outside", "pl-4", "mb-8"],
    },
    Rule {
        applies: |el, _| el.tag == "ol",
        classes: &["list-decimal", "list-outside", "pl-4", "mb-8"],
    },
    Rule {
        applies: |el, _| el.tag == "li",
        classes: &["mb-1", "last:mb-0"],
    },
    Rule {
        applies: |el, ancestors| el.tag == "code" && !ancestors.iter().any(|t| t == "pre"),
        classes: &[
            "bg-gray-100",
            "rounded",
            "border",
            "border-gray-300",
            "inline-block",
            "font-mono",
            "text-xs",
            "mx-1",
            "px-2",
            "py-1",
        ],
    },
    Rule {
        applies: |el, _| el.tag == "mark",
        classes: &["bg-gray-300", "text-gray-900"],
    },
    Rule {
        applies: |el, ancestors| el.tag == "blockquote" && !parent_is(ancestors, "figure"),
        classes: &[
            "border-l-4",
            "border-blue-600",
            "my-8",
            "pl-14",
            "-ml-14",
            "font-serif",
            "text-2xl",
            "italic",
        ],
    },
    Rule {
        applies: |el, ancestors| el.tag == "blockquote" && parent_is(ancestors, "figure"),
        classes: &[
            "relative",
            "z-10",
            "pl-8",
            "border-0",
            "my-0",
            "font-serif",
            "text-xl",
            "italic",
        ],
    },
    Rule {
        applies: |el, _| el.tag == "pre" && el.child_element("code").is_some(),
        classes: &[
            "block",
            "text-base",
            "px-6",
            "py-8",
            "overflow-x-auto",
            "bg-gray-900",
            "text-gray-100",
            "rounded-lg",
            "my-8",
            "lg:px-12",
        ],
    },
    Rule {
        applies: |el, _| el.tag == "pre" && el.has_attr("data-filename"),
        classes: &["relative", "pt-8"],
    },
    Rule {
        applies: |el, _| el.has_class("code-tabs"),
        classes: &["border", "border-gray-200", "rounded-md", "overflow-hidden"],
    },
    Rule {
        applies: |el, _| el.tag == "summary",
        classes: &[
            "outline-none",
            "select-none",
            "cursor-pointer",
            "list-none",
            "marker:hidden",
        ],
    },
    Rule {
        applies: |el, _| el.tag == "details",
        classes: &["[&>*:not(summary)]:pl-5"],
    },
];

const EMBED_WRAPPER: &[&str] = &[
    "relative",
    "aspect-video",
    "my-8",
    "rounded-lg",
    "overflow-hidden",
    "shadow-md",
];
const EMBED_FRAME: &[&str] = &["absolute", "inset-0", "w-full", "h-full"];

/// Adds the utility class table to every matching element.
#[derive(Debug, Default)]
pub struct UtilityClasses;

impl HtmlPass for UtilityClasses {
    fn name(&self) -> &'static str {
        names::UTILITY_CLASSES
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.visit_elements_mut(&mut |el, ancestors| {
            for rule in RULES {
                if (rule.applies)(el, ancestors) {
                    el.add_classes(rule.classes);
                }
            }
        });

        // Frames already carrying the frame classes were wrapped before.
        tree.rewrite_children(&mut |children| {
            for child in children.iter_mut() {
                let hast::Node::Element(el) = child else {
                    continue;
                };
                if el.tag != "iframe" || el.has_class("inset-0") {
                    continue;
                }
                let mut frame = std::mem::replace(el, Element::new("div"));
                frame.add_classes(EMBED_FRAME);
                el.add_classes(EMBED_WRAPPER);
                el.children.push(frame.into());
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rehype::test_support::render_with;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paragraph_and_inline_code() {
        assert_eq!(
            render_with(&UtilityClasses, "Use `x`.\n"),
            "<p class=\"mb-8 text-lg leading-relaxed\">Use <code class=\"bg-gray-100 rounded border border-gray-300 inline-block font-mono text-xs mx-1 px-2 py-1\">x</code>.</p>"
        );
    }

    #[test]
    fn test_code_in_pre_not_inline_styled() {
        let html = render_with(&UtilityClasses, "```\nx\n```\n");
        assert!(html.starts_with("<pre class=\"block text-base"));
        assert!(html.contains("<code>x\n</code>"));
    }

    #[test]
    fn test_idempotent() {
        let options = crate::options::PipelineOptions::default();
        let (mut tree, _) = crate::rehype::test_support::run_pass_with(
            &UtilityClasses,
            "## Title\n\n- a\n- b\n\n::youtube{id=abc}\n",
            &options,
        );
        let once = crate::serialize::to_html(&tree);
        let doc = crate::document::Document::new("a.md", "");
        let mut cx = RunContext::new(&doc);
        UtilityClasses.run(&mut tree, &mut cx).unwrap();
        assert_eq!(crate::serialize::to_html(&tree), once);
        assert_eq!(once.matches("aspect-video").count(), 1);
    }

    #[test]
    fn test_attribution_quote_styles() {
        let html = render_with(&UtilityClasses, "> Quote.\n>\n> — Someone\n");
        assert!(html.starts_with("<figure class=\"c-blockquote relative my-12"));
        assert!(html.contains("<blockquote class=\"relative z-10"));
        assert!(html.contains("c-blockquote__attribution mt-4"));
    }
}
