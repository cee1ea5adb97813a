//! Color swatches on inline code.
//!
//! Inline code whose whole text is a CSS color (`#rgb`, `#rrggbb`,
//! `#rrggbbaa`, `rgb()`/`rgba()`, `hsl()`/`hsla()`) gets a `data-color`
//! attribute and a trailing `span.color-swatch` painted in that color.
//! Code inside `<pre>` is never touched.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PassError;
use crate::hast::{self, Element};
use crate::pass::{HtmlPass, RunContext};

use super::names;

static HEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("invalid hex color regex")
});

static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^rgba?\(\s*(\d{1,3}%?)\s*(?:,|\s)\s*(\d{1,3}%?)\s*(?:,|\s)\s*(\d{1,3}%?)(?:\s*(?:,|/)\s*(\d*\.?\d+%?))?\s*\)$",
    )
    .expect("invalid rgb color regex")
});

static HSL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^hsla?\(\s*([-+]?\d*\.?\d+)(?:deg|rad|turn|grad)?\s*(?:,|\s)\s*(\d{1,3}%?)\s*(?:,|\s)\s*(\d{1,3}%?)(?:\s*(?:,|/)\s*(\d*\.?\d+%?))?\s*\)$",
    )
    .expect("invalid hsl color regex")
});

fn number(component: &str) -> Option<f64> {
    component.trim().trim_end_matches('%').parse().ok()
}

fn in_range(component: &str, max_plain: f64) -> bool {
    let max = if component.ends_with('%') { 100.0 } else { max_plain };
    number(component).is_some_and(|v| (0.0..=max).contains(&v))
}

fn valid_alpha(alpha: Option<regex::Match<'_>>) -> bool {
    alpha.is_none_or(|a| in_range(a.as_str(), 1.0))
}

/// Whether `text` is a color value this pass recognises.
fn is_color(text: &str) -> bool {
    if HEX_RE.is_match(text) {
        return true;
    }
    if let Some(caps) = RGB_RE.captures(text) {
        return (1..=3).all(|i| in_range(&caps[i], 255.0)) && valid_alpha(caps.get(4));
    }
    if let Some(caps) = HSL_RE.captures(text) {
        // Any hue is accepted; saturation and lightness must be percentages.
        return (2..=3).all(|i| caps[i].ends_with('%') && in_range(&caps[i], 100.0))
            && valid_alpha(caps.get(4));
    }
    false
}

/// Text of an element whose children are all text nodes.
fn plain_text(el: &Element) -> Option<String> {
    let mut out = String::new();
    for child in &el.children {
        match child {
            hast::Node::Text(text) => out.push_str(text),
            _ => return None,
        }
    }
    Some(out)
}

/// Annotates inline code holding a color value.
#[derive(Debug, Default)]
pub struct ColorSwatch;

impl HtmlPass for ColorSwatch {
    fn name(&self) -> &'static str {
        names::COLOR_SWATCH
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.visit_elements_mut(&mut |el, ancestors| {
            if el.tag != "code" || el.has_attr("data-color") || ancestors.iter().any(|t| t == "pre") {
                return;
            }
            let Some(text) = plain_text(el) else {
                return;
            };
            let color = text.trim();
            if !is_color(color) {
                return;
            }
            let color = color.to_owned();
            el.set_attr("data-color", &color);
            el.children.push(
                Element::new("span")
                    .with_class("color-swatch")
                    .with_flag("data-color-swatch")
                    .with_attr("aria-hidden", "true")
                    .with_attr("style", format!("background-color: {color};"))
                    .into(),
            );
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
    fn test_is_color() {
        for ok in [
            "#fff",
            "#0969DA",
            "#0969da80",
            "rgb(9, 105, 218)",
            "rgba(9, 105, 218, 0.5)",
            "rgb(9 105 218 / 50%)",
            "hsl(212, 92%, 45%)",
            "hsla(212deg 92% 45% / 0.5)",
        ] {
            assert!(is_color(ok), "{ok}");
        }
        for bad in ["#ffff1", "rgb(300, 0, 0)", "hsl(10, 50, 50)", "red", "rgba(0,0,0,2)"] {
            assert!(!is_color(bad), "{bad}");
        }
    }

    #[test]
    fn test_inline_code_annotated() {
        assert_eq!(
            render_with(&ColorSwatch, "Use `#0969da` here.\n"),
            "<p>Use <code data-color=\"#0969da\">#0969da<span class=\"color-swatch\" data-color-swatch aria-hidden=\"true\" style=\"background-color: #0969da;\"></span></code> here.</p>"
        );
    }

    #[test]
    fn test_fenced_code_untouched() {
        let html = render_with(&ColorSwatch, "```\n#0969da\n```\n");
        assert!(!html.contains("data-color"));
    }

    #[test]
    fn test_idempotent() {
        let options = crate::options::PipelineOptions::default();
        let (mut tree, _) = crate::rehype::test_support::run_pass_with(
            &ColorSwatch,
            "`rgb(0, 0, 0)`\n",
            &options,
        );
        let doc = crate::document::Document::new("a.md", "");
        let mut cx = RunContext::new(&doc);
        ColorSwatch.run(&mut tree, &mut cx).unwrap();
        assert_eq!(
            crate::serialize::to_html(&tree).matches("color-swatch\"").count(),
            1
        );
    }
}
