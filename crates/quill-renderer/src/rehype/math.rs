//! Math rendering to MathML.

use latex2mathml::{DisplayStyle, latex_to_mathml};

use crate::error::{PassError, excerpt};
use crate::hast::{self, Element};
use crate::pass::{HtmlPass, RunContext};

use super::{names, replace_elements};

const STYLESHEET_MARKER: &str = "data-math-stylesheet";

const PARSE_ERROR_MARKER: &str = "[PARSE ERROR";

/// Replaces math placeholders with MathML.
///
/// `code.math-inline` becomes `span.math.math-inline` and
/// `pre > code.math-display` becomes `div.math.math-display`. When a
/// stylesheet is configured, a document containing math gets exactly one
/// `<link>` to it at the top, however often the pass runs.
#[derive(Debug, Default)]
pub struct MathRender {
    stylesheet: Option<String>,
}

impl MathRender {
    #[must_use]
    pub fn new(stylesheet: Option<String>) -> Self {
        Self { stylesheet }
    }
}

fn render(tex: &str, style: DisplayStyle) -> Result<hast::Node, PassError> {
    let failed = |message: String| PassError::Math {
        excerpt: excerpt(tex),
        message,
    };
    let mathml = latex_to_mathml(tex.trim(), style).map_err(|e| failed(e.to_string()))?;
    match inline_error(&mathml) {
        Some(message) => Err(failed(message.to_owned())),
        None => Ok(hast::Node::Raw(mathml)),
    }
}

/// Error latex2mathml wrote into its output instead of returning.
fn inline_error(mathml: &str) -> Option<&str> {
    let start = mathml.find(PARSE_ERROR_MARKER)? + 1;
    let rest = &mathml[start..];
    Some(rest.find(']').map_or(rest, |end| &rest[..end]))
}

fn is_display(el: &Element) -> bool {
    el.tag == "pre"
        && el
            .child_element("code")
            .is_some_and(|code| code.has_class("math-display"))
}

impl HtmlPass for MathRender {
    fn name(&self) -> &'static str {
        names::MATH
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let mut found = false;
        replace_elements(tree, &mut |el| {
            let (tag, class, style) = if is_display(el) {
                ("div", "math-display", DisplayStyle::Block)
            } else if el.tag == "code" && el.has_class("math-inline") {
                ("span", "math-inline", DisplayStyle::Inline)
            } else {
                return Ok(None);
            };
            found = true;
            let math = render(&el.text_content(), style)?;
            let replacement = Element::new(tag)
                .with_class("math")
                .with_class(class)
                .with_child(math);
            Ok(Some(replacement.into()))
        })?;

        if !found {
            found = !tree.find_all(|el| el.has_class("math")).is_empty();
        }
        if let (true, Some(href)) = (found, &self.stylesheet)
            && let hast::Node::Root(children) = tree
            && !children.iter().any(|c| {
                c.as_element()
                    .is_some_and(|el| el.has_attr(STYLESHEET_MARKER))
            })
        {
            let link = Element::new("link")
                .with_attr("rel", "stylesheet")
                .with_attr("href", href)
                .with_flag(STYLESHEET_MARKER);
            children.insert(0, hast::Node::text("\n"));
            children.insert(0, link.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::PipelineOptions;
    use crate::rehype::test_support::{render_with, run_pass_with};
    use crate::serialize::to_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inline_and_display() {
        let html = render_with(
            &MathRender::default(),
            "Inline $$x^2$$ here.\n\n```math\n\\frac{a}{b}\n```\n",
        );
        assert!(html.contains("<span class=\"math math-inline\"><math"));
        assert!(html.contains("<div class=\"math math-display\"><math"));
        assert!(!html.contains("language-math"));
    }

    #[test]
    fn test_stylesheet_injected_once() {
        let pass = MathRender::new(Some("/math.css".to_owned()));
        let (mut tree, _) = run_pass_with(
            &pass,
            "$$a$$ and $$b$$\n\n$$c$$\n",
            &PipelineOptions::default(),
        );
        let doc = crate::document::Document::new("a.md", "");
        let mut cx = RunContext::new(&doc);
        pass.run(&mut tree, &mut cx).unwrap();
        let html = to_html(&tree);
        assert_eq!(html.matches("data-math-stylesheet").count(), 1);
        assert!(html.starts_with("<link rel=\"stylesheet\" href=\"/math.css\" data-math-stylesheet>"));
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let doc = crate::document::Document::new("a.md", "");
        let mut cx = RunContext::new(&doc);
        let mut tree = hast::Node::Root(vec![
            Element::new("code")
                .with_class("math-inline")
                .with_child(hast::Node::text("a \\\\ b"))
                .into(),
        ]);
        let err = MathRender::default().run(&mut tree, &mut cx).unwrap_err();
        let PassError::Math { message, excerpt } = err else {
            panic!("expected a math error");
        };
        assert!(message.starts_with("PARSE ERROR"));
        assert_eq!(excerpt, "a \\\\ b");
    }

    #[test]
    fn test_inline_error() {
        assert_eq!(
            inline_error("<math><mtext>[PARSE ERROR: NewLine]</mtext></math>"),
            Some("PARSE ERROR: NewLine")
        );
        assert_eq!(inline_error("<math><mi>x</mi></math>"), None);
    }

    #[test]
    fn test_no_math_no_stylesheet() {
        let pass = MathRender::new(Some("/math.css".to_owned()));
        let html = render_with(&pass, "Costs $5.\n");
        assert!(!html.contains("stylesheet"));
    }
}
