//! Diagram code blocks.
//!
//! With [`DiagramStrategy::InlineSvg`] every diagram of a document goes to
//! the [`DiagramRenderer`] in one batch and the code blocks are replaced by
//! `div.diagram` wrappers around the returned SVG. With
//! [`DiagramStrategy::Pre`] the source is left in `<pre class="mermaid">`
//! for a client-side renderer.
//!
//! Each diagram gets an id `{language}-{n}`, counted from zero per language
//! within the document.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PassError, excerpt};
use crate::hast::{self, Element};
use crate::options::{DiagramStrategy, PipelineOptions};
use crate::pass::{HtmlPass, RunContext};

use super::{DiagramRenderer, DiagramRequest, code_language, names, replace_elements};

/// Renders or marks up diagram code blocks.
pub struct Diagrams {
    strategy: DiagramStrategy,
    languages: Vec<String>,
    renderer: Option<Arc<dyn DiagramRenderer>>,
}

impl Diagrams {
    #[must_use]
    pub fn new(options: &PipelineOptions) -> Self {
        Self {
            strategy: options.diagram_strategy,
            languages: options.diagram_languages.clone(),
            renderer: options.diagram_renderer.clone(),
        }
    }

    fn diagram_language(&self, el: &Element) -> Option<String> {
        if el.tag != "pre" {
            return None;
        }
        code_language(el).filter(|lang| self.languages.contains(lang))
    }

    fn render(&self, requests: &[DiagramRequest]) -> Result<Vec<String>, PassError> {
        let Some(renderer) = &self.renderer else {
            let first = &requests[0];
            return Err(PassError::MissingDiagramRenderer {
                language: first.language.clone(),
                excerpt: excerpt(&first.source),
            });
        };

        tracing::debug!(count = requests.len(), "Rendering diagrams");
        let results = renderer.render_batch(requests);
        requests
            .iter()
            .zip(results)
            .map(|(request, result)| {
                result.map_err(|source| PassError::Diagram {
                    language: request.language.clone(),
                    excerpt: excerpt(&request.source),
                    source,
                })
            })
            .collect()
    }
}

impl HtmlPass for Diagrams {
    fn name(&self) -> &'static str {
        names::DIAGRAMS
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let mut requests = Vec::new();
        tree.visit_elements(&mut |el| {
            if let Some(language) = self.diagram_language(el) {
                let source = el.text_content();
                requests.push(DiagramRequest {
                    index: requests.len(),
                    language,
                    source,
                });
            }
        });
        if requests.is_empty() {
            return Ok(());
        }

        let rendered: Vec<Option<String>> = match self.strategy {
            DiagramStrategy::InlineSvg => self.render(&requests)?.into_iter().map(Some).collect(),
            DiagramStrategy::Pre => vec![None; requests.len()],
        };
        let mut rendered = rendered.into_iter();

        let mut counters: HashMap<String, usize> = HashMap::new();
        let mut requests = requests.into_iter();
        replace_elements(tree, &mut |el| {
            if self.diagram_language(el).is_none() {
                return Ok(None);
            }
            let (Some(request), Some(svg)) = (requests.next(), rendered.next()) else {
                return Ok(None);
            };
            let counter = counters.entry(request.language.clone()).or_default();
            let id = format!("{}-{counter}", request.language);
            *counter += 1;

            let replacement = match svg {
                Some(svg) => Element::new("div")
                    .with_class("diagram")
                    .with_class(&format!("diagram-{}", request.language))
                    .with_attr("id", id)
                    .with_child(hast::Node::Raw(svg)),
                None => Element::new("pre")
                    .with_class(&request.language)
                    .with_attr("id", id)
                    .with_text(request.source),
            };
            Ok(Some(replacement.into()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::rehype::test_support::run_pass_with;
    use crate::serialize::to_html;
    use pretty_assertions::assert_eq;

    struct EchoRenderer;

    impl DiagramRenderer for EchoRenderer {
        fn render_svg(&self, request: &DiagramRequest) -> Result<String, BoxError> {
            if request.source.contains("fail") {
                return Err("syntax error on line 1".into());
            }
            Ok(format!("<svg>{}</svg>", request.index))
        }
    }

    const TWO_DIAGRAMS: &str =
        "```mermaid\ngraph TD\n```\n\ntext\n\n```mermaid\nsequenceDiagram\n```\n";

    fn options() -> PipelineOptions {
        PipelineOptions::default().with_diagram_renderer(Arc::new(EchoRenderer))
    }

    #[test]
    fn test_inline_svg_ids() {
        let options = options();
        let (tree, _) = run_pass_with(&Diagrams::new(&options), TWO_DIAGRAMS, &options);
        assert_eq!(
            to_html(&tree),
            "<div class=\"diagram diagram-mermaid\" id=\"mermaid-0\"><svg>0</svg></div>\n\
             <p>text</p>\n\
             <div class=\"diagram diagram-mermaid\" id=\"mermaid-1\"><svg>1</svg></div>"
        );
    }

    #[test]
    fn test_pre_strategy() {
        let options = PipelineOptions::default().with_diagram_strategy(DiagramStrategy::Pre);
        let (tree, _) = run_pass_with(&Diagrams::new(&options), TWO_DIAGRAMS, &options);
        let html = to_html(&tree);
        assert!(html.starts_with("<pre class=\"mermaid\" id=\"mermaid-0\">graph TD\n</pre>"));
        assert!(html.contains("id=\"mermaid-1\""));
    }

    #[test]
    fn test_missing_renderer_is_fatal() {
        let options = PipelineOptions::default().with_diagram_strategy(DiagramStrategy::InlineSvg);
        let doc = crate::document::Document::new("a.md", "");
        let mut cx = RunContext::new(&doc);
        let mut tree = hast::Node::Root(vec![
            Element::new("pre")
                .with_child(
                    Element::new("code")
                        .with_class("language-mermaid")
                        .with_text("graph TD"),
                )
                .into(),
        ]);
        let err = Diagrams::new(&options).run(&mut tree, &mut cx).unwrap_err();
        assert!(matches!(err, PassError::MissingDiagramRenderer { .. }));
        assert!(err.to_string().contains("graph TD"));
    }

    #[test]
    fn test_renderer_failure_carries_excerpt() {
        let options = options();
        let doc = crate::document::Document::new("a.md", "");
        let mut cx = RunContext::new(&doc);
        let mut tree = hast::Node::Root(vec![
            Element::new("pre")
                .with_child(
                    Element::new("code")
                        .with_class("language-mermaid")
                        .with_text("graph fail"),
                )
                .into(),
        ]);
        let err = Diagrams::new(&options).run(&mut tree, &mut cx).unwrap_err();
        let PassError::Diagram { excerpt, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(excerpt, "graph fail");
    }

    #[test]
    fn test_other_languages_untouched() {
        let options = options();
        let (tree, _) = run_pass_with(
            &Diagrams::new(&options),
            "```rust\nfn main() {}\n```\n",
            &options,
        );
        assert!(to_html(&tree).starts_with("<pre"));
    }
}
