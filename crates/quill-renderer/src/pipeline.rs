//! Pipeline orchestration.
//!
//! A [`Pipeline`] owns the configured passes and runs one document through
//! parse, markdown passes, bridge, HTML passes and serialization. Passes
//! and options are read-only while rendering, so one pipeline can render
//! many documents at once; everything a run records lives in its own
//! [`RunContext`].

use rayon::prelude::*;

use crate::bridge::{HandlerMap, to_hast};
use crate::document::Document;
use crate::error::PipelineError;
use crate::hast;
use crate::options::PipelineOptions;
use crate::parse::{ParseOptions, parse_with};
use crate::pass::{HtmlPass, MarkdownPass, RunContext, TocEntry};
use crate::serialize::to_html;
use crate::{rehype, remark};

/// Output of rendering one document.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rendered {
    pub html: String,
    /// Text of the first level-1 heading.
    pub title: Option<String>,
    /// Headings with their ids, in document order.
    pub headings: Vec<TocEntry>,
    /// Non-fatal problems found while rendering.
    pub warnings: Vec<String>,
}

/// Configured markdown-to-HTML pipeline.
pub struct Pipeline {
    options: PipelineOptions,
    markdown: Vec<Box<dyn MarkdownPass>>,
    handlers: HandlerMap,
    html: Vec<Box<dyn HtmlPass>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("markdown", &self.markdown_pass_names())
            .field("html", &self.html_pass_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline with every standard pass enabled by `options`.
    #[must_use]
    pub fn new(options: PipelineOptions) -> Self {
        Self::builder(options).build()
    }

    /// Builder starting from the standard passes.
    #[must_use]
    pub fn builder(options: PipelineOptions) -> PipelineBuilder {
        PipelineBuilder {
            markdown: remark::default_passes(&options),
            html: rehype::default_passes(&options),
            handlers: HandlerMap::standard(),
            options,
        }
    }

    /// Builder with no passes at all, for running passes in isolation.
    #[must_use]
    pub fn empty(options: PipelineOptions) -> PipelineBuilder {
        PipelineBuilder {
            markdown: Vec::new(),
            html: Vec::new(),
            handlers: HandlerMap::standard(),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    #[must_use]
    pub fn markdown_pass_names(&self) -> Vec<&'static str> {
        self.markdown.iter().map(|p| p.name()).collect()
    }

    #[must_use]
    pub fn html_pass_names(&self) -> Vec<&'static str> {
        self.html.iter().map(|p| p.name()).collect()
    }

    /// Render one document.
    ///
    /// Fails only when a pass reports a document-fatal error; the error
    /// names the pass and the document.
    pub fn render(&self, document: &Document) -> Result<Rendered, PipelineError> {
        let _span = tracing::debug_span!("render", document = %document.id).entered();
        let mut cx = RunContext::new(document);

        let parse_options = ParseOptions {
            single_dollar_math: self.options.single_dollar_math,
        };
        let mut tree = parse_with(&document.source, document.content_type, parse_options);
        for pass in &self.markdown {
            tracing::trace!(pass = pass.name(), "Running markdown pass");
            pass.run(&mut tree, &mut cx)
                .map_err(|source| fatal(pass.name(), document, source))?;
        }

        let (mut html, warnings) = to_hast(&tree, &self.handlers, &self.options);
        cx.warnings.extend(warnings);
        self.run_html(&mut html, &mut cx)?;

        let title = cx
            .headings
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.title.clone());
        if !cx.warnings.is_empty() {
            tracing::debug!(count = cx.warnings.len(), "Rendered with warnings");
        }
        Ok(Rendered {
            html: to_html(&html),
            title,
            headings: cx.headings,
            warnings: cx.warnings,
        })
    }

    /// Run only the HTML passes over an existing tree.
    pub fn run_html(&self, tree: &mut hast::Node, cx: &mut RunContext<'_>) -> Result<(), PipelineError> {
        for pass in &self.html {
            tracing::trace!(pass = pass.name(), "Running HTML pass");
            pass.run(tree, cx)
                .map_err(|source| fatal(pass.name(), cx.document, source))?;
        }
        Ok(())
    }

    /// Render markdown text as an anonymous document.
    pub fn render_str(&self, source: &str) -> Result<Rendered, PipelineError> {
        self.render(&Document::new("<input>", source))
    }

    /// Render documents in parallel. Results are in input order.
    #[must_use]
    pub fn render_all(&self, documents: &[Document]) -> Vec<Result<Rendered, PipelineError>> {
        documents.par_iter().map(|doc| self.render(doc)).collect()
    }
}

fn fatal(pass: &'static str, document: &Document, source: crate::error::PassError) -> PipelineError {
    tracing::error!(pass, document = %document.id, error = %source, "Pass failed");
    PipelineError {
        pass,
        document: document.id.clone(),
        source,
    }
}

/// Position of a pass relative to another one, by name.
#[derive(Debug, Clone, Copy)]
enum Anchor<'a> {
    Before(&'a str),
    After(&'a str),
}

/// Builds a [`Pipeline`], adding, replacing or removing passes by name.
pub struct PipelineBuilder {
    options: PipelineOptions,
    markdown: Vec<Box<dyn MarkdownPass>>,
    handlers: HandlerMap,
    html: Vec<Box<dyn HtmlPass>>,
}

/// Insert `item` relative to the entry named by `anchor`, or at the end when
/// no entry has that name.
fn insert_at<T: ?Sized>(
    list: &mut Vec<Box<T>>,
    anchor: Anchor<'_>,
    item: Box<T>,
    name_of: impl Fn(&T) -> &'static str,
) {
    let (target, offset) = match anchor {
        Anchor::Before(name) => (name, 0),
        Anchor::After(name) => (name, 1),
    };
    match list.iter().position(|p| name_of(p) == target) {
        Some(index) => list.insert(index + offset, item),
        None => {
            tracing::warn!(pass = target, "No such pass, appending instead");
            list.push(item);
        }
    }
}

fn replace_in<T: ?Sized>(list: &mut Vec<Box<T>>, item: Box<T>, name_of: impl Fn(&T) -> &'static str) {
    let name = name_of(&item);
    match list.iter().position(|p| name_of(p) == name) {
        Some(index) => list[index] = item,
        None => list.push(item),
    }
}

impl PipelineBuilder {
    /// Append a markdown pass.
    #[must_use]
    pub fn markdown_pass(mut self, pass: impl MarkdownPass + 'static) -> Self {
        self.markdown.push(Box::new(pass));
        self
    }

    /// Append an HTML pass.
    #[must_use]
    pub fn html_pass(mut self, pass: impl HtmlPass + 'static) -> Self {
        self.html.push(Box::new(pass));
        self
    }

    /// Replace the markdown pass with the same name, or append.
    #[must_use]
    pub fn replace_markdown(mut self, pass: impl MarkdownPass + 'static) -> Self {
        replace_in(&mut self.markdown, Box::new(pass), |p| p.name());
        self
    }

    /// Replace the HTML pass with the same name, or append.
    #[must_use]
    pub fn replace_html(mut self, pass: impl HtmlPass + 'static) -> Self {
        replace_in(&mut self.html, Box::new(pass), |p| p.name());
        self
    }

    #[must_use]
    pub fn markdown_before(mut self, name: &str, pass: impl MarkdownPass + 'static) -> Self {
        insert_at(&mut self.markdown, Anchor::Before(name), Box::new(pass), |p| p.name());
        self
    }

    #[must_use]
    pub fn markdown_after(mut self, name: &str, pass: impl MarkdownPass + 'static) -> Self {
        insert_at(&mut self.markdown, Anchor::After(name), Box::new(pass), |p| p.name());
        self
    }

    #[must_use]
    pub fn html_before(mut self, name: &str, pass: impl HtmlPass + 'static) -> Self {
        insert_at(&mut self.html, Anchor::Before(name), Box::new(pass), |p| p.name());
        self
    }

    #[must_use]
    pub fn html_after(mut self, name: &str, pass: impl HtmlPass + 'static) -> Self {
        insert_at(&mut self.html, Anchor::After(name), Box::new(pass), |p| p.name());
        self
    }

    /// Remove every pass, markdown or HTML, with this name.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.markdown.retain(|p| p.name() != name);
        self.html.retain(|p| p.name() != name);
        self
    }

    /// Use a different bridge handler table.
    #[must_use]
    pub fn with_handlers(mut self, handlers: HandlerMap) -> Self {
        self.handlers = handlers;
        self
    }

    #[must_use]
    pub fn build(self) -> Pipeline {
        tracing::debug!(
            markdown = self.markdown.len(),
            html = self.html.len(),
            "Pipeline configured"
        );
        Pipeline {
            options: self.options,
            markdown: self.markdown,
            handlers: self.handlers,
            html: self.html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PassError;
    use crate::mdast;
    use pretty_assertions::assert_eq;

    struct Shout;

    impl MarkdownPass for Shout {
        fn name(&self) -> &'static str {
            "shout"
        }

        fn run(&self, tree: &mut mdast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
            tree.walk_mut(&mut |node| {
                if let mdast::NodeValue::Text(text) = &mut node.value {
                    *text = text.to_uppercase();
                }
            });
            Ok(())
        }
    }

    struct Fail;

    impl HtmlPass for Fail {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn run(&self, _tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
            Err(PassError::Math {
                excerpt: "x".to_owned(),
                message: "boom".to_owned(),
            })
        }
    }

    #[test]
    fn test_default_order() {
        let pipeline = Pipeline::new(PipelineOptions::default());
        assert_eq!(
            pipeline.html_pass_names(),
            vec![
                "diagrams",
                "math-render",
                "highlight",
                "code-tab-wrapper",
                "accessible-emojis",
                "external-links",
                "heading-ids",
                "toc",
                "heading-anchors",
                "footnote-titles",
                "color-swatch",
                "utility-classes",
            ]
        );
        let markdown = pipeline.markdown_pass_names();
        assert_eq!(markdown.first(), Some(&"directives"));
        assert_eq!(markdown.last(), Some(&"breaks"));
    }

    #[test]
    fn test_builder_insert_and_remove() {
        let pipeline = Pipeline::builder(PipelineOptions::default())
            .without("utility-classes")
            .without("smartypants")
            .markdown_before("mark", Shout)
            .build();
        let markdown = pipeline.markdown_pass_names();
        let shout = markdown.iter().position(|n| *n == "shout").unwrap();
        assert_eq!(markdown[shout + 1], "mark");
        assert!(!markdown.contains(&"smartypants"));
        assert!(!pipeline.html_pass_names().contains(&"utility-classes"));
    }

    #[test]
    fn test_isolated_pass() {
        let pipeline = Pipeline::empty(PipelineOptions::default())
            .markdown_pass(Shout)
            .build();
        let rendered = pipeline.render_str("hello *world*\n").unwrap();
        assert_eq!(rendered.html, "<p>HELLO <em>WORLD</em></p>");
    }

    #[test]
    fn test_fatal_error_names_pass_and_document() {
        let pipeline = Pipeline::empty(PipelineOptions::default())
            .html_pass(Fail)
            .build();
        let err = pipeline
            .render(&Document::new("posts/a.md", "text\n"))
            .unwrap_err();
        assert_eq!(err.pass, "fail");
        assert_eq!(err.document, "posts/a.md");
    }

    #[test]
    fn test_title_and_headings() {
        let pipeline = Pipeline::new(PipelineOptions::default());
        let rendered = pipeline.render_str("# Guide\n\n## Install\n").unwrap();
        assert_eq!(rendered.title.as_deref(), Some("Guide"));
        assert_eq!(rendered.headings.len(), 2);
    }

    #[test]
    fn test_render_all_keeps_order() {
        let pipeline = Pipeline::new(PipelineOptions::default());
        let docs: Vec<_> = (0..8)
            .map(|i| Document::new(format!("{i}.md"), format!("# Doc {i}\n")))
            .collect();
        let titles: Vec<_> = pipeline
            .render_all(&docs)
            .into_iter()
            .map(|r| r.unwrap().title.unwrap())
            .collect();
        assert_eq!(titles[0], "Doc 0");
        assert_eq!(titles[7], "Doc 7");
    }

    fn plain() -> PipelineOptions {
        PipelineOptions {
            utility_classes: false,
            ..PipelineOptions::default()
        }
    }

    struct Broken;

    impl crate::rehype::DiagramRenderer for Broken {
        fn render_svg(
            &self,
            _request: &crate::rehype::DiagramRequest,
        ) -> Result<String, crate::error::BoxError> {
            Err("connection refused".into())
        }
    }

    #[test]
    fn test_html_passes_idempotent() {
        let pipeline = Pipeline::new(PipelineOptions::default());
        let doc = Document::new(
            "a.md",
            "# Title\n\n## Part\n\nSee [x](https://example.com) and `#fff`.\n\n```js [g:One] {1}\nlet a = 1;\n```\n\n```js [g:Two]\nlet b = 2;\n```\n\n> Quote.\n>\n> — Someone\n\nNote[^n].\n\n[^n]: Here.\n",
        );
        let mut cx = RunContext::new(&doc);
        let mut tree = crate::parse::parse(&doc.source, doc.content_type);
        for pass in &pipeline.markdown {
            pass.run(&mut tree, &mut cx).unwrap();
        }
        let (mut html, _) = to_hast(&tree, &pipeline.handlers, pipeline.options());
        pipeline.run_html(&mut html, &mut cx).unwrap();
        let once = to_html(&html);
        pipeline.run_html(&mut html, &mut cx).unwrap();
        assert_eq!(to_html(&html), once);
    }

    #[test]
    fn test_duplicate_heading_slugs() {
        let pipeline = Pipeline::new(plain());
        let rendered = pipeline
            .render_str("## Hello World\n\n## Hello World\n\n## Hello World\n")
            .unwrap();
        let ids: Vec<_> = rendered.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["hello-world", "hello-world-1", "hello-world-2"]);
    }

    #[test]
    fn test_single_dollar_is_not_math() {
        let pipeline = Pipeline::new(PipelineOptions::default());
        let html = pipeline
            .render_str("This is $5 and not math: $x$.\n")
            .unwrap()
            .html;
        assert!(html.contains("$5"));
        assert!(html.contains("$x$"));
        assert!(!html.contains("class=\"math"));
        assert!(!html.contains("language-math"));
    }

    #[test]
    fn test_code_tabs_grouped() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline
            .render_str("```js [g1:JavaScript]\nlet a;\n```\n\n```ts [g1:TypeScript]\nlet b;\n```\n")
            .unwrap()
            .html;
        assert_eq!(html.matches("class=\"code-tabs\"").count(), 1);
        assert_eq!(html.matches("data-group=\"g1\"").count(), 1);
        assert!(html.contains("data-tab=\"JavaScript\""));
        assert!(html.contains("data-tab=\"TypeScript\""));
        assert!(!html.contains("[g1:"));
    }

    #[test]
    fn test_fence_meta_consumed() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline
            .render_str("```rust [g:Main] {2} ins={1} del={3} showLineNumbers\na\nb\nc\n```\n")
            .unwrap()
            .html;
        assert!(!html.contains("data-meta"));
        assert!(!html.contains("{2}"));
        assert!(!html.contains("ins="));
        assert!(!html.contains("[g:Main]"));
        assert!(html.contains("highlighted"));
        assert!(html.contains("diff add"));
    }

    #[test]
    fn test_only_external_links_decorated() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline
            .render_str("[Example](https://example.com) and [Home](/)\n")
            .unwrap()
            .html;
        assert_eq!(html.matches("target=\"_blank\"").count(), 1);
        assert_eq!(html.matches("rel=\"noopener noreferrer\"").count(), 1);
        assert!(html.contains("<a href=\"/\">Home</a>"));
    }

    #[test]
    fn test_table_caption() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline
            .render_str("| a |\n|---|\n| 1 |\n\nTable: My caption\n")
            .unwrap()
            .html;
        assert!(html.starts_with("<figure"));
        assert!(html.contains("<figcaption>My caption</figcaption>"));
        assert!(!html.contains("Table:"));
    }

    #[test]
    fn test_details_block() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline
            .render_str("[[details | My summary]]\n| content line\n")
            .unwrap()
            .html;
        assert!(html.contains("<details"));
        assert!(html.contains(">My summary</summary>"));
        assert!(html.contains("content line"));
    }

    #[test]
    fn test_diagram_failure_is_fatal() {
        let options = PipelineOptions::default().with_diagram_renderer(std::sync::Arc::new(Broken));
        let pipeline = Pipeline::new(options);
        let err = pipeline
            .render(&Document::new("guide/flow.md", "```mermaid\ngraph TD; A-->B\n```\n"))
            .unwrap_err();
        assert_eq!(err.pass, "diagrams");
        assert_eq!(err.document, "guide/flow.md");
        let message = err.to_string();
        assert!(message.contains("connection refused"), "{message}");
        assert!(message.contains("graph TD"), "{message}");
    }

    #[test]
    fn test_container_directive_is_not_a_definition_list() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline.render_str(":::note\nBody text\n:::\n").unwrap().html;
        assert!(!html.contains("<dl"), "{html}");
        assert!(html.contains("Body text"), "{html}");
    }

    #[test]
    fn test_inline_math_survives_markdown() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline
            .render_str("Sets $$\\{a\\}$$ and $$a*b*c$$ here.\n")
            .unwrap()
            .html;
        assert_eq!(html.matches("<span class=\"math math-inline\"><math").count(), 2);
        assert!(!html.contains("<em>"), "{html}");
        assert!(html.contains("{"), "{html}");
        assert_eq!(html.matches("data-math-stylesheet").count(), 1);
        assert!(html.contains(crate::options::DEFAULT_MATH_STYLESHEET));
    }

    #[test]
    fn test_math_parse_error_is_fatal() {
        let pipeline = Pipeline::new(plain());
        let err = pipeline
            .render(&Document::new("a.md", "$$\na \\\\ b\n$$\n"))
            .unwrap_err();
        assert_eq!(err.pass, "math-render");
        assert!(matches!(err.source, PassError::Math { .. }));
    }

    #[test]
    fn test_default_options_keep_diagrams_for_the_client() {
        let pipeline = Pipeline::new(PipelineOptions::default());
        let html = pipeline
            .render_str("```mermaid\ngraph TD; A-->B\n```\n")
            .unwrap()
            .html;
        assert!(html.starts_with("<pre class=\"mermaid\" id=\"mermaid-0\">"), "{html}");
    }

    #[test]
    fn test_soft_breaks_and_sub_super() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline.render_str("H~2~O and x^2^
next line
").unwrap().html;
        assert_eq!(html, "<p>H<sub>2</sub>O and x<sup>2</sup><br>\nnext line</p>");
    }

    #[test]
    fn test_contents_heading_filled() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline
            .render_str("# Guide

## Contents

## Install

## Usage
")
            .unwrap()
            .html;
        assert!(html.contains("<li><a href=\"#install\">Install</a></li>"), "{html}");
        assert!(!html.contains("href=\"#guide\""), "{html}");
    }

    #[test]
    fn test_attributes_align_and_emoji() {
        let pipeline = Pipeline::new(plain());
        let html = pipeline
            .render_str("[center]\n\n[Go](/go){.button}\n\n[/center]\n\nDone :rocket:\n")
            .unwrap()
            .html;
        assert!(html.contains("<div class=\"flex flex-col items-center\">"), "{html}");
        assert!(html.contains("class=\"button\">Go</a>"), "{html}");
        assert!(html.contains("<span role=\"img\" aria-label=\"rocket\">"), "{html}");
    }
}
