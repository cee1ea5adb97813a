//! Markdown to HTML content pipeline built from composable tree passes.
//!
//! A document goes through five stages:
//!
//! 1. [`parse`] turns markdown (or MDX) into a markdown tree ([`mdast`]).
//! 2. Markdown passes ([`remark`]) rewrite that tree: directives, custom
//!    blocks, grid tables, math, code fence metadata, captions, text
//!    replacements.
//! 3. The [`bridge`] converts it into an HTML tree ([`hast`]) with one
//!    handler per node kind.
//! 4. HTML passes ([`rehype`]) rewrite the HTML tree: diagrams, math,
//!    syntax highlighting, code tabs, links, heading ids.
//! 5. The HTML tree is serialized.
//!
//! [`Pipeline`] runs all of it. Passes are looked up by name and can be
//! removed, replaced or inserted around each other through
//! [`PipelineBuilder`].
//!
//! # Example
//!
//! ```
//! use quill_renderer::{Document, Pipeline, PipelineOptions};
//!
//! let pipeline = Pipeline::new(PipelineOptions::default());
//! let rendered = pipeline
//!     .render(&Document::new("intro.md", "# Hello\n\nSome *text*.\n"))
//!     .unwrap();
//! assert_eq!(rendered.title.as_deref(), Some("Hello"));
//! assert!(rendered.html.contains("id=\"hello\""));
//! ```

pub mod bridge;
pub mod directive;
mod document;
mod error;
pub mod fence;
pub mod hast;
mod mask;
pub mod mdast;
mod options;
pub mod parse;
mod pass;
mod pipeline;
pub mod rehype;
pub mod remark;
pub mod serialize;
mod source;

pub use bridge::HandlerMap;
pub use document::{ContentType, Document};
pub use error::{BoxError, PassError, PipelineError};
pub use options::{
    CaptionLabels, CustomBlockDefinition, DEFAULT_MATH_STYLESHEET, DiagramStrategy, PipelineOptions,
    TitleMode,
};
pub use pass::{HtmlPass, MarkdownPass, RunContext, TocEntry};
pub use pipeline::{Pipeline, PipelineBuilder, Rendered};
pub use rehype::{DiagramRenderer, DiagramRequest};
