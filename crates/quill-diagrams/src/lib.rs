//! Diagram rendering via Kroki.
//!
//! [`KrokiRenderer`] implements the renderer's
//! [`DiagramRenderer`](quill_renderer::DiagramRenderer) seam: every diagram
//! of a document is POSTed to a Kroki server and the returned SVG is
//! embedded inline. A document's diagrams are rendered in parallel.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use quill_diagrams::KrokiRenderer;
//! use quill_renderer::{Pipeline, PipelineOptions};
//!
//! let renderer = KrokiRenderer::new("https://kroki.io");
//! let options = PipelineOptions::default().with_diagram_renderer(Arc::new(renderer));
//! let pipeline = Pipeline::new(options);
//! let rendered = pipeline.render_str("```mermaid\ngraph TD; A-->B\n```\n");
//! ```

mod kroki;
mod language;

pub use kroki::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_TIMEOUT, DiagramError, DiagramErrorKind, KrokiRenderer,
    create_agent,
};
pub use language::DiagramLanguage;
