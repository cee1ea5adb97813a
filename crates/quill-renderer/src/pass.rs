//! Pass traits and per-run state.

use crate::document::Document;
use crate::error::PassError;
use crate::{hast, mdast};

/// Heading collected while assigning ids.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    pub id: String,
}

/// State of one document run.
///
/// Created fresh for every document, so nothing a pass records here can
/// leak into another document or another thread.
#[derive(Debug)]
pub struct RunContext<'a> {
    pub document: &'a Document,
    pub warnings: Vec<String>,
    pub headings: Vec<TocEntry>,
}

impl<'a> RunContext<'a> {
    #[must_use]
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            warnings: Vec::new(),
            headings: Vec::new(),
        }
    }

    /// Markdown source of the document.
    #[must_use]
    pub fn source(&self) -> &'a str {
        &self.document.source
    }

    /// Record a non-fatal problem and log it.
    pub fn warn(&mut self, message: String) {
        tracing::warn!(document = %self.document.id, "{message}");
        self.warnings.push(message);
    }
}

/// A rewrite of the markdown tree.
pub trait MarkdownPass: Send + Sync {
    /// Stable name used for ordering, substitution and errors.
    fn name(&self) -> &'static str;

    /// Transform the tree in place.
    fn run(&self, tree: &mut mdast::Node, cx: &mut RunContext<'_>) -> Result<(), PassError>;
}

/// A rewrite of the HTML tree.
pub trait HtmlPass: Send + Sync {
    /// Stable name used for ordering, substitution and errors.
    fn name(&self) -> &'static str;

    /// Transform the tree in place.
    fn run(&self, tree: &mut hast::Node, cx: &mut RunContext<'_>) -> Result<(), PassError>;
}
