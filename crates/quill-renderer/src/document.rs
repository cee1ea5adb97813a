//! Documents handed to the pipeline.

use std::path::{Path, PathBuf};

/// Source flavour of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentType {
    #[default]
    Markdown,
    /// MDX: ESM statements and `{expression}` blocks are kept verbatim.
    Mdx,
}

impl ContentType {
    /// Guess the content type from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mdx") => Self::Mdx,
            _ => Self::Markdown,
        }
    }
}

/// A single unit of work: one markdown source rendered to one HTML string.
#[derive(Debug, Clone)]
pub struct Document {
    /// Identifier used in errors and logs.
    pub id: String,
    pub path: Option<PathBuf>,
    /// Markdown body with any front matter removed.
    pub source: String,
    /// Raw front matter, never interpreted.
    pub front_matter: Option<String>,
    pub content_type: ContentType,
}

impl Document {
    /// Create a markdown document, splitting off `---` front matter.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        let (front_matter, body) = split_front_matter(&source.into());
        Self {
            id: id.into(),
            path: None,
            source: body,
            front_matter,
            content_type: ContentType::Markdown,
        }
    }

    /// Create a document for a file, deriving id and content type from the path.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        let path = path.into();
        let mut doc = Self::new(path.display().to_string(), source);
        doc.content_type = ContentType::from_path(&path);
        doc.path = Some(path);
        doc
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }
}

/// Split `---` delimited front matter from the start of `source`.
///
/// Returns `(front_matter, body)`. Without a closing delimiter the whole
/// input is body.
fn split_front_matter(source: &str) -> (Option<String>, String) {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return (None, source.to_owned());
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let front = rest[..offset].to_owned();
            let body = rest[offset + line.len()..].to_owned();
            return (Some(front), body);
        }
        offset += line.len();
    }

    (None, source.to_owned())
}
