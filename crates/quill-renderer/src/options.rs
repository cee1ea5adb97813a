//! Pipeline configuration.
//!
//! Options are built once and shared read-only by every pass and every
//! document. Nothing in the pipeline mutates them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::rehype::DiagramRenderer;

/// Whether a custom block takes a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleMode {
    Required,
    Optional,
    None,
}

impl FromStr for TitleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "required" => Ok(Self::Required),
            "optional" => Ok(Self::Optional),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown title mode '{other}' (expected required, optional or none)"
            )),
        }
    }
}

/// Shape of one `[[name | title]]` custom block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomBlockDefinition {
    pub title: TitleMode,
    /// Render as `<details>`/`<summary>`, overriding the wrapper and title tags.
    pub details: bool,
    pub wrapper_tag: String,
    pub title_tag: String,
    pub content_tag: String,
    /// Extra wrapper classes after `custom-block`.
    pub classes: Vec<String>,
    pub default_title: Option<String>,
}

impl CustomBlockDefinition {
    #[must_use]
    pub fn new(title: TitleMode) -> Self {
        Self {
            title,
            details: false,
            wrapper_tag: "div".to_owned(),
            title_tag: "div".to_owned(),
            content_tag: "div".to_owned(),
            classes: Vec::new(),
            default_title: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self) -> Self {
        self.details = true;
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    #[must_use]
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = Some(title.into());
        self
    }

    /// `(wrapper, title, content)` tag names after applying `details`.
    #[must_use]
    pub fn tags(&self) -> (&str, &str, &str) {
        if self.details {
            ("details", "summary", &self.content_tag)
        } else {
            (&self.wrapper_tag, &self.title_tag, &self.content_tag)
        }
    }
}

/// How diagram code blocks are rendered.
///
/// Defaults to [`DiagramStrategy::Pre`], which needs no renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiagramStrategy {
    /// Render to inline SVG at build time through a [`DiagramRenderer`].
    InlineSvg,
    /// Keep the source in `<pre class="mermaid">` for client-side rendering.
    #[default]
    Pre,
}

impl FromStr for DiagramStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline-svg" => Ok(Self::InlineSvg),
            "pre" | "pre-mermaid" => Ok(Self::Pre),
            other => Err(format!(
                "unknown diagram strategy '{other}' (expected inline-svg or pre)"
            )),
        }
    }
}

/// Labels that turn a following paragraph into a caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLabels {
    pub table: String,
    pub code: String,
    pub image: String,
    pub quote: String,
}

impl Default for CaptionLabels {
    fn default() -> Self {
        Self {
            table: "Table:".to_owned(),
            code: "Code:".to_owned(),
            image: "Figure:".to_owned(),
            quote: "Source:".to_owned(),
        }
    }
}

/// MathML font stylesheet linked from documents containing math.
pub const DEFAULT_MATH_STYLESHEET: &str =
    "https://cdn.jsdelivr.net/npm/temml/dist/Temml-Local.css";

/// Options for every pass of the pipeline.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Own site URL; links to other origins are external.
    pub site_url: Option<String>,
    /// Recognise `[group:tab]` fence tokens.
    pub tab_group_syntax: bool,
    /// Accept `$x$` as inline math. Off: only `$$x$$` is math.
    pub single_dollar_math: bool,
    pub diagram_strategy: DiagramStrategy,
    /// Fence languages treated as diagrams.
    pub diagram_languages: Vec<String>,
    pub diagram_renderer: Option<Arc<dyn DiagramRenderer>>,
    /// `rel` tokens added to external links.
    pub external_link_rel: Vec<String>,
    /// `target` for external links; `None` leaves it unset.
    pub external_link_target: Option<String>,
    /// Suffix appended to duplicate heading slugs, `{n}` is the counter.
    pub heading_suffix_format: String,
    pub heading_anchors: bool,
    pub custom_blocks: BTreeMap<String, CustomBlockDefinition>,
    pub caption_labels: CaptionLabels,
    /// Highlighter language aliases, e.g. `js` → `javascript`.
    pub lang_aliases: HashMap<String, String>,
    /// Languages the highlighter leaves alone.
    pub highlight_exclude: Vec<String>,
    pub smartypants: bool,
    pub replacements: bool,
    /// Replacement rules switched off by name.
    pub disabled_replacements: Vec<String>,
    pub emoji: bool,
    /// Wrap emoji in `role="img"` spans labelled with their name.
    pub accessible_emojis: bool,
    pub linkify: bool,
    /// `{#id .class key=value}` after inline elements and bracketed spans.
    pub attributes: bool,
    /// `[center]` ... `[/center]` alignment tags.
    pub align: bool,
    /// Render soft line breaks as `<br>`.
    pub breaks: bool,
    /// Heading text, matched case-insensitively, after which a table of
    /// contents is inserted. `None` disables it.
    pub toc_heading: Option<String>,
    pub utility_classes: bool,
    pub footnote_label: String,
    /// Back-reference title, `{n}` is the footnote number.
    pub footnote_backref_title: String,
    /// Stylesheet linked once when a document contains math; `None` links
    /// nothing.
    pub math_stylesheet_href: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            site_url: None,
            tab_group_syntax: true,
            single_dollar_math: false,
            diagram_strategy: DiagramStrategy::default(),
            diagram_languages: vec!["mermaid".to_owned()],
            diagram_renderer: None,
            external_link_rel: vec!["noopener".to_owned(), "noreferrer".to_owned()],
            external_link_target: Some("_blank".to_owned()),
            heading_suffix_format: "-{n}".to_owned(),
            heading_anchors: true,
            custom_blocks: default_custom_blocks(),
            caption_labels: CaptionLabels::default(),
            lang_aliases: [("js", "javascript"), ("ts", "typescript"), ("md", "markdown")]
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            highlight_exclude: vec!["mermaid".to_owned(), "math".to_owned()],
            smartypants: true,
            replacements: true,
            disabled_replacements: Vec::new(),
            emoji: true,
            accessible_emojis: true,
            linkify: true,
            attributes: true,
            align: true,
            breaks: true,
            toc_heading: Some("contents".to_owned()),
            utility_classes: true,
            footnote_label: "Footnotes".to_owned(),
            footnote_backref_title: "Return to footnote {n}".to_owned(),
            math_stylesheet_href: Some(DEFAULT_MATH_STYLESHEET.to_owned()),
        }
    }
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("site_url", &self.site_url)
            .field("tab_group_syntax", &self.tab_group_syntax)
            .field("single_dollar_math", &self.single_dollar_math)
            .field("diagram_strategy", &self.diagram_strategy)
            .field("diagram_languages", &self.diagram_languages)
            .field("diagram_renderer", &self.diagram_renderer.is_some())
            .field("heading_suffix_format", &self.heading_suffix_format)
            .field("custom_blocks", &self.custom_blocks.keys())
            .finish_non_exhaustive()
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }

    /// Render diagrams at build time through `renderer`.
    ///
    /// Switches the strategy to [`DiagramStrategy::InlineSvg`].
    #[must_use]
    pub fn with_diagram_renderer(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.diagram_renderer = Some(renderer);
        self.diagram_strategy = DiagramStrategy::InlineSvg;
        self
    }

    #[must_use]
    pub fn with_diagram_strategy(mut self, strategy: DiagramStrategy) -> Self {
        self.diagram_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_single_dollar_math(mut self, enabled: bool) -> Self {
        self.single_dollar_math = enabled;
        self
    }

    #[must_use]
    pub fn with_custom_block(
        mut self,
        name: impl Into<String>,
        definition: CustomBlockDefinition,
    ) -> Self {
        self.custom_blocks.insert(name.into(), definition);
        self
    }
}

/// Built-in custom blocks: `details` plus callout styles.
fn default_custom_blocks() -> BTreeMap<String, CustomBlockDefinition> {
    let mut blocks = BTreeMap::new();
    blocks.insert(
        "details".to_owned(),
        CustomBlockDefinition::new(TitleMode::Optional)
            .with_details()
            .with_default_title("Details"),
    );
    for name in ["note", "tip", "warning", "danger"] {
        blocks.insert(
            name.to_owned(),
            CustomBlockDefinition::new(TitleMode::Optional).with_class(name),
        );
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PipelineOptions::default();
        assert!(!options.single_dollar_math);
        assert!(options.tab_group_syntax);
        assert_eq!(options.heading_suffix_format, "-{n}");
        assert_eq!(options.external_link_rel, vec!["noopener", "noreferrer"]);
        assert!(options.custom_blocks.contains_key("details"));
        assert_eq!(options.diagram_strategy, DiagramStrategy::Pre);
        assert!(options.diagram_renderer.is_none());
        assert_eq!(options.math_stylesheet_href.as_deref(), Some(DEFAULT_MATH_STYLESHEET));
    }

    #[test]
    fn test_details_tags_override() {
        let def = CustomBlockDefinition::new(TitleMode::Required).with_details();
        assert_eq!(def.tags(), ("details", "summary", "div"));
        let def = CustomBlockDefinition::new(TitleMode::None);
        assert_eq!(def.tags(), ("div", "div", "div"));
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("inline-svg".parse(), Ok(DiagramStrategy::InlineSvg));
        assert_eq!("pre".parse(), Ok(DiagramStrategy::Pre));
        assert!("svg".parse::<DiagramStrategy>().is_err());
        assert_eq!("optional".parse(), Ok(TitleMode::Optional));
    }
}
