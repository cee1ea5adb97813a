//! HTML tree passes.
//!
//! These run after the bridge, in the order returned by [`default_passes`]:
//! diagrams and math are rendered first so the highlighter never sees their
//! code blocks, heading ids are assigned before the table of contents and
//! anchors link to them, and utility classes come last so they see every
//! element the other passes created.

mod accessible_emojis;
mod code_tabs;
mod color_swatch;
mod diagrams;
mod external_links;
mod footnote_titles;
mod heading_anchors;
mod heading_ids;
mod highlight;
mod math;
mod toc;
mod utility_classes;

use crate::error::BoxError;
use crate::hast::{self, Element};
use crate::options::PipelineOptions;
use crate::pass::HtmlPass;

pub use accessible_emojis::AccessibleEmojis;
pub use code_tabs::CodeTabs;
pub use color_swatch::ColorSwatch;
pub use diagrams::Diagrams;
pub use external_links::ExternalLinks;
pub use footnote_titles::FootnoteTitles;
pub use heading_anchors::HeadingAnchors;
pub use heading_ids::{HeadingIds, slugify};
pub use highlight::Highlight;
pub use math::MathRender;
pub use toc::Toc;
pub use utility_classes::UtilityClasses;

/// Stable pass names.
pub mod names {
    pub const DIAGRAMS: &str = "diagrams";
    pub const MATH: &str = "math-render";
    pub const HIGHLIGHT: &str = "highlight";
    pub const CODE_TABS: &str = "code-tab-wrapper";
    pub const ACCESSIBLE_EMOJIS: &str = "accessible-emojis";
    pub const EXTERNAL_LINKS: &str = "external-links";
    pub const HEADING_IDS: &str = "heading-ids";
    pub const TOC: &str = "toc";
    pub const HEADING_ANCHORS: &str = "heading-anchors";
    pub const FOOTNOTE_TITLES: &str = "footnote-titles";
    pub const COLOR_SWATCH: &str = "color-swatch";
    pub const UTILITY_CLASSES: &str = "utility-classes";
}

/// One diagram to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRequest {
    /// Position among the document's diagrams.
    pub index: usize,
    /// Fence language, e.g. `mermaid`.
    pub language: String,
    pub source: String,
}

/// Renders diagram source to SVG markup.
///
/// Implementations are shared by every document rendered in parallel, so
/// they must not keep per-document state.
pub trait DiagramRenderer: Send + Sync {
    fn render_svg(&self, request: &DiagramRequest) -> Result<String, BoxError>;

    /// Render every diagram of a document. Results are in request order.
    ///
    /// The default renders one after another; network-backed renderers
    /// override it to render in parallel.
    fn render_batch(&self, requests: &[DiagramRequest]) -> Vec<Result<String, BoxError>> {
        requests.iter().map(|r| self.render_svg(r)).collect()
    }
}

/// The HTML passes enabled by `options`, in order.
#[must_use]
pub fn default_passes(options: &PipelineOptions) -> Vec<Box<dyn HtmlPass>> {
    let mut passes: Vec<Box<dyn HtmlPass>> = vec![
        Box::new(Diagrams::new(options)),
        Box::new(MathRender::new(options.math_stylesheet_href.clone())),
        Box::new(Highlight::new(options)),
        Box::new(CodeTabs),
    ];
    if options.accessible_emojis {
        passes.push(Box::new(AccessibleEmojis));
    }
    passes.push(Box::new(ExternalLinks::new(options)));
    passes.push(Box::new(HeadingIds::new(
        options.heading_suffix_format.clone(),
    )));
    if let Some(heading) = &options.toc_heading {
        passes.push(Box::new(Toc::new(heading.as_str())));
    }
    if options.heading_anchors {
        passes.push(Box::new(HeadingAnchors));
    }
    passes.push(Box::new(FootnoteTitles::new(
        options.footnote_backref_title.clone(),
    )));
    passes.push(Box::new(ColorSwatch));
    if options.utility_classes {
        passes.push(Box::new(UtilityClasses));
    }
    passes
}

/// Language of a `<pre><code class="language-x">` block.
pub(crate) fn code_language(pre: &Element) -> Option<String> {
    pre.child_element("code")?
        .classes()
        .into_iter()
        .find_map(|class| class.strip_prefix("language-").map(str::to_owned))
}

/// Replace elements for which `f` returns `Some`, parents before children.
///
/// Replacements are not descended into.
pub(crate) fn replace_elements<F>(tree: &mut hast::Node, f: &mut F) -> Result<(), crate::error::PassError>
where
    F: FnMut(&mut Element) -> Result<Option<hast::Node>, crate::error::PassError>,
{
    let Some(children) = tree.children_mut() else {
        return Ok(());
    };
    for child in children.iter_mut() {
        if let hast::Node::Element(el) = child
            && let Some(replacement) = f(el)?
        {
            *child = replacement;
            continue;
        }
        replace_elements(child, f)?;
    }
    Ok(())
}
