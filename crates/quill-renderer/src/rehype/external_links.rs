//! External link decoration.

use url::{Origin, Url};

use crate::error::PassError;
use crate::hast;
use crate::options::PipelineOptions;
use crate::pass::{HtmlPass, RunContext};

use super::names;

/// Adds `target` and `rel` tokens to links leaving the site.
///
/// A link is external when its `href` is an absolute `http(s)` URL (or a
/// protocol-relative `//host` one) whose origin differs from the site URL.
/// Relative and fragment links are never touched. Without a site URL every
/// absolute link is external.
#[derive(Debug)]
pub struct ExternalLinks {
    site: Option<Origin>,
    rel: Vec<String>,
    target: Option<String>,
}

impl ExternalLinks {
    #[must_use]
    pub fn new(options: &PipelineOptions) -> Self {
        let site = options.site_url.as_deref().and_then(|raw| match Url::parse(raw) {
            Ok(url) => Some(url.origin()),
            Err(e) => {
                tracing::warn!(site_url = %raw, error = %e, "Ignoring unparseable site URL");
                None
            }
        });
        Self {
            site,
            rel: options.external_link_rel.clone(),
            target: options.external_link_target.clone(),
        }
    }

    fn is_external(&self, href: &str) -> bool {
        let parsed = if href.starts_with("//") {
            Url::parse(&format!("https:{href}"))
        } else {
            Url::parse(href)
        };
        let Ok(url) = parsed else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        self.site.as_ref().is_none_or(|site| url.origin() != *site)
    }
}

impl HtmlPass for ExternalLinks {
    fn name(&self) -> &'static str {
        names::EXTERNAL_LINKS
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.visit_elements_mut(&mut |el, _| {
            if el.tag != "a" {
                return;
            }
            let Some(href) = el.attr("href") else {
                return;
            };
            if !self.is_external(&href) {
                return;
            }
            if let Some(target) = &self.target
                && !el.has_attr("target")
            {
                el.set_attr("target", target);
            }
            for token in &self.rel {
                el.tokens_mut("rel").add(token);
            }
        });
        Ok(())
    }
}
