//! Accessible names for emoji.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PassError;
use crate::hast::{self, Element};
use crate::pass::{HtmlPass, RunContext};

use super::names;

/// One emoji: a presentation character, or a text character forced to
/// emoji style, with optional skin tone and zero-width-joined parts. Flags
/// are pairs of regional indicators.
static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\p{Regional_Indicator}{2}|(?:\p{Emoji_Presentation}|\p{Extended_Pictographic}\x{FE0F})\p{Emoji_Modifier}?(?:\x{200D}\p{Extended_Pictographic}\x{FE0F}?\p{Emoji_Modifier}?)*",
    )
    .expect("invalid emoji regex")
});

/// Elements whose text is left alone.
const SKIPPED: [&str; 5] = ["code", "pre", "script", "style", "svg"];

/// Wraps known emoji in `<span role="img" aria-label="name">`.
///
/// Emoji already inside a `role="img"` element, code or raw markup are
/// skipped, as are characters the emoji table does not know.
#[derive(Debug, Default)]
pub struct AccessibleEmojis;

impl HtmlPass for AccessibleEmojis {
    fn name(&self) -> &'static str {
        names::ACCESSIBLE_EMOJIS
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        if let Some(children) = tree.children_mut() {
            label_children(children);
        }
        Ok(())
    }
}

fn skipped(el: &Element) -> bool {
    SKIPPED.contains(&el.tag.as_str()) || el.attr("role").as_deref() == Some("img")
}

fn label_children(children: &mut Vec<hast::Node>) {
    let mut i = 0;
    while i < children.len() {
        let split = match &mut children[i] {
            hast::Node::Text(text) => label_text(text),
            hast::Node::Element(el) if !skipped(el) => {
                label_children(&mut el.children);
                None
            }
            _ => None,
        };
        match split {
            Some(nodes) => {
                let count = nodes.len();
                children.splice(i..=i, nodes);
                i += count;
            }
            None => i += 1,
        }
    }
}

fn emoji_name(found: &str) -> Option<&'static str> {
    emojis::get(found)
        .or_else(|| emojis::get(found.trim_end_matches('\u{fe0f}')))
        .map(emojis::Emoji::name)
}

/// Text split around labelled emoji, or `None` when it holds none.
fn label_text(text: &str) -> Option<Vec<hast::Node>> {
    if text.is_ascii() {
        return None;
    }
    let mut out = Vec::new();
    let mut last = 0;
    for found in EMOJI_RE.find_iter(text) {
        let Some(name) = emoji_name(found.as_str()) else {
            continue;
        };
        if found.start() > last {
            out.push(hast::Node::text(&text[last..found.start()]));
        }
        out.push(
            Element::new("span")
                .with_attr("role", "img")
                .with_attr("aria-label", name)
                .with_text(found.as_str())
                .into(),
        );
        last = found.end();
    }
    if out.is_empty() {
        return None;
    }
    if last < text.len() {
        out.push(hast::Node::text(&text[last..]));
    }
    Some(out)
}
