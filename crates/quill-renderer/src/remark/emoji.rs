//! `:shortcode:` emoji.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::PassError;
use crate::mdast::Node;
use crate::pass::{MarkdownPass, RunContext};

use super::{Descend, map_text, names};

static SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-z0-9_+\-]+):").expect("invalid shortcode regex"));

/// Replaces known shortcodes with their emoji. Unknown ones stay as typed.
#[derive(Debug, Default)]
pub struct Emoji;

impl MarkdownPass for Emoji {
    fn name(&self) -> &'static str {
        names::EMOJI
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        map_text(tree, Descend::All, &mut |text| {
            if !text.contains(':') {
                return None;
            }
            let replaced = SHORTCODE_RE.replace_all(text, |caps: &Captures<'_>| {
                emojis::get_by_shortcode(&caps[1])
                    .map_or_else(|| caps[0].to_owned(), |emoji| emoji.as_str().to_owned())
            });
            (replaced != text).then(|| replaced.into_owned())
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remark::test_support::run_pass;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_shortcode() {
        let (tree, _) = run_pass(&Emoji, "Ship it :rocket:\n");
        assert_eq!(tree.children[0].text_content(), "Ship it \u{1f680}");
    }

    #[test]
    fn test_unknown_shortcode_and_times() {
        let (tree, _) = run_pass(&Emoji, "At 10:30:45 :not_an_emoji_code:\n");
        assert_eq!(tree.children[0].text_content(), "At 10:30:45 :not_an_emoji_code:");
    }

    #[test]
    fn test_code_untouched() {
        let (tree, _) = run_pass(&Emoji, "`:rocket:`\n");
        assert_eq!(tree.children[0].text_content(), ":rocket:");
    }
}
