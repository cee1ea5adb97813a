//! Typographic replacements: arrows, fractions, `+-` and `2 x 3`.
//!
//! Rules run in order and can be switched off by name.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::PassError;
use crate::mdast::Node;
use crate::pass::{MarkdownPass, RunContext};

use super::{Descend, map_text, names};

/// Names of all replacement rules, in the order they run.
pub const REPLACEMENT_RULES: [&str; 11] = [
    "arrow_double_lr",
    "arrow_double_right",
    "arrow_double_left",
    "arrow_lr",
    "arrow_right",
    "arrow_left",
    "plusminus",
    "onehalf",
    "onequarter",
    "threequarters",
    "multiplication",
];

struct Rule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("invalid replacement regex"),
            replacement,
        }
    }
}

// Lookahead is not available, so "not followed by" rules capture the next
// character and put it back.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("arrow_double_lr", r"<==>", "\u{21d4}"),
        Rule::new("arrow_double_right", r"==>", "\u{21d2}"),
        Rule::new("arrow_double_left", r"<==([^=]|$)", "\u{21d0}${1}"),
        Rule::new("arrow_lr", "<(?:--|\u{2014})>", "\u{2194}"),
        Rule::new("arrow_right", "(?:--|\u{2014})>", "\u{2192}"),
        Rule::new("arrow_left", r"<--([^-]|$)", "\u{2190}${1}"),
        Rule::new("plusminus", r"\+-", "\u{b1}"),
        Rule::new("onehalf", r"\b1/2\b", "\u{bd}"),
        Rule::new("onequarter", r"\b1/4\b", "\u{bc}"),
        Rule::new("threequarters", r"\b3/4\b", "\u{be}"),
        Rule::new("multiplication", r"(?i)\b(\d+)\s*x\s*(\d+)\b", "${1} \u{d7} ${2}"),
    ]
});

/// Applies the enabled replacement rules to text nodes.
#[derive(Debug, Default)]
pub struct Replacements {
    disabled: Vec<String>,
}

impl Replacements {
    #[must_use]
    pub fn new(disabled: &[String]) -> Self {
        Self {
            disabled: disabled.to_vec(),
        }
    }

    fn apply(&self, text: &str) -> String {
        let mut out = text.to_owned();
        for rule in RULES.iter() {
            if self.disabled.iter().any(|d| d == rule.name) {
                continue;
            }
            if let Cow::Owned(replaced) = rule.pattern.replace_all(&out, rule.replacement) {
                out = replaced;
            }
        }
        out
    }
}

impl MarkdownPass for Replacements {
    fn name(&self) -> &'static str {
        names::REPLACEMENTS
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        map_text(tree, Descend::All, &mut |text| {
            let replaced = self.apply(text);
            (replaced != text).then_some(replaced)
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rule_names_match_rules() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names, REPLACEMENT_RULES);
    }

    #[test]
    fn test_arrows() {
        let pass = Replacements::default();
        assert_eq!(
            pass.apply("a <==> b ==> c <== d"),
            "a \u{21d4} b \u{21d2} c \u{21d0} d"
        );
        assert_eq!(
            pass.apply("a <--> b --> c <-- d"),
            "a \u{2194} b \u{2192} c \u{2190} d"
        );
        assert_eq!(pass.apply("<==="), "<===");
    }

    #[test]
    fn test_numbers() {
        let pass = Replacements::default();
        assert_eq!(
            pass.apply("1/2 cup, 3/4 done, 1/4 left"),
            "\u{bd} cup, \u{be} done, \u{bc} left"
        );
        assert_eq!(pass.apply("a 1920x1080 screen"), "a 1920 \u{d7} 1080 screen");
        assert_eq!(pass.apply("+-5"), "\u{b1}5");
        assert_eq!(pass.apply("11/2"), "11/2");
    }

    #[test]
    fn test_disabled_rule() {
        let pass = Replacements::new(&["multiplication".to_owned()]);
        assert_eq!(pass.apply("2x3"), "2x3");
    }
}
