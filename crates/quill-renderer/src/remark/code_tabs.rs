//! `[group:tab]` tokens on code fences.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PassError;
use crate::fence::{TabInfo, consume_tokens};
use crate::mdast::Node;
use crate::pass::{MarkdownPass, RunContext};

use super::names;

static TAB_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]:\s]+):([^\]]+)\]$").expect("invalid tab token regex"));

/// Records tab group membership and removes the token from the meta.
///
/// Grouping adjacent blocks into tabs happens on the HTML tree.
#[derive(Debug, Default)]
pub struct CodeTabs;

impl MarkdownPass for CodeTabs {
    fn name(&self) -> &'static str {
        names::CODE_TABS
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.for_each_code(&mut |code| {
            let mut tab = None;
            let rest = consume_tokens(code.meta.as_deref(), |token| {
                if tab.is_some() {
                    return false;
                }
                let Some(caps) = TAB_TOKEN_RE.captures(token) else {
                    return false;
                };
                tab = Some(TabInfo {
                    group: caps[1].to_owned(),
                    tab: caps[2].trim().to_owned(),
                });
                true
            });
            if tab.is_some() {
                code.meta = rest;
                code.fence.tab = tab;
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdast::NodeValue;
    use crate::remark::test_support::run_pass;
    use pretty_assertions::assert_eq;

    fn code(tree: &Node, index: usize) -> &crate::mdast::Code {
        match &tree.children[index].value {
            NodeValue::Code(code) => code,
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn test_tab_token_consumed() {
        let (tree, _) = run_pass(&CodeTabs, "```js [g1:Java Script] {1}\nx\n```\n");
        let code = code(&tree, 0);
        assert_eq!(
            code.fence.tab,
            Some(TabInfo {
                group: "g1".to_owned(),
                tab: "Java Script".to_owned(),
            })
        );
        assert_eq!(code.meta.as_deref(), Some("{1}"));
    }

    #[test]
    fn test_tab_token_without_language() {
        let (tree, _) = run_pass(&CodeTabs, "``` [g:One]\nplain\n```\n");
        let code = code(&tree, 0);
        assert_eq!(code.lang, None);
        assert_eq!(
            code.fence.tab,
            Some(TabInfo {
                group: "g".to_owned(),
                tab: "One".to_owned(),
            })
        );
        assert_eq!(code.meta, None);
    }

    #[test]
    fn test_meta_without_token_unchanged() {
        let (tree, _) = run_pass(&CodeTabs, "```js [not-a-tab] title=\"a.js\"\nx\n```\n");
        let code = code(&tree, 0);
        assert_eq!(code.fence.tab, None);
        assert_eq!(code.meta.as_deref(), Some("[not-a-tab] title=\"a.js\""));
    }
}
