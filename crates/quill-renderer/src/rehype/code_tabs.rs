//! Tabbed code groups.
//!
//! A run of sibling `<pre data-group>` blocks with the same group, separated
//! by nothing but whitespace, becomes one `div.code-tabs` with a tab bar and
//! one panel per block. Blocks of the same group that are not adjacent end
//! up in separate containers.

use crate::error::PassError;
use crate::hast::{self, Element};
use crate::pass::{HtmlPass, RunContext};

use super::names;

/// Wraps adjacent tabbed code blocks in a tab container.
#[derive(Debug, Default)]
pub struct CodeTabs;

fn tab_group(node: &hast::Node) -> Option<String> {
    let el = node.as_element()?;
    if el.tag != "pre" {
        return None;
    }
    el.attr("data-group")
}

impl HtmlPass for CodeTabs {
    fn name(&self) -> &'static str {
        names::CODE_TABS
    }

    fn run(&self, tree: &mut hast::Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let mut containers = 0;
        tree.rewrite_children(&mut |children| {
            let mut i = 0;
            while i < children.len() {
                let Some(group) = tab_group(&children[i]) else {
                    i += 1;
                    continue;
                };
                let mut last = i;
                for (j, child) in children.iter().enumerate().skip(i + 1) {
                    if child.is_blank_text() {
                        continue;
                    }
                    if tab_group(child).as_ref() != Some(&group) {
                        break;
                    }
                    last = j;
                }

                let members: Vec<Element> = children
                    .drain(i..=last)
                    .filter_map(|node| match node {
                        hast::Node::Element(el) => Some(el),
                        _ => None,
                    })
                    .collect();
                children.insert(i, container(containers, &group, members).into());
                containers += 1;
                i += 1;
            }
        });
        Ok(())
    }
}

fn container(n: usize, group: &str, members: Vec<Element>) -> Element {
    let mut buttons = Vec::new();
    let mut panels = Vec::new();
    for (i, mut pre) in members.into_iter().enumerate() {
        pre.remove_attr("data-group");
        let label = match pre.remove_attr("data-tab") {
            Some(hast::AttrValue::Str(tab)) => tab,
            _ => format!("Tab {}", i + 1),
        };
        let tab_id = format!("code-tabs-{n}-tab-{i}");
        let panel_id = format!("code-tabs-{n}-panel-{i}");
        let selected = i == 0;

        buttons.push(hast::Node::text("\n"));
        buttons.push(
            Element::new("button")
                .with_attr("type", "button")
                .with_attr("role", "tab")
                .with_attr("id", &tab_id)
                .with_attr("aria-selected", if selected { "true" } else { "false" })
                .with_attr("aria-controls", &panel_id)
                .with_attr("tabindex", if selected { "0" } else { "-1" })
                .with_text(label.clone())
                .into(),
        );

        let mut panel = Element::new("div")
            .with_class("code-tab")
            .with_attr("role", "tabpanel")
            .with_attr("id", panel_id)
            .with_attr("aria-labelledby", tab_id)
            .with_attr("data-tab", label);
        if !selected {
            panel.set_flag("hidden");
        }
        panels.push(hast::Node::text("\n"));
        panels.push(panel.with_child(pre).into());
    }
    buttons.push(hast::Node::text("\n"));

    let tablist = Element::new("div")
        .with_class("code-tabs-list")
        .with_attr("role", "tablist")
        .with_children(buttons);
    let mut children = vec![hast::Node::text("\n"), tablist.into()];
    children.extend(panels);
    children.push(hast::Node::text("\n"));

    Element::new("div")
        .with_class("code-tabs")
        .with_attr("data-group", group)
        .with_children(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rehype::test_support::render_with;

    #[test]
    fn test_adjacent_blocks_grouped() {
        let html = render_with(
            &CodeTabs,
            "```js [g1:JavaScript]\nlet a;\n```\n\n```ts [g1:TypeScript]\nlet a: number;\n```\n",
        );
        assert_eq!(html.matches("class=\"code-tabs\"").count(), 1);
        assert!(html.starts_with("<div class=\"code-tabs\" data-group=\"g1\">"));
        assert!(html.contains("data-tab=\"JavaScript\""));
        assert!(html.contains("data-tab=\"TypeScript\""));
        assert!(html.contains(">JavaScript</button>"));
        assert!(!html.contains("[g1:"));
        assert!(!html.contains("<pre data-group"));
        assert_eq!(html.matches(" hidden>").count(), 1);
    }

    #[test]
    fn test_separated_blocks_not_merged() {
        let html = render_with(
            &CodeTabs,
            "```js [g1:A]\na\n```\n\nBetween.\n\n```js [g1:B]\nb\n```\n",
        );
        assert_eq!(html.matches("class=\"code-tabs\"").count(), 2);
        assert!(html.contains("id=\"code-tabs-1-panel-0\""));
    }

    #[test]
    fn test_different_groups_split() {
        let html = render_with(
            &CodeTabs,
            "```js [g1:A]\na\n```\n\n```js [g2:B]\nb\n```\n",
        );
        assert!(html.contains("data-group=\"g1\""));
        assert!(html.contains("data-group=\"g2\""));
    }

    #[test]
    fn test_untagged_blocks_untouched() {
        let html = render_with(&CodeTabs, "```js\na\n```\n");
        assert_eq!(html, "<pre><code class=\"language-js\">a\n</code></pre>");
    }
}
