//! Standard handlers.

use crate::hast::{self, Element, ElementData};
use crate::mdast::{Align, Directive, Node, NodeKind, NodeValue};
use crate::parse::parse_inline_fragment;

use super::footnotes::note_id;
use super::{Bridge, HandlerMap};

type Out = Vec<hast::Node>;

pub(super) fn register_core(map: &mut HandlerMap) {
    map.register(NodeKind::Root, root);
    map.register(NodeKind::Paragraph, |b, n| wrap_inline(b, n, "p"));
    map.register(NodeKind::Heading, heading);
    map.register(NodeKind::ThematicBreak, |_, _| one(Element::new("hr")));
    map.register(NodeKind::Blockquote, blockquote);
    map.register(NodeKind::List, list);
    map.register(NodeKind::ListItem, list_item);
    map.register(NodeKind::Code, code);
    map.register(NodeKind::Html, raw);
    map.register(NodeKind::Text, text);
    map.register(NodeKind::Emphasis, |b, n| wrap_inline(b, n, "em"));
    map.register(NodeKind::Strong, |b, n| wrap_inline(b, n, "strong"));
    map.register(NodeKind::Delete, |b, n| wrap_inline(b, n, "del"));
    map.register(NodeKind::InlineCode, inline_code);
    map.register(NodeKind::Break, |_, _| {
        vec![Element::new("br").into(), hast::Node::text("\n")]
    });
    map.register(NodeKind::Link, link);
    map.register(NodeKind::Image, image);
    map.register(NodeKind::Table, table);
    map.register(NodeKind::TableRow, |b, n| table_row(b, n, &[]));
    map.register(NodeKind::TableCell, |b, n| wrap_inline(b, n, "td"));
    map.register(NodeKind::FootnoteReference, footnote_reference);
    // Rendered in the footnote section instead.
    map.register(NodeKind::FootnoteDefinition, |_, _| Vec::new());
    map.register(NodeKind::DefinitionList, |b, n| wrap_blocks(b, n, "dl"));
    map.register(NodeKind::DefinitionTerm, |b, n| wrap_flow(b, n, "dt"));
    map.register(NodeKind::DefinitionDescription, |b, n| wrap_flow(b, n, "dd"));
    map.register(NodeKind::Superscript, |b, n| wrap_inline(b, n, "sup"));
    map.register(NodeKind::Subscript, |b, n| wrap_inline(b, n, "sub"));
}

pub(super) fn register_extensions(map: &mut HandlerMap) {
    map.register(NodeKind::Mark, |b, n| wrap_inline(b, n, "mark"));
    map.register(NodeKind::Span, |b, n| wrap_inline(b, n, "span"));
    map.register(NodeKind::Division, |b, n| wrap_blocks(b, n, "div"));
    map.register(NodeKind::Abbr, abbr);
    map.register(NodeKind::InlineMath, inline_math);
    map.register(NodeKind::Math, math);
    map.register(NodeKind::Figure, |b, n| wrap_blocks(b, n, "figure"));
    map.register(NodeKind::FigCaption, |b, n| wrap_inline(b, n, "figcaption"));
    map.register(NodeKind::GridTable, grid_table);
    map.register(NodeKind::ContainerDirective, container_directive);
    map.register(NodeKind::LeafDirective, leaf_directive);
    map.register(NodeKind::TextDirective, text_directive);
    // Tag and attributes come from the node's hints.
    map.register(NodeKind::Embed, |b, n| wrap_inline(b, n, "div"));
    map.register(NodeKind::CustomBlock, |b, n| wrap_blocks(b, n, "div"));
    map.register(NodeKind::CustomBlockTitle, |b, n| wrap_inline(b, n, "div"));
    map.register(NodeKind::CustomBlockBody, |b, n| wrap_blocks(b, n, "div"));
    map.register(NodeKind::MdxEsm, raw);
    map.register(NodeKind::MdxExpression, raw);
}

fn one(el: Element) -> Out {
    vec![el.into()]
}

fn wrap_inline(bridge: &mut Bridge<'_>, node: &Node, tag: &str) -> Out {
    one(Element::new(tag).with_children(bridge.inline(node)))
}

fn wrap_blocks(bridge: &mut Bridge<'_>, node: &Node, tag: &str) -> Out {
    one(Element::new(tag).with_children(block_content(bridge, node)))
}

/// Inline content stays on one line, block content gets separators.
fn wrap_flow(bridge: &mut Bridge<'_>, node: &Node, tag: &str) -> Out {
    let has_blocks = node.children.iter().any(|c| {
        matches!(
            c.value,
            NodeValue::Paragraph | NodeValue::List { .. } | NodeValue::Code(_) | NodeValue::Table { .. }
        )
    });
    if has_blocks {
        wrap_blocks(bridge, node, tag)
    } else {
        wrap_inline(bridge, node, tag)
    }
}

/// Block children with leading and trailing newlines, like
/// `<blockquote>\n<p>..</p>\n</blockquote>`.
fn block_content(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let mut children = bridge.blocks(node);
    if !children.is_empty() {
        children.insert(0, hast::Node::text("\n"));
        children.push(hast::Node::text("\n"));
    }
    children
}

fn root(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    bridge.blocks(node)
}

fn raw(_: &mut Bridge<'_>, node: &Node) -> Out {
    match &node.value {
        NodeValue::Html(html) | NodeValue::MdxEsm(html) | NodeValue::MdxExpression(html) => {
            vec![hast::Node::Raw(html.trim_end_matches('\n').to_owned())]
        }
        _ => Vec::new(),
    }
}

fn text(_: &mut Bridge<'_>, node: &Node) -> Out {
    match &node.value {
        NodeValue::Text(text) => vec![hast::Node::text(text.clone())],
        _ => Vec::new(),
    }
}

fn heading(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::Heading { depth, id, classes } = &node.value else {
        return Vec::new();
    };
    let mut el = Element::new(format!("h{}", (*depth).clamp(1, 6))).with_children(bridge.inline(node));
    if let Some(id) = id {
        el.set_attr("id", id);
    }
    for class in classes {
        el.add_class(class);
    }
    one(el)
}

fn blockquote(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::Blockquote { alert } = &node.value else {
        return Vec::new();
    };
    let mut children = block_content(bridge, node);
    let mut el = Element::new("blockquote");
    if let Some(alert) = alert {
        el.add_class("markdown-alert");
        el.add_class(&format!("markdown-alert-{alert}"));
        let mut title = alert.clone();
        if let Some(first) = title.get_mut(..1) {
            first.make_ascii_uppercase();
        }
        let title = Element::new("p")
            .with_class("markdown-alert-title")
            .with_text(title);
        children.insert(0, hast::Node::text("\n"));
        children.insert(1, title.into());
    }
    one(el.with_children(children))
}

fn list(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::List { ordered, start } = &node.value else {
        return Vec::new();
    };
    let mut el = Element::new(if *ordered { "ol" } else { "ul" });
    if *ordered
        && let Some(start) = start
        && *start != 1
    {
        el.set_attr("start", start.to_string());
    }
    let has_tasks = node
        .children
        .iter()
        .any(|item| matches!(item.value, NodeValue::ListItem { checked: Some(_), .. }));
    if has_tasks {
        el.add_class("contains-task-list");
    }
    one(el.with_children(block_content(bridge, node)))
}

fn list_item(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::ListItem { checked, spread } = &node.value else {
        return Vec::new();
    };

    let mut children: Out = Vec::new();
    if *spread {
        children = block_content(bridge, node);
    } else {
        // Tight items render paragraph content without `<p>`.
        for (i, child) in node.children.iter().enumerate() {
            if i > 0 {
                children.push(hast::Node::text("\n"));
            }
            if matches!(child.value, NodeValue::Paragraph) && child.data.is_empty() {
                children.extend(bridge.inline(child));
            } else {
                children.extend(bridge.convert(child));
            }
        }
    }

    let mut el = Element::new("li");
    if let Some(checked) = checked {
        el.add_class("task-list-item");
        let mut input = Element::new("input")
            .with_attr("type", "checkbox")
            .with_flag("disabled");
        if *checked {
            input.set_flag("checked");
        }
        let paragraph = if *spread {
            children
                .iter()
                .position(|n| n.as_element().is_some())
                .filter(|&i| children[i].as_element().is_some_and(|el| el.tag == "p"))
        } else {
            None
        };
        let checkbox = [input.into(), hast::Node::text(" ")];
        match paragraph.and_then(|i| children[i].as_element_mut()) {
            Some(p) => {
                p.children.splice(0..0, checkbox);
            }
            None => {
                children.splice(0..0, checkbox);
            }
        }
    }
    one(el.with_children(children))
}

fn code(_: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::Code(code) = &node.value else {
        return Vec::new();
    };
    let mut inner = Element::new("code");
    if let Some(lang) = &code.lang {
        inner.add_class(&format!("language-{lang}"));
    }
    let inner = inner.with_text(code.value.clone());

    let mut pre = Element::new("pre").with_child(inner);
    if let Some(meta) = &code.meta {
        pre.set_attr("data-meta", meta);
    }
    if let Some(tab) = &code.fence.tab {
        pre.set_attr("data-group", &tab.group);
        pre.set_attr("data-tab", &tab.tab);
    }
    pre.data = Some(ElementData::Fence(Box::new(code.fence.clone())));
    one(pre)
}

fn inline_code(_: &mut Bridge<'_>, node: &Node) -> Out {
    match &node.value {
        NodeValue::InlineCode(code) => one(Element::new("code").with_text(code.clone())),
        _ => Vec::new(),
    }
}

fn link(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::Link { url, title } = &node.value else {
        return Vec::new();
    };
    let mut el = Element::new("a").with_attr("href", url);
    if !title.is_empty() {
        el.set_attr("title", title);
    }
    one(el.with_children(bridge.inline(node)))
}

fn image(_: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::Image { url, title, alt } = &node.value else {
        return Vec::new();
    };
    let mut el = Element::new("img").with_attr("src", url).with_attr("alt", alt);
    if !title.is_empty() {
        el.set_attr("title", title);
    }
    one(el)
}

fn abbr(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::Abbr { title } = &node.value else {
        return Vec::new();
    };
    one(
        Element::new("abbr")
            .with_attr("title", title)
            .with_children(bridge.inline(node)),
    )
}

fn inline_math(_: &mut Bridge<'_>, node: &Node) -> Out {
    match &node.value {
        NodeValue::InlineMath(tex) => one(
            Element::new("code")
                .with_class("language-math math-inline")
                .with_text(tex.clone()),
        ),
        _ => Vec::new(),
    }
}

fn math(_: &mut Bridge<'_>, node: &Node) -> Out {
    match &node.value {
        NodeValue::Math(tex) => one(
            Element::new("pre").with_child(
                Element::new("code")
                    .with_class("language-math math-display")
                    .with_text(tex.clone()),
            ),
        ),
        _ => Vec::new(),
    }
}

fn align_attr(align: Align) -> Option<&'static str> {
    match align {
        Align::None => None,
        Align::Left => Some("left"),
        Align::Center => Some("center"),
        Align::Right => Some("right"),
    }
}

fn table(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::Table { align } = &node.value else {
        return Vec::new();
    };
    one(sectioned_table(bridge, node, align))
}

fn grid_table(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    one(sectioned_table(bridge, node, &[]).with_class("grid-table"))
}

/// `<table>` with header rows in `<thead>` and the rest in `<tbody>`.
fn sectioned_table(bridge: &mut Bridge<'_>, node: &Node, align: &[Align]) -> Element {
    let mut head = Vec::new();
    let mut body = Vec::new();
    for row in &node.children {
        let header = matches!(row.value, NodeValue::TableRow { header: true });
        let target = if header { &mut head } else { &mut body };
        target.push(hast::Node::text("\n"));
        target.extend(table_row(bridge, row, align));
    }

    let mut children = Vec::new();
    for (tag, rows) in [("thead", head), ("tbody", body)] {
        if rows.is_empty() {
            continue;
        }
        children.push(hast::Node::text("\n"));
        let mut rows = rows;
        rows.push(hast::Node::text("\n"));
        children.push(Element::new(tag).with_children(rows).into());
    }
    children.push(hast::Node::text("\n"));
    Element::new("table").with_children(children)
}

fn table_row(bridge: &mut Bridge<'_>, row: &Node, align: &[Align]) -> Out {
    let header = matches!(row.value, NodeValue::TableRow { header: true });
    let mut cells = Vec::new();
    for (i, cell) in row.children.iter().enumerate() {
        let mut el = Element::new(if header { "th" } else { "td" });
        if let Some(align) = align.get(i).copied().and_then(align_attr) {
            el.set_attr("align", align);
        }
        if let NodeValue::TableCell { colspan } = cell.value
            && colspan > 1
        {
            el.set_attr("colspan", colspan.to_string());
        }
        cells.push(hast::Node::text("\n"));
        cells.push(el.with_children(cell_content(bridge, cell)).into());
    }
    cells.push(hast::Node::text("\n"));
    one(Element::new("tr").with_children(cells))
}

/// Cell content: inline, or blocks for grid table cells holding them.
fn cell_content(bridge: &mut Bridge<'_>, cell: &Node) -> Out {
    let has_blocks = cell.children.iter().any(|c| {
        matches!(
            c.value,
            NodeValue::Paragraph | NodeValue::List { .. } | NodeValue::Code(_)
        )
    });
    if has_blocks {
        block_content(bridge, cell)
    } else {
        bridge.inline(cell)
    }
}

fn footnote_reference(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::FootnoteReference { label } = &node.value else {
        return Vec::new();
    };
    let Some(reference) = bridge.footnotes().reference(label) else {
        return vec![hast::Node::text(format!("[^{label}]"))];
    };
    let link = Element::new("a")
        .with_attr("href", format!("#{}", note_id(&reference.slug)))
        .with_attr("id", reference.ref_id())
        .with_flag("data-footnote-ref")
        .with_attr("aria-describedby", "footnote-label")
        .with_text(reference.number.to_string());
    one(Element::new("sup").with_child(link))
}

fn is_attr_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

/// Generic element for a directive no pass gave a meaning to.
fn directive_element(tag: &str, directive: &Directive) -> Element {
    let args = &directive.args;
    let mut el = Element::new(tag)
        .with_attr("data-directive", &directive.name)
        .with_class("directive")
        .with_class(&format!("directive-{}", directive.name));
    if let Some(id) = &args.id {
        el.set_attr("id", id);
    }
    for class in &args.classes {
        el.add_class(class);
    }
    for (name, value) in &args.attrs {
        match name.as_str() {
            "class" => el.add_class(value),
            _ if is_attr_name(name) => el.set_attr(name, value),
            _ => {}
        }
    }
    el
}

fn container_directive(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::ContainerDirective(directive) = &node.value else {
        return Vec::new();
    };
    let mut children = block_content(bridge, node);
    if directive.args.has_label && !directive.args.label.is_empty() {
        let label: Out = parse_inline_fragment(&directive.args.label)
            .iter()
            .flat_map(|n| bridge.convert(n))
            .collect();
        let label = Element::new("div")
            .with_class("directive-label")
            .with_children(label);
        if children.is_empty() {
            children.push(hast::Node::text("\n"));
        }
        children.insert(1, label.into());
        children.insert(2, hast::Node::text("\n"));
    }
    one(directive_element("div", directive).with_children(children))
}

fn leaf_directive(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::LeafDirective(directive) = &node.value else {
        return Vec::new();
    };
    one(directive_element("div", directive).with_children(bridge.inline(node)))
}

fn text_directive(bridge: &mut Bridge<'_>, node: &Node) -> Out {
    let NodeValue::TextDirective(directive) = &node.value else {
        return Vec::new();
    };
    one(directive_element("span", directive).with_children(bridge.inline(node)))
}

#[cfg(test)]
mod tests {
    use crate::bridge::{HandlerMap, to_hast};
    use crate::document::ContentType;
    use crate::mdast::NodeKind;
    use crate::options::PipelineOptions;
    use crate::parse::parse;
    use crate::serialize::to_html;
    use pretty_assertions::assert_eq;

    fn render(source: &str) -> String {
        let root = parse(source, ContentType::Markdown);
        let (html, _) = to_hast(&root, &HandlerMap::standard(), &PipelineOptions::default());
        to_html(&html)
    }

    #[test]
    fn test_every_kind_has_a_handler() {
        let map = HandlerMap::standard();
        let kinds = [
            NodeKind::Root,
            NodeKind::Paragraph,
            NodeKind::Heading,
            NodeKind::ThematicBreak,
            NodeKind::Blockquote,
            NodeKind::List,
            NodeKind::ListItem,
            NodeKind::Code,
            NodeKind::Html,
            NodeKind::Text,
            NodeKind::Emphasis,
            NodeKind::Strong,
            NodeKind::Delete,
            NodeKind::InlineCode,
            NodeKind::Break,
            NodeKind::Link,
            NodeKind::Image,
            NodeKind::Table,
            NodeKind::TableRow,
            NodeKind::TableCell,
            NodeKind::FootnoteReference,
            NodeKind::FootnoteDefinition,
            NodeKind::DefinitionList,
            NodeKind::DefinitionTerm,
            NodeKind::DefinitionDescription,
            NodeKind::Superscript,
            NodeKind::Subscript,
            NodeKind::Mark,
            NodeKind::Span,
            NodeKind::Division,
            NodeKind::Abbr,
            NodeKind::InlineMath,
            NodeKind::Math,
            NodeKind::Figure,
            NodeKind::FigCaption,
            NodeKind::GridTable,
            NodeKind::ContainerDirective,
            NodeKind::LeafDirective,
            NodeKind::TextDirective,
            NodeKind::Embed,
            NodeKind::CustomBlock,
            NodeKind::CustomBlockTitle,
            NodeKind::CustomBlockBody,
            NodeKind::MdxEsm,
            NodeKind::MdxExpression,
        ];
        for kind in kinds {
            assert!(map.contains(kind), "missing handler for {kind}");
        }
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            render("```rust title=\"a.rs\"\nfn main() {}\n```\n"),
            "<pre data-meta=\"title=&quot;a.rs&quot;\"><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_tight_task_list() {
        assert_eq!(
            render("- [x] done\n- todo\n"),
            "<ul class=\"contains-task-list\">\n<li class=\"task-list-item\"><input type=\"checkbox\" disabled checked> done</li>\n<li>todo</li>\n</ul>"
        );
    }

    #[test]
    fn test_loose_list_keeps_paragraphs() {
        assert_eq!(
            render("1. one\n\n2. two\n"),
            "<ol>\n<li>\n<p>one</p>\n</li>\n<li>\n<p>two</p>\n</li>\n</ol>"
        );
    }

    #[test]
    fn test_table_alignment() {
        assert_eq!(
            render("| a | b |\n|:--|--:|\n| 1 | 2 |\n"),
            "<table>\n<thead>\n<tr>\n<th align=\"left\">a</th>\n<th align=\"right\">b</th>\n</tr>\n</thead>\n<tbody>\n<tr>\n<td align=\"left\">1</td>\n<td align=\"right\">2</td>\n</tr>\n</tbody>\n</table>"
        );
    }

    #[test]
    fn test_footnotes() {
        let html = render("Text[^n].\n\n[^n]: The note.\n");
        assert!(html.contains(
            "<sup><a href=\"#fn-n\" id=\"fnref-n\" data-footnote-ref aria-describedby=\"footnote-label\">1</a></sup>"
        ));
        assert!(html.contains("<section data-footnotes class=\"footnotes\">"));
        assert!(html.contains("<li id=\"fn-n\">"));
        assert!(html.contains("The note. <a href=\"#fnref-n\" data-footnote-backref"));
    }

    #[test]
    fn test_unreferenced_footnote_dropped() {
        assert_eq!(render("Text.\n\n[^n]: Unused.\n"), "<p>Text.</p>");
    }

    #[test]
    fn test_alert() {
        assert_eq!(
            render("> [!NOTE]\n> Heads up.\n"),
            "<blockquote class=\"markdown-alert markdown-alert-note\">\n<p class=\"markdown-alert-title\">Note</p>\n<p>Heads up.</p>\n</blockquote>"
        );
    }
}
