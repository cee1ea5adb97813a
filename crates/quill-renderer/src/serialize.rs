//! HTML tree serialization.

use std::fmt::Write;

use crate::hast::{AttrValue, Element, Node};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Serialize a tree to an HTML string.
#[must_use]
pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Root(children) => {
            for child in children {
                write_node(out, child);
            }
        }
        Node::Element(el) => write_element(out, el),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Raw(raw) => out.push_str(raw),
        Node::Comment(comment) => {
            // `--` would end the comment early
            write!(out, "<!--{}-->", comment.replace("--", "- -")).unwrap();
        }
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in el.attrs() {
        match value {
            AttrValue::Flag => write!(out, " {name}").unwrap(),
            AttrValue::Str(s) => write!(out, r#" {name}="{}""#, escape_attr(s)).unwrap(),
            AttrValue::Tokens(tokens) => {
                if !tokens.is_empty() {
                    write!(
                        out,
                        r#" {name}="{}""#,
                        escape_attr(&tokens.to_attr_string())
                    )
                    .unwrap();
                }
            }
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&el.tag.as_str()) {
        return;
    }

    for child in &el.children {
        write_node(out, child);
    }
    write!(out, "</{}>", el.tag).unwrap();
}

/// Escape text content.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for double-quoted output.
#[must_use]
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_element_with_attrs() {
        let node: Node = Element::new("a")
            .with_attr("href", "/x?a=1&b=\"2\"")
            .with_class("link")
            .with_text("1 < 2")
            .into();
        assert_eq!(
            to_html(&node),
            r#"<a href="/x?a=1&amp;b=&quot;2&quot;" class="link">1 &lt; 2</a>"#
        );
    }

    #[test]
    fn test_void_and_flag() {
        let node: Node = Element::new("input")
            .with_attr("type", "checkbox")
            .with_flag("disabled")
            .into();
        assert_eq!(to_html(&node), r#"<input type="checkbox" disabled>"#);
    }

    #[test]
    fn test_empty_class_is_omitted() {
        let mut el = Element::new("p").with_class("a");
        el.remove_class("a");
        assert_eq!(to_html(&el.into()), "<p></p>");
    }

    #[test]
    fn test_raw_is_verbatim() {
        let root = Node::Root(vec![
            Node::Raw("<svg></svg>".to_owned()),
            Node::Comment("a--b".to_owned()),
        ]);
        assert_eq!(to_html(&root), "<svg></svg><!--a- -b-->");
    }
}
