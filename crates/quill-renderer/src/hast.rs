//! HTML tree.
//!
//! Elements keep attributes in insertion order. Token-list attributes
//! (`class`, `rel`) are stored as a [`TokenList`], which never holds the
//! same token twice, so structural passes can add classes freely and stay
//! idempotent.

use crate::fence::FenceDirectives;

/// Ordered, duplicate-free list of attribute tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList(Vec<String>);

impl TokenList {
    /// Build from a whitespace-separated string.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut list = Self::default();
        for token in value.split_whitespace() {
            list.add(token);
        }
        list
    }

    /// Append a token unless it is already present.
    ///
    /// Returns whether the list changed.
    pub fn add(&mut self, token: &str) -> bool {
        if token.is_empty() || self.contains(token) {
            return false;
        }
        self.0.push(token.to_owned());
        true
    }

    pub fn remove(&mut self, token: &str) {
        self.0.retain(|t| t != token);
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Space-separated form used in markup.
    #[must_use]
    pub fn to_attr_string(&self) -> String {
        self.0.join(" ")
    }
}

/// Attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    Tokens(TokenList),
    /// Boolean attribute rendered without a value (`hidden`).
    Flag,
}

/// Attributes whose value is a token list.
const TOKEN_ATTRS: &[&str] = &["class", "rel"];

/// Out-of-band data carried by an element but never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementData {
    /// Fence directives of a code block, set on its `<pre>`.
    Fence(Box<FenceDirectives>),
}

/// An HTML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, AttrValue)>,
    pub children: Vec<Node>,
    pub data: Option<ElementData>,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    #[must_use]
    pub fn with_flag(mut self, name: &str) -> Self {
        self.set_flag(name);
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Set an attribute, replacing any previous value.
    ///
    /// Token-list attributes are split on whitespace.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let value = if TOKEN_ATTRS.contains(&name) {
            AttrValue::Tokens(TokenList::parse(&value))
        } else {
            AttrValue::Str(value)
        };
        self.put(name, value);
    }

    pub fn set_flag(&mut self, name: &str) {
        self.put(name, AttrValue::Flag);
    }

    fn put(&mut self, name: &str, value: AttrValue) {
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name.to_owned(), value));
        }
    }

    /// String value of an attribute. Token lists are joined with spaces,
    /// flags read as the empty string.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.attr_value(name).map(|value| match value {
            AttrValue::Str(s) => s.clone(),
            AttrValue::Tokens(tokens) => tokens.to_attr_string(),
            AttrValue::Flag => String::new(),
        })
    }

    #[must_use]
    pub fn attr_value(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr_value(name).is_some()
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<AttrValue> {
        let pos = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Mutable token list of a token attribute, created on first use.
    pub fn tokens_mut(&mut self, name: &str) -> &mut TokenList {
        let pos = match self.attrs.iter().position(|(n, _)| n == name) {
            Some(pos) => {
                let converted = match &self.attrs[pos].1 {
                    AttrValue::Str(s) => Some(TokenList::parse(s)),
                    AttrValue::Flag => Some(TokenList::default()),
                    AttrValue::Tokens(_) => None,
                };
                if let Some(tokens) = converted {
                    self.attrs[pos].1 = AttrValue::Tokens(tokens);
                }
                pos
            }
            None => {
                self.attrs
                    .push((name.to_owned(), AttrValue::Tokens(TokenList::default())));
                self.attrs.len() - 1
            }
        };
        match &mut self.attrs[pos].1 {
            AttrValue::Tokens(tokens) => tokens,
            AttrValue::Str(_) | AttrValue::Flag => unreachable!("converted above"),
        }
    }

    /// Add a class unless present.
    pub fn add_class(&mut self, class: &str) {
        for token in class.split_whitespace() {
            self.tokens_mut("class").add(token);
        }
    }

    pub fn add_classes(&mut self, classes: &[&str]) {
        for class in classes {
            self.add_class(class);
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        if self.has_attr("class") {
            self.tokens_mut("class").remove(class);
        }
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        match self.attr_value("class") {
            Some(AttrValue::Tokens(tokens)) => tokens.contains(class),
            Some(AttrValue::Str(s)) => s.split_whitespace().any(|t| t == class),
            _ => false,
        }
    }

    /// Classes in order.
    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        match self.attr_value("class") {
            Some(AttrValue::Tokens(tokens)) => tokens.iter().map(str::to_owned).collect(),
            Some(AttrValue::Str(s)) => s.split_whitespace().map(str::to_owned).collect(),
            _ => Vec::new(),
        }
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// First child element with the given tag.
    #[must_use]
    pub fn child_element(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| match child {
            Node::Element(el) if el.tag == tag => Some(el),
            _ => None,
        })
    }

    pub fn child_element_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|child| match child {
            Node::Element(el) if el.tag == tag => Some(el),
            _ => None,
        })
    }

    /// Fence directives attached by the bridge, if any.
    #[must_use]
    pub fn fence(&self) -> Option<&FenceDirectives> {
        match &self.data {
            Some(ElementData::Fence(fence)) => Some(fence),
            None => None,
        }
    }
}

/// An HTML tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Document root; serializes to its children only.
    Root(Vec<Node>),
    Element(Element),
    Text(String),
    /// Markup emitted verbatim (raw HTML, rendered SVG, MathML).
    Raw(String),
    Comment(String),
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl Node {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Root(children) => children,
            Self::Element(el) => &el.children,
            Self::Text(_) | Self::Raw(_) | Self::Comment(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Root(children) => Some(children),
            Self::Element(el) => Some(&mut el.children),
            Self::Text(_) | Self::Raw(_) | Self::Comment(_) => None,
        }
    }

    /// Whether this is a text node holding only whitespace.
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(t) if t.trim().is_empty())
    }

    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(t) => out.push_str(t),
            Self::Root(children) => children.iter().for_each(|c| c.collect_text(out)),
            Self::Element(el) => el.children.iter().for_each(|c| c.collect_text(out)),
            Self::Raw(_) | Self::Comment(_) => {}
        }
    }

    /// Visit every element depth-first, parents before children.
    pub fn visit_elements<'a, F: FnMut(&'a Element)>(&'a self, f: &mut F) {
        if let Self::Element(el) = self {
            f(el);
        }
        for child in self.children() {
            child.visit_elements(f);
        }
    }

    /// Visit every element mutably, parents before children.
    ///
    /// The second callback argument is the ancestor tag chain, nearest last.
    pub fn visit_elements_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Element, &[String]),
    {
        let mut ancestors = Vec::new();
        self.visit_inner(&mut ancestors, f);
    }

    fn visit_inner<F>(&mut self, ancestors: &mut Vec<String>, f: &mut F)
    where
        F: FnMut(&mut Element, &[String]),
    {
        match self {
            Self::Root(children) => {
                for child in children {
                    child.visit_inner(ancestors, f);
                }
            }
            Self::Element(el) => {
                f(el, ancestors);
                ancestors.push(el.tag.clone());
                for child in &mut el.children {
                    child.visit_inner(ancestors, f);
                }
                ancestors.pop();
            }
            Self::Text(_) | Self::Raw(_) | Self::Comment(_) => {}
        }
    }

    /// Rewrite every sibling list, parents before children.
    pub fn rewrite_children<F: FnMut(&mut Vec<Node>)>(&mut self, f: &mut F) {
        let Some(children) = self.children_mut() else {
            return;
        };
        f(children);
        for child in children.iter_mut() {
            child.rewrite_children(f);
        }
    }

    /// Collect every element matching the predicate, in document order.
    #[must_use]
    pub fn find_all<P>(&self, pred: P) -> Vec<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        let mut out = Vec::new();
        self.visit_elements(&mut |el| {
            if pred(el) {
                out.push(el);
            }
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_class_is_idempotent() {
        let mut el = Element::new("p");
        el.add_class("a b");
        el.add_class("b");
        el.add_class("c");
        el.add_class("a");
        assert_eq!(el.classes(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_class_from_string_is_deduplicated() {
        let el = Element::new("p").with_attr("class", "x y x");
        assert_eq!(el.attr("class").as_deref(), Some("x y"));
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut el = Element::new("a")
            .with_attr("href", "/a")
            .with_attr("title", "t");
        el.set_attr("href", "/b");
        let names: Vec<_> = el.attrs().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["href", "title"]);
        assert_eq!(el.attr("href").as_deref(), Some("/b"));
    }

    #[test]
    fn test_remove_attr() {
        let mut el = Element::new("pre").with_attr("data-meta", "x");
        assert!(el.remove_attr("data-meta").is_some());
        assert!(!el.has_attr("data-meta"));
        assert!(el.remove_attr("data-meta").is_none());
    }

    #[test]
    fn test_text_content() {
        let el = Element::new("h2")
            .with_text("Hello ")
            .with_child(Element::new("em").with_text("World"))
            .with_child(Node::Raw("<b>x</b>".to_owned()));
        assert_eq!(el.text_content(), "Hello World");
    }

    #[test]
    fn test_find_all_returns_borrowed_elements_in_order() {
        let root = Node::Root(vec![
            Element::new("div")
                .with_class("math")
                .with_child(Element::new("span").with_class("math"))
                .into(),
            Element::new("p").into(),
            Element::new("span").with_class("math").into(),
        ]);
        let tags: Vec<&str> = root
            .find_all(|el| el.has_class("math"))
            .into_iter()
            .map(|el| el.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["div", "span", "span"]);
    }

    #[test]
    fn test_visit_passes_ancestors() {
        let mut root = Node::Root(vec![
            Element::new("pre")
                .with_child(Element::new("code").with_text("x"))
                .into(),
            Element::new("code").with_text("y").into(),
        ]);
        let mut seen = Vec::new();
        root.visit_elements_mut(&mut |el, ancestors| {
            if el.tag == "code" {
                seen.push(ancestors.iter().any(|a| a == "pre"));
            }
        });
        assert_eq!(seen, vec![true, false]);
    }
}
