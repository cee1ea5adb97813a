//! Directive syntax: `:name[label]{attrs}`, `::name[..]{..}` and
//! `:::name[..]{..}` fences closed by a line of colons.

use super::DirectiveArgs;

/// One line of container fence syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceLine {
    /// `:::name[label]{attrs}` opening a container.
    Open {
        name: String,
        args: DirectiveArgs,
        colons: usize,
    },
    /// Bare `:::` closing the innermost container with at most as many colons.
    Close { colons: usize },
}

/// Text directive found inside a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub name: String,
    pub args: DirectiveArgs,
    /// Byte range of the whole directive in the scanned text.
    pub start: usize,
    pub end: usize,
}

/// Names are ASCII letters, digits, `-` and `_`, starting with a letter.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse a container fence line (three or more colons).
///
/// Leading whitespace and blockquote markers are ignored.
#[must_use]
pub fn parse_fence_line(line: &str) -> Option<FenceLine> {
    let line = line
        .trim_start_matches(|c: char| c == '>' || c.is_whitespace())
        .trim_end();
    let colons = line.chars().take_while(|&c| c == ':').count();
    if colons < 3 {
        return None;
    }

    let rest = line[colons..].trim_start();
    if rest.is_empty() {
        return Some(FenceLine::Close { colons });
    }

    let (name, args, consumed) = parse_named(rest)?;
    if !rest[consumed..].trim().is_empty() {
        return None;
    }
    Some(FenceLine::Open { name, args, colons })
}

/// Parse a leaf directive occupying a whole line (`::name[..]{..}`).
#[must_use]
pub fn parse_leaf_line(line: &str) -> Option<(String, DirectiveArgs)> {
    let line = line.trim();
    let rest = line.strip_prefix("::")?;
    if rest.starts_with(':') {
        return None;
    }
    let (name, args, consumed) = parse_named(rest)?;
    if !rest[consumed..].trim().is_empty() {
        return None;
    }
    Some((name, args))
}

/// Find the first text directive in `text` at or after `from`.
///
/// Text directives need a bracketed label, so `10:30` or `:smile:` never
/// match.
#[must_use]
pub fn find_text_directive(text: &str, from: usize) -> Option<TextMatch> {
    let mut search = from;
    while let Some(offset) = text[search..].find(':') {
        let start = search + offset;
        let rest = &text[start + 1..];
        let preceded_by_colon = text[..start].ends_with(':');

        if !preceded_by_colon
            && !rest.starts_with(':')
            && let Some((name, args, consumed)) = parse_named(rest)
            && args.has_label
        {
            return Some(TextMatch {
                name,
                args,
                start,
                end: start + 1 + consumed,
            });
        }
        search = start + 1;
    }
    None
}

/// Parse a `{#id .class key=value}` block at the start of `s`.
///
/// Returns the attributes and the number of bytes consumed. A block
/// without any id, class or attribute, or with a key that is not a valid
/// attribute name, is not an attribute block.
#[must_use]
pub fn parse_attr_block(s: &str) -> Option<(DirectiveArgs, usize)> {
    let (inner, used) = balanced(s, '{', '}')?;
    let args = DirectiveArgs::parse("", inner);
    if args.id.is_none() && args.classes.is_empty() && args.attrs.is_empty() {
        return None;
    }
    args.attrs
        .iter()
        .all(|(key, _)| is_attr_name(key))
        .then_some((args, used))
}

fn is_attr_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

/// Parse `name[label]{attrs}` and return the number of bytes consumed.
fn parse_named(s: &str) -> Option<(String, DirectiveArgs, usize)> {
    let name_end = s
        .find(|c: char| c == '[' || c == '{' || c.is_whitespace())
        .unwrap_or(s.len());
    let name = &s[..name_end];
    if !is_valid_name(name) {
        return None;
    }

    let mut pos = name_end;
    let label = balanced(&s[pos..], '[', ']');
    if let Some((_, used)) = label {
        pos += used;
    }
    let attrs = balanced(&s[pos..], '{', '}');
    if let Some((_, used)) = attrs {
        pos += used;
    }

    let mut args = DirectiveArgs::parse(
        label.map_or("", |(inner, _)| inner),
        attrs.map_or("", |(inner, _)| inner),
    );
    args.has_label = label.is_some();
    Some((name.to_owned(), args, pos))
}

/// Inner text and consumed length of a balanced `open..close` group at the
/// start of `s`.
fn balanced(s: &str, open: char, close: char) -> Option<(&str, usize)> {
    if !s.starts_with(open) {
        return None;
    }
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some((&s[1..i], i + 1));
            }
        }
    }
    None
}
