//! Code fence info strings and the directives parsed out of them.
//!
//! The info string after the opening fence is split into a language tag
//! and meta tokens. Passes take the tokens they understand out of the
//! meta string and record them in [`FenceDirectives`]; whatever is left
//! afterwards is residue that never reaches the final markup.

/// Tab group membership from a `[group:tab]` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub group: String,
    pub tab: String,
}

/// Set of 1-based line numbers, e.g. `{1,3-5}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSet {
    ranges: Vec<(u32, u32)>,
}

impl LineSet {
    /// Parse a comma-separated list of lines and ranges.
    ///
    /// Accepts the list with or without surrounding braces. Returns `None`
    /// when any element is not a number or a `start-end` range.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let inner = s
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(s);

        let mut ranges = Vec::new();
        for part in inner.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let range = match part.split_once('-') {
                Some((start, end)) => {
                    let start: u32 = start.trim().parse().ok()?;
                    let end: u32 = end.trim().parse().ok()?;
                    (start.min(end), start.max(end))
                }
                None => {
                    let line: u32 = part.parse().ok()?;
                    (line, line)
                }
            };
            ranges.push(range);
        }

        if ranges.is_empty() {
            return None;
        }
        Some(Self { ranges })
    }

    /// Merge another set into this one.
    pub fn extend(&mut self, other: &LineSet) {
        self.ranges.extend_from_slice(&other.ranges);
    }

    #[must_use]
    pub fn contains(&self, line: u32) -> bool {
        self.ranges
            .iter()
            .any(|&(start, end)| line >= start && line <= end)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Fence directives attached to a code node.
///
/// Fields are written by the markdown passes that own the matching tokens
/// and read by the HTML highlighter and code-tab wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceDirectives {
    /// Written by the code-tab pass.
    pub tab: Option<TabInfo>,
    /// Lines from `{..}` tokens.
    pub highlight: LineSet,
    /// Lines from `ins={..}`.
    pub inserted: LineSet,
    /// Lines from `del={..}`.
    pub deleted: LineSet,
    /// Lines from `error={..}`.
    pub errors: LineSet,
    /// Lines from `warning={..}`.
    pub warnings: LineSet,
    /// Patterns from `/regex/` tokens.
    pub word_patterns: Vec<String>,
    /// File name from `title="..."`.
    pub title: Option<String>,
}

impl FenceDirectives {
    /// Whether any line-level decoration was requested.
    #[must_use]
    pub fn has_line_marks(&self) -> bool {
        !(self.highlight.is_empty()
            && self.inserted.is_empty()
            && self.deleted.is_empty()
            && self.errors.is_empty()
            && self.warnings.is_empty())
    }
}

/// Split an info string into language tag and meta.
///
/// Returns `(language, meta)`; both are `None` when empty.
#[must_use]
pub fn split_info(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    if info.is_empty() {
        return (None, None);
    }

    let (lang, meta) = match info.find(char::is_whitespace) {
        Some(pos) => (&info[..pos], info[pos..].trim()),
        None => (info, ""),
    };
    // A fence without a language may start right away with its meta
    if looks_like_meta(lang) {
        return (None, Some(info.to_owned()));
    }

    let lang = (!lang.is_empty()).then(|| lang.to_owned());
    let meta = (!meta.is_empty()).then(|| meta.to_owned());
    (lang, meta)
}

/// Whether the first word of an info string is a meta token: a tab group
/// `[group:tab]`, a line set `{..}`, a `/regex/` or a `key=value` pair.
fn looks_like_meta(word: &str) -> bool {
    (word.starts_with('[') && word.contains(':'))
        || word.starts_with('{')
        || (word.starts_with('/') && word.len() > 1)
        || word.contains('=')
}

/// Split a meta string into tokens.
///
/// Whitespace separates tokens except inside double or single quotes,
/// braces, brackets, or a `/regex/` literal.
#[must_use]
pub fn tokenize_meta(meta: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = meta.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '"' | '\'' => {
                current.push(c);
                for next in chars.by_ref() {
                    current.push(next);
                    if next == c {
                        break;
                    }
                }
            }
            '{' | '[' => {
                let close = if c == '{' { '}' } else { ']' };
                current.push(c);
                let mut depth = 1;
                for next in chars.by_ref() {
                    current.push(next);
                    if next == c {
                        depth += 1;
                    } else if next == close {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                }
            }
            '/' if current.is_empty() => {
                current.push(c);
                let mut escaped = false;
                for next in chars.by_ref() {
                    current.push(next);
                    if escaped {
                        escaped = false;
                    } else if next == '\\' {
                        escaped = true;
                    } else if next == '/' {
                        break;
                    }
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Remove the tokens accepted by `take` from a meta string.
///
/// Returns the remaining meta, or `None` when nothing is left.
pub fn consume_tokens<F>(meta: Option<&str>, mut take: F) -> Option<String>
where
    F: FnMut(&str) -> bool,
{
    let meta = meta?;
    let rest: Vec<String> = tokenize_meta(meta)
        .into_iter()
        .filter(|token| !take(token))
        .collect();

    (!rest.is_empty()).then(|| rest.join(" "))
}

/// Strip matching surrounding quotes from a token value.
#[must_use]
pub fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_info() {
        assert_eq!(
            split_info("js [g1:JavaScript] {1,3}"),
            (
                Some("js".to_owned()),
                Some("[g1:JavaScript] {1,3}".to_owned())
            )
        );
        assert_eq!(split_info("rust"), (Some("rust".to_owned()), None));
        assert_eq!(split_info("  "), (None, None));
    }

    #[test]
    fn test_split_info_without_language() {
        assert_eq!(split_info("[g:One]"), (None, Some("[g:One]".to_owned())));
        assert_eq!(
            split_info("{1,3} title=\"a.txt\""),
            (None, Some("{1,3} title=\"a.txt\"".to_owned()))
        );
        assert_eq!(split_info("title=a.txt"), (None, Some("title=a.txt".to_owned())));
        assert_eq!(split_info("/foo/"), (None, Some("/foo/".to_owned())));
        assert_eq!(split_info("c++ {2}"), (Some("c++".to_owned()), Some("{2}".to_owned())));
    }

    #[test]
    fn test_tokenize_keeps_groups_together() {
        let tokens = tokenize_meta(r#"[g1:Java Script] {1, 3-5} /foo bar/ title="My file.rs" ins={2}"#);
        assert_eq!(
            tokens,
            vec![
                "[g1:Java Script]",
                "{1, 3-5}",
                "/foo bar/",
                r#"title="My file.rs""#,
                "ins={2}",
            ]
        );
    }

    #[test]
    fn test_tokenize_escaped_slash_in_regex() {
        let tokens = tokenize_meta(r"/a\/b/ rest");
        assert_eq!(tokens, vec![r"/a\/b/", "rest"]);
    }

    #[test]
    fn test_line_set() {
        let set = LineSet::parse("{1,3-5}").unwrap();
        assert!(set.contains(1));
        assert!(!set.contains(2));
        assert!(set.contains(4));
        assert!(set.contains(5));
        assert!(!set.contains(6));
    }

    #[test]
    fn test_line_set_rejects_garbage() {
        assert_eq!(LineSet::parse("{a,b}"), None);
        assert_eq!(LineSet::parse("{}"), None);
    }

    #[test]
    fn test_reversed_range_is_normalized() {
        let set = LineSet::parse("5-3").unwrap();
        assert!(set.contains(4));
    }

    #[test]
    fn test_consume_tokens() {
        let rest = consume_tokens(Some("[g:a] keep {1}"), |t| t.starts_with('['));
        assert_eq!(rest.as_deref(), Some("keep {1}"));
        assert_eq!(consume_tokens(Some("[g:a]"), |_| true), None);
        assert_eq!(consume_tokens(None, |_| true), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""a b""#), "a b");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("plain"), "plain");
    }
}
