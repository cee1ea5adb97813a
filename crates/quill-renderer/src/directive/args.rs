//! Directive label and attribute parsing.
//!
//! Handles the `[label]{#id .class key="value"}` tail shared by text,
//! leaf and container directives.

/// Label and attributes of a directive.
///
/// # Example
///
/// ```
/// use quill_renderer::directive::DirectiveArgs;
///
/// let args = DirectiveArgs::parse("Intro", r#"#intro .wide start="10""#);
/// assert_eq!(args.label, "Intro");
/// assert_eq!(args.id.as_deref(), Some("intro"));
/// assert_eq!(args.classes, vec!["wide"]);
/// assert_eq!(args.get("start"), Some("10"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveArgs {
    /// Text between the brackets, empty when absent.
    pub label: String,
    /// Whether brackets were present at all.
    pub has_label: bool,
    /// `#id` shorthand.
    pub id: Option<String>,
    /// `.class` shorthands in order of appearance.
    pub classes: Vec<String>,
    /// `key=value` pairs in order of appearance. Later duplicates win.
    pub attrs: Vec<(String, String)>,
}

impl DirectiveArgs {
    /// Parse a label and the attribute string found between braces.
    #[must_use]
    pub fn parse(label: &str, attrs: &str) -> Self {
        let mut args = Self {
            label: label.to_owned(),
            ..Self::default()
        };

        let mut rest = attrs.trim();
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('#') {
                let (value, tail) = split_shorthand(after);
                if !value.is_empty() {
                    args.id = Some(value.to_owned());
                }
                rest = tail;
            } else if let Some(after) = rest.strip_prefix('.') {
                let (value, tail) = split_shorthand(after);
                if !value.is_empty() && !args.classes.iter().any(|c| c == value) {
                    args.classes.push(value.to_owned());
                }
                rest = tail;
            } else if let Some((key, value, tail)) = split_pair(rest) {
                args.set(key, value);
                rest = tail;
            } else {
                // Unterminated quote or stray `=`, ignore the remainder
                break;
            }
            rest = rest.trim_start();
        }

        args
    }

    /// Look up a `key=value` attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| k == key) {
            value.clone_into(&mut slot.1);
        } else {
            self.attrs.push((key.to_owned(), value.to_owned()));
        }
    }

    /// Rebuild `[label]{attrs}` for directives nothing handles.
    #[must_use]
    pub fn to_syntax(&self) -> String {
        let mut out = String::new();
        if self.has_label || !self.label.is_empty() {
            out.push('[');
            out.push_str(&self.label);
            out.push(']');
        }

        let mut parts = Vec::new();
        if let Some(id) = &self.id {
            parts.push(format!("#{id}"));
        }
        parts.extend(self.classes.iter().map(|c| format!(".{c}")));
        parts.extend(
            self.attrs
                .iter()
                .map(|(k, v)| format!(r#"{k}="{}""#, v.replace('"', "&quot;"))),
        );
        if !parts.is_empty() {
            out.push('{');
            out.push_str(&parts.join(" "));
            out.push('}');
        }
        out
    }
}

/// Split an `#id` or `.class` value off the front of the attribute string.
fn split_shorthand(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| c.is_whitespace() || c == '.' || c == '#')
        .unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Split `key="value"`, `key='value'` or `key=value` off the front.
///
/// A bare `key` becomes a pair with an empty value.
fn split_pair(s: &str) -> Option<(&str, &str, &str)> {
    let key_end = s
        .find(|c: char| c == '=' || c.is_whitespace())
        .unwrap_or(s.len());
    let key = &s[..key_end];
    if key.is_empty() {
        return None;
    }

    let Some(after) = s[key_end..].strip_prefix('=') else {
        return Some((key, "", &s[key_end..]));
    };

    for quote in ['"', '\''] {
        if let Some(quoted) = after.strip_prefix(quote) {
            let close = quoted.find(quote)?;
            return Some((key, &quoted[..close], &quoted[close + 1..]));
        }
    }

    let end = after.find(char::is_whitespace).unwrap_or(after.len());
    Some((key, &after[..end], &after[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty() {
        let args = DirectiveArgs::parse("", "");
        assert_eq!(args, DirectiveArgs::default());
    }

    #[test]
    fn test_shorthands_and_pairs() {
        let args = DirectiveArgs::parse("", r#".a #main .b width=640 title='Big "one"'"#);
        assert_eq!(args.id.as_deref(), Some("main"));
        assert_eq!(args.classes, vec!["a", "b"]);
        assert_eq!(args.get("width"), Some("640"));
        assert_eq!(args.get("title"), Some(r#"Big "one""#));
    }

    #[test]
    fn test_adjacent_shorthands() {
        let args = DirectiveArgs::parse("", ".a.b#x");
        assert_eq!(args.classes, vec!["a", "b"]);
        assert_eq!(args.id.as_deref(), Some("x"));
    }

    #[test]
    fn test_bare_key() {
        let args = DirectiveArgs::parse("", "autoplay muted");
        assert_eq!(args.get("autoplay"), Some(""));
        assert_eq!(args.get("muted"), Some(""));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let args = DirectiveArgs::parse("", "k=1 k=2");
        assert_eq!(args.get("k"), Some("2"));
        assert_eq!(args.attrs.len(), 1);
    }

    #[test]
    fn test_unterminated_quote_stops_parsing() {
        let args = DirectiveArgs::parse("", r#".keep title="open"#);
        assert_eq!(args.classes, vec!["keep"]);
        assert!(args.attrs.is_empty());
    }

    #[test]
    fn test_to_syntax() {
        let mut args = DirectiveArgs::parse("Label", r#"#i .c k="v""#);
        args.has_label = true;
        assert_eq!(args.to_syntax(), r#"[Label]{#i .c k="v"}"#);
    }
}
