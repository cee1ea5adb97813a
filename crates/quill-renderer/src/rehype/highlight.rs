//! Syntax highlighting with class-based tokens.
//!
//! Each line of a highlighted block becomes a `span.line` carrying the line
//! decorations from the fence (`highlighted`, `diff add`, `diff remove`,
//! `error`, `warning`). Tokens are spans classed after their innermost
//! syntax scope, e.g. `keyword control`. Text matching a `/regex/` fence
//! pattern gets `highlighted-word`.
//!
//! Languages the highlighter does not know keep their plain text. The
//! `data-meta` attribute never survives this pass.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::error::PassError;
use crate::fence::FenceDirectives;
use crate::hast::{self, Element};
use crate::options::PipelineOptions;
use crate::pass::{HtmlPass, RunContext};

use super::{code_language, names};

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// A run of text with the class of its innermost scope.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    class: Option<String>,
}

/// Highlights `<pre><code class="language-x">` blocks.
#[derive(Debug, Default)]
pub struct Highlight {
    aliases: HashMap<String, String>,
    exclude: Vec<String>,
}

impl Highlight {
    #[must_use]
    pub fn new(options: &PipelineOptions) -> Self {
        Self {
            aliases: options.lang_aliases.clone(),
            exclude: options.highlight_exclude.clone(),
        }
    }

    fn resolve<'a>(&'a self, lang: &'a str) -> &'a str {
        self.aliases.get(lang).map_or(lang, String::as_str)
    }

    fn highlight_block(&self, pre: &mut Element, warnings: &mut Vec<String>) {
        pre.remove_attr("data-meta");
        let fence = pre.fence().cloned().unwrap_or_default();
        if let Some(title) = &fence.title {
            pre.set_attr("data-filename", title);
        }

        let Some(lang) = code_language(pre) else {
            return;
        };
        let lang = self.resolve(&lang).to_owned();
        if self.exclude.contains(&lang) {
            return;
        }
        pre.set_attr("data-language", &lang);
        pre.set_attr("tabindex", "0");

        let patterns: Vec<Regex> = fence
            .word_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warnings.push(format!("invalid highlight pattern /{pattern}/: {e}"));
                    None
                }
            })
            .collect();

        let syntax = SYNTAX_SET.find_syntax_by_token(&lang);
        if syntax.is_none() && !fence.has_line_marks() && patterns.is_empty() {
            return;
        }
        let Some(code) = pre.child_element_mut("code") else {
            return;
        };
        let source = code.text_content();
        let lines = match tokenize(&source, syntax) {
            Ok(lines) => lines,
            Err(message) => {
                warnings.push(format!("could not highlight {lang} block: {message}"));
                tokenize(&source, None).unwrap_or_default()
            }
        };
        code.children = render_lines(lines, &fence, &patterns);
    }
}

impl HtmlPass for Highlight {
    fn name(&self) -> &'static str {
        names::HIGHLIGHT
    }

    fn run(&self, tree: &mut hast::Node, cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let mut warnings = Vec::new();
        tree.visit_elements_mut(&mut |el, _| {
            if el.tag == "pre" {
                self.highlight_block(el, &mut warnings);
            }
        });
        for warning in warnings {
            cx.warn(warning);
        }
        Ok(())
    }
}

/// Split code into lines of tokens. Without a syntax every line is one
/// unclassed token.
fn tokenize(source: &str, syntax: Option<&SyntaxReference>) -> Result<Vec<Vec<Token>>, String> {
    let Some(syntax) = syntax else {
        return Ok(source
            .lines()
            .map(|line| {
                vec![Token {
                    text: line.to_owned(),
                    class: None,
                }]
            })
            .collect());
    };

    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(source) {
        let ops = state
            .parse_line(line, &SYNTAX_SET)
            .map_err(|e| e.to_string())?;
        let content = line.trim_end_matches(['\n', '\r']);
        let mut tokens = Vec::new();
        let mut start = 0;
        for (offset, op) in ops {
            let offset = offset.min(content.len());
            if offset > start {
                tokens.push(Token {
                    text: content[start..offset].to_owned(),
                    class: scope_class(&stack),
                });
                start = offset;
            }
            stack.apply(&op).map_err(|e| format!("{e:?}"))?;
        }
        if start < content.len() {
            tokens.push(Token {
                text: content[start..].to_owned(),
                class: scope_class(&stack),
            });
        }
        lines.push(tokens);
    }
    Ok(lines)
}

/// Class of the innermost scope below the language's base scope.
fn scope_class(stack: &ScopeStack) -> Option<String> {
    let scopes = stack.as_slice();
    if scopes.len() < 2 {
        return None;
    }
    let name = scopes.last()?.build_string();
    let mut atoms: Vec<&str> = name.split('.').collect();
    // The last atom repeats the language name.
    if atoms.len() > 1 {
        atoms.pop();
    }
    Some(atoms.join(" "))
}

fn line_classes(fence: &FenceDirectives, line: u32) -> Vec<&'static str> {
    let mut classes = vec!["line"];
    if fence.highlight.contains(line) {
        classes.push("highlighted");
    }
    if fence.inserted.contains(line) {
        classes.extend(["diff", "add"]);
    }
    if fence.deleted.contains(line) {
        classes.extend(["diff", "remove"]);
    }
    if fence.errors.contains(line) {
        classes.push("error");
    }
    if fence.warnings.contains(line) {
        classes.push("warning");
    }
    classes
}

fn render_lines(lines: Vec<Vec<Token>>, fence: &FenceDirectives, patterns: &[Regex]) -> Vec<hast::Node> {
    let mut out = Vec::new();
    for (i, tokens) in lines.into_iter().enumerate() {
        let number = u32::try_from(i + 1).unwrap_or(u32::MAX);
        let mut line = Element::new("span");
        line.add_classes(&line_classes(fence, number));
        line.children = render_tokens(tokens, patterns);
        out.push(line.into());
        out.push(hast::Node::text("\n"));
    }
    out
}

fn render_tokens(tokens: Vec<Token>, patterns: &[Regex]) -> Vec<hast::Node> {
    let text: String = tokens.iter().map(|t| t.text.as_str()).collect();
    let matches: Vec<(usize, usize)> = patterns
        .iter()
        .flat_map(|re| re.find_iter(&text).map(|m| (m.start(), m.end())))
        .filter(|(start, end)| end > start)
        .collect();

    let mut out = Vec::new();
    let mut offset = 0;
    for token in tokens {
        let end = offset + token.text.len();
        let mut cuts: Vec<usize> = matches
            .iter()
            .flat_map(|&(s, e)| [s, e])
            .filter(|&cut| cut > offset && cut < end)
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut start = offset;
        for cut in cuts.into_iter().chain([end]) {
            let piece = &token.text[start - offset..cut - offset];
            let in_match = matches.iter().any(|&(s, e)| s <= start && cut <= e);
            out.push(piece_node(piece, token.class.as_deref(), in_match));
            start = cut;
        }
        offset = end;
    }
    out
}

fn piece_node(text: &str, class: Option<&str>, in_match: bool) -> hast::Node {
    if class.is_none() && !in_match {
        return hast::Node::text(text);
    }
    let mut span = Element::new("span").with_text(text);
    if let Some(class) = class {
        span.add_class(class);
    }
    if in_match {
        span.add_class("highlighted-word");
    }
    span.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rehype::test_support::render_with;

    fn highlight(source: &str) -> String {
        render_with(&Highlight::new(&PipelineOptions::default()), source)
    }

    #[test]
    fn test_rust_tokens_and_lines() {
        let html = highlight("```rust {2}\nfn main() {\n    let x = 1;\n}\n```\n");
        assert!(html.starts_with("<pre data-language=\"rust\" tabindex=\"0\"><code class=\"language-rust\">"));
        assert!(html.contains("<span class=\"line\"><span class=\""));
        assert!(html.contains("<span class=\"line highlighted\">"));
        assert!(!html.contains("data-meta"));
        assert_eq!(html.matches("class=\"line").count(), 3);
    }

    #[test]
    fn test_diff_and_markers() {
        let html = highlight("```text ins={1} del={2} error={3} warning={3}\na\nb\nc\n```\n");
        assert!(html.contains("<span class=\"line diff add\">a</span>"));
        assert!(html.contains("<span class=\"line diff remove\">b</span>"));
        assert!(html.contains("<span class=\"line error warning\">c</span>"));
    }

    #[test]
    fn test_word_pattern() {
        let html = highlight("```text /needle/\nhay needle hay\n```\n");
        assert!(html.contains("<span class=\"highlighted-word\">needle</span>"));
    }

    #[test]
    fn test_unknown_language_stays_plain() {
        let html = highlight("```nosuchlang title=\"x.nsl\"\nsome code\n```\n");
        assert_eq!(
            html,
            "<pre data-filename=\"x.nsl\" data-language=\"nosuchlang\" tabindex=\"0\"><code class=\"language-nosuchlang\">some code\n</code></pre>"
        );
    }

    #[test]
    fn test_excluded_language_untouched() {
        let html = highlight("```mermaid\ngraph TD\n```\n");
        assert_eq!(
            html,
            "<pre><code class=\"language-mermaid\">graph TD\n</code></pre>"
        );
    }

    #[test]
    fn test_alias_resolved() {
        let html = highlight("```js\nlet a = 1;\n```\n");
        assert!(html.contains("data-language=\"javascript\""));
        assert!(html.contains("<span class=\"line\">"));
    }

    #[test]
    fn test_idempotent() {
        let options = PipelineOptions::default();
        let pass = Highlight::new(&options);
        let (mut tree, _) = crate::rehype::test_support::run_pass_with(
            &pass,
            "```rust {1}\nfn main() {}\n```\n",
            &options,
        );
        let once = crate::serialize::to_html(&tree);
        let doc = crate::document::Document::new("a.md", "");
        let mut cx = RunContext::new(&doc);
        pass.run(&mut tree, &mut cx).unwrap();
        assert_eq!(crate::serialize::to_html(&tree), once);
    }
}
