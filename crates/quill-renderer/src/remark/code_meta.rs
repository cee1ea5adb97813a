//! Line and word decorations from code fence meta.
//!
//! | token            | effect                      |
//! |------------------|-----------------------------|
//! | `{1,3-5}`        | highlight lines             |
//! | `ins={2}`        | mark lines as inserted      |
//! | `del={3}`        | mark lines as deleted       |
//! | `error={4}`      | mark lines as errors        |
//! | `warning={5}`    | mark lines as warnings      |
//! | `/pattern/`      | highlight matching words    |
//! | `title="a.rs"`   | file name shown on the block |

use crate::error::PassError;
use crate::fence::{FenceDirectives, LineSet, consume_tokens, unquote};
use crate::mdast::Node;
use crate::pass::{MarkdownPass, RunContext};

use super::names;

/// Moves recognised meta tokens into the code node's fence directives.
#[derive(Debug, Default)]
pub struct CodeMeta;

impl MarkdownPass for CodeMeta {
    fn name(&self) -> &'static str {
        names::CODE_META
    }

    fn run(&self, tree: &mut Node, _cx: &mut RunContext<'_>) -> Result<(), PassError> {
        tree.for_each_code(&mut |code| {
            let fence = &mut code.fence;
            code.meta = consume_tokens(code.meta.as_deref(), |token| take_token(fence, token));
        });
        Ok(())
    }
}

/// Record `token` if it is understood; returns whether it was.
fn take_token(fence: &mut FenceDirectives, token: &str) -> bool {
    if token.starts_with('{') {
        return match LineSet::parse(token) {
            Some(lines) => {
                fence.highlight.extend(&lines);
                true
            }
            None => false,
        };
    }

    if token.len() > 2 && token.starts_with('/') && token.ends_with('/') {
        let pattern = token[1..token.len() - 1].replace("\\/", "/");
        fence.word_patterns.push(pattern);
        return true;
    }

    let Some((key, value)) = token.split_once('=') else {
        return false;
    };
    let value = unquote(value);
    let target = match key {
        "title" => {
            fence.title = Some(value.to_owned());
            return true;
        }
        "ins" | "add" => &mut fence.inserted,
        "del" | "remove" => &mut fence.deleted,
        "error" => &mut fence.errors,
        "warning" => &mut fence.warnings,
        _ => return false,
    };
    match LineSet::parse(value) {
        Some(lines) => {
            target.extend(&lines);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdast::{Code, NodeValue};
    use crate::remark::test_support::run_pass;
    use pretty_assertions::assert_eq;

    fn first_code(source: &str) -> Code {
        let (tree, _) = run_pass(&CodeMeta, source);
        match &tree.children[0].value {
            NodeValue::Code(code) => code.clone(),
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn test_all_tokens_consumed() {
        let code = first_code(
            "```rust {1,3-4} ins={5} del=\"6\" error={7} warning={8} /println!/ title=\"main.rs\"\nx\n```\n",
        );
        assert_eq!(code.meta, None);
        assert!(code.fence.highlight.contains(3));
        assert!(code.fence.inserted.contains(5));
        assert!(code.fence.deleted.contains(6));
        assert!(code.fence.errors.contains(7));
        assert!(code.fence.warnings.contains(8));
        assert_eq!(code.fence.word_patterns, vec!["println!"]);
        assert_eq!(code.fence.title.as_deref(), Some("main.rs"));
    }

    #[test]
    fn test_unknown_tokens_remain() {
        let code = first_code("```rust showLineNumbers {a-b}\nx\n```\n");
        assert_eq!(code.meta.as_deref(), Some("showLineNumbers {a-b}"));
        assert!(!code.fence.has_line_marks());
    }
}
