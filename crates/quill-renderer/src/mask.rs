//! Source masking ahead of pulldown-cmark.
//!
//! Some syntax has to reach the passes exactly as typed, but pulldown-cmark
//! would read it as markdown first. The parser reads a masked copy of the
//! source instead. The copy has the same byte length, so every offset still
//! indexes the original:
//!
//! - Directive fence and leaf lines become thematic breaks, so they always
//!   stand alone as blocks. A line starting with `:` right after a paragraph
//!   would otherwise open a definition list.
//! - The body of inline math becomes neutral filler, so backslashes and
//!   emphasis markers inside it are left alone.
//!
//! The tree builder reads the text of masked ranges back from the original.

use std::ops::Range;

use crate::directive::{parse_fence_line, parse_leaf_line};
use crate::source::inline_math_spans;

/// Replacement for directive lines. A line of stars is a thematic break.
const BREAK: char = '*';

/// Replacement for inline math bodies.
const FILLER: char = 'x';

/// Masked copy of `source`, or `None` when nothing needed masking.
#[must_use]
pub(crate) fn mask(source: &str, single_dollar: bool) -> Option<String> {
    let mut masked: Option<String> = None;
    let mut fence: Option<(u8, usize)> = None;
    let mut chunk: Option<Range<usize>> = None;
    let mut offset = 0;

    for line in source.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);
        let body = content.trim_start_matches(|c: char| c == '>' || c.is_whitespace());

        if let Some(open) = fence {
            if closes_fence(body, open) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = opens_fence(body) {
            mask_math(source, chunk.take(), single_dollar, &mut masked);
            fence = Some(open);
            continue;
        }
        if parse_fence_line(body).is_some() || parse_leaf_line(body).is_some() {
            mask_math(source, chunk.take(), single_dollar, &mut masked);
            let end = start + content.len();
            fill(&mut masked, source, end - body.len()..end, |_| BREAK);
            continue;
        }
        if body.is_empty() {
            mask_math(source, chunk.take(), single_dollar, &mut masked);
            continue;
        }
        chunk = Some(chunk.map_or(start..offset, |c| c.start..offset));
    }
    mask_math(source, chunk, single_dollar, &mut masked);
    masked
}

/// Mask inline math bodies within a run of non-blank lines.
fn mask_math(
    source: &str,
    chunk: Option<Range<usize>>,
    single_dollar: bool,
    masked: &mut Option<String>,
) {
    let Some(chunk) = chunk else {
        return;
    };
    let text = &source[chunk.clone()];
    if !text.contains('$') {
        return;
    }

    let code = code_spans(text);
    for body in inline_math_spans(text, single_dollar) {
        if code.iter().any(|c| c.start < body.end && body.start < c.end) {
            continue;
        }
        let range = chunk.start + body.start..chunk.start + body.end;
        fill(masked, source, range, |c| match c {
            '\n' | '\r' => c,
            _ => FILLER,
        });
    }
}

/// Overwrite `range` character by character, keeping the byte length.
///
/// `with` must return an ASCII character.
fn fill(masked: &mut Option<String>, source: &str, range: Range<usize>, with: impl Fn(char) -> char) {
    let filled: String = source[range.clone()]
        .chars()
        .flat_map(|c| std::iter::repeat_n(with(c), c.len_utf8()))
        .collect();
    masked
        .get_or_insert_with(|| source.to_owned())
        .replace_range(range, &filled);
}

/// Backtick or tilde fence opening a code block.
fn opens_fence(body: &str) -> Option<(u8, usize)> {
    let marker = *body.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let count = body.bytes().take_while(|&b| b == marker).count();
    (count >= 3).then_some((marker, count))
}

fn closes_fence(body: &str, (marker, count): (u8, usize)) -> bool {
    let body = body.trim_end();
    body.len() >= count && body.bytes().all(|b| b == marker)
}

/// Byte ranges of inline code spans, backticks included.
fn code_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let run_at = |i: usize| bytes[i..].iter().take_while(|&&b| b == b'`').count();

    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let open = i;
                let len = run_at(i);
                i += len;
                let mut j = i;
                while j < bytes.len() {
                    if bytes[j] != b'`' {
                        j += 1;
                        continue;
                    }
                    let close = run_at(j);
                    if close == len {
                        spans.push(open..j + close);
                        i = j + close;
                        break;
                    }
                    j += close;
                }
            }
            _ => i += 1,
        }
    }
    spans
}
