//! Grid tables drawn with `+`, `-`, `=` and `|`.
//!
//! ```text
//! +-------+-------+
//! | Head  | Head  |
//! +=======+=======+
//! | Spans both    |
//! +-------+-------+
//! ```
//!
//! A `=` border separates header rows from body rows. A cell spans
//! columns when its row has no `|` at the inner boundaries. Cell content
//! is parsed as markdown; a lone paragraph is unwrapped to its inlines.

use std::collections::BTreeSet;

use crate::error::PassError;
use crate::mdast::{Node, NodeValue};
use crate::parse::parse_fragment;
use crate::pass::{MarkdownPass, RunContext};
use crate::source::{dedent, raw_lines};

use super::names;

/// Converts grid table paragraphs into grid table nodes.
#[derive(Debug, Default)]
pub struct GridTables;

impl MarkdownPass for GridTables {
    fn name(&self) -> &'static str {
        names::GRID_TABLES
    }

    fn run(&self, tree: &mut Node, cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let source = cx.source();
        tree.rewrite_children(&mut |children| {
            for child in children.iter_mut() {
                if !matches!(child.value, NodeValue::Paragraph) {
                    continue;
                }
                let Some(lines) = raw_lines(source, child) else {
                    continue;
                };
                if let Some(table) = parse_grid(&lines) {
                    *child = table.with_position(child.position);
                }
            }
        });
        Ok(())
    }
}

fn is_border(line: &str) -> bool {
    line.len() >= 3
        && line.starts_with('+')
        && line.ends_with('+')
        && line.chars().all(|c| matches!(c, '+' | '-' | '=' | ':'))
        && line.contains(['-', '='])
}

/// Parse a grid table, or `None` if the lines are not one.
fn parse_grid(lines: &[String]) -> Option<Node> {
    let lines: Vec<Vec<char>> = lines.iter().map(|l| l.trim().chars().collect()).collect();
    let text = |line: &[char]| line.iter().collect::<String>();

    let first = lines.first()?;
    let last = lines.last()?;
    if lines.len() < 3 || !is_border(&text(first)) || !is_border(&text(last)) {
        return None;
    }
    if lines
        .iter()
        .any(|l| !(l.first() == Some(&'+') || l.first() == Some(&'|')))
    {
        return None;
    }

    // Column boundaries are the union of `+` positions on all borders.
    let width = first.len();
    let mut boundaries = BTreeSet::new();
    for line in lines.iter().filter(|l| is_border(&text(l))) {
        if line.len() != width {
            return None;
        }
        boundaries.extend(
            line.iter()
                .enumerate()
                .filter(|(_, c)| **c == '+')
                .map(|(i, _)| i),
        );
    }
    let boundaries: Vec<usize> = boundaries.into_iter().collect();

    let header_rows = header_row_count(&lines, text);
    let mut rows = Vec::new();
    let mut block: Vec<&[char]> = Vec::new();
    for line in &lines[1..] {
        if is_border(&text(line)) {
            if block.is_empty() {
                return None;
            }
            let header = rows.len() < header_rows;
            rows.push(parse_row(&block, &boundaries, header)?);
            block.clear();
        } else {
            block.push(line);
        }
    }
    if rows.is_empty() {
        return None;
    }

    Some(Node::new(NodeValue::GridTable).with_children(rows))
}

/// Number of rows above the `=` border, zero when there is none.
fn header_row_count(lines: &[Vec<char>], text: impl Fn(&[char]) -> String) -> usize {
    let mut rows = 0;
    for line in &lines[1..] {
        let line = text(line);
        if !is_border(&line) {
            continue;
        }
        rows += 1;
        if line.contains('=') {
            return rows;
        }
    }
    0
}

fn parse_row(block: &[&[char]], boundaries: &[usize], header: bool) -> Option<Node> {
    let width = boundaries.last().copied()? + 1;
    if block.iter().any(|line| line.len() != width) {
        return None;
    }

    // A boundary separates cells in this row only if every line has a `|` there.
    let present: Vec<usize> = boundaries
        .iter()
        .copied()
        .filter(|&b| block.iter().all(|line| line[b] == '|'))
        .collect();
    if present.first() != boundaries.first() || present.last() != boundaries.last() {
        return None;
    }

    let mut cells = Vec::new();
    for pair in present.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let colspan = boundaries.iter().filter(|&&b| b > start && b <= end).count();
        let content: Vec<String> = block
            .iter()
            .map(|line| line[start + 1..end].iter().collect::<String>().trim_end().to_owned())
            .collect();
        let content: Vec<&str> = content.iter().map(String::as_str).collect();
        let colspan = u32::try_from(colspan).unwrap_or(u32::MAX);
        cells.push(
            Node::new(NodeValue::TableCell { colspan }).with_children(cell_children(&dedent(&content))),
        );
    }

    Some(Node::new(NodeValue::TableRow { header }).with_children(cells))
}

fn cell_children(markdown: &str) -> Vec<Node> {
    let mut children = parse_fragment(markdown.trim_matches('\n'));
    if children.len() == 1 && matches!(children[0].value, NodeValue::Paragraph) {
        return children.remove(0).children;
    }
    children
}
