//! Generic directive syntax.
//!
//! Directives are a single extension point for semantic content:
//!
//! - Text: `:name[label]{attrs}` inside a paragraph
//! - Leaf: `::name[label]{attrs}` on its own line
//! - Container: `:::name[label]{attrs}` ... `:::`
//!
//! This module only parses the syntax. The markdown directive pass turns
//! matches into tree nodes and later passes key off the directive name.

mod args;
mod parser;

pub use args::DirectiveArgs;
pub use parser::{
    FenceLine, TextMatch, find_text_directive, parse_attr_block, parse_fence_line, parse_leaf_line,
};
