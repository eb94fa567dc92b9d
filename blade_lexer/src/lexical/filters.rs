//! Filter chains in output expressions: `{{ value | name:arg, arg }}`

use super::arguments::{split_top_level, Nesting};
use crate::tokens::Filter;

/// Split an echo interior into its trimmed base value and filter chain
///
/// Only a single `|` outside quotes and brackets separates filters; `||`
/// stays part of the expression. Segments without a filter name are
/// skipped; when none remain the chain is `None`.
pub fn parse_data_expression(interior: &str) -> (String, Option<Vec<Filter>>) {
    let mut segments = split_pipes(interior).into_iter();
    let value = segments.next().unwrap_or_default().trim().to_string();
    let filters: Vec<Filter> = segments.filter_map(parse_filter).collect();

    if filters.is_empty() {
        (value, None)
    } else {
        (value, Some(filters))
    }
}

fn split_pipes(input: &str) -> Vec<&str> {
    let mut nesting = Nesting::default();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = input.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if !nesting.feed(ch) || ch != '|' {
            continue;
        }
        if let Some(&(_, '|')) = chars.peek() {
            // logical or
            chars.next();
            continue;
        }
        parts.push(&input[start..offset]);
        start = offset + 1;
    }
    parts.push(&input[start..]);
    parts
}

fn parse_filter(segment: &str) -> Option<Filter> {
    let (name, args) = segment.split_once(':').unwrap_or((segment, ""));
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut args: Vec<String> = split_top_level(args, ',')
        .into_iter()
        .map(|arg| arg.trim().to_string())
        .collect();
    // `substr:0,1,` has two arguments
    if args.last().is_some_and(String::is_empty) {
        args.pop();
    }
    Some(Filter::new(name, args))
}
