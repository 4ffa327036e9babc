//! Order- and label-independent text form of templates.
//!
//! A side is written as `(m1).(m2)...`, one parenthesized group per
//! molecule, with disconnected pieces of one molecule separated by `.`
//! inside its group. Sorting happens on label-stripped text so that two
//! extractions of the same chemistry agree before labels are renumbered.

use crate::core::io::labels::{relabel, strip_map_labels};
use std::collections::HashMap;

/// Splits a side into its molecule groups, without the wrapping parentheses.
/// Text outside any group counts as one group.
pub(crate) fn split_molecules(side: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in side.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                groups.push(unwrap_group(&side[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    groups.push(unwrap_group(&side[start..]));
    groups.retain(|g| !g.is_empty());
    groups
}

/// Drops one pair of parentheses enclosing the whole of `text`.
fn unwrap_group(text: &str) -> &str {
    if !(text.starts_with('(') && text.ends_with(')')) {
        return text;
    }
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i + 1 != text.len() {
                    return text;
                }
            }
            _ => {}
        }
    }
    &text[1..text.len() - 1]
}

/// Stable sort of labeled texts by their label-stripped form.
fn sort_by_bare(texts: Vec<String>) -> Vec<(String, String)> {
    let mut keyed: Vec<(String, String)> = texts
        .into_iter()
        .map(|t| (strip_map_labels(&t), t))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed
}

/// Orders the pieces inside each molecule, then the molecules themselves,
/// both by label-stripped text.
pub fn canonicalize_side(side: &str) -> String {
    let molecules: Vec<String> = split_molecules(side)
        .into_iter()
        .map(|molecule| {
            let pieces = molecule.split('.').map(str::to_string).collect();
            sort_by_bare(pieces)
                .into_iter()
                .map(|(_, labeled)| labeled)
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect();
    let sorted: Vec<String> = sort_by_bare(molecules)
        .into_iter()
        .map(|(_, labeled)| format!("({labeled})"))
        .collect();
    sorted.join(".")
}

/// Renumbers map labels 1, 2, ... in order of first appearance.
pub fn renumber_map_labels(text: &str) -> String {
    let mut assigned: HashMap<u32, u32> = HashMap::new();
    relabel(text, |label| {
        let next = assigned.len() as u32 + 1;
        *assigned.entry(label).or_insert(next)
    })
}

/// Canonical form of a `reactants>>products` template.
pub fn canonicalize_template(template: &str) -> String {
    let sides: Vec<String> = template.split(">>").map(canonicalize_side).collect();
    renumber_map_labels(&sides.join(">>"))
}
