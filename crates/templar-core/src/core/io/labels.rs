//! Text-level helpers for atom-map labels (`:N]` suffixes inside bracket atoms).

use std::collections::HashMap;

/// Locates the next `:digits]` label at or after `from`, returning the byte
/// range of the digits.
fn next_label(text: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while i < text.len() {
        if text[i] == b':' {
            let start = i + 1;
            let mut end = start;
            while end < text.len() && text[end].is_ascii_digit() {
                end += 1;
            }
            if end > start && end < text.len() && text[end] == b']' {
                return Some((start, end));
            }
        }
        i += 1;
    }
    None
}

/// Every map label in order of first appearance, duplicates included.
pub fn map_labels(text: &str) -> Vec<u32> {
    let bytes = text.as_bytes();
    let mut labels = Vec::new();
    let mut pos = 0;
    while let Some((start, end)) = next_label(bytes, pos) {
        if let Ok(label) = text[start..end].parse() {
            labels.push(label);
        }
        pos = end;
    }
    labels
}

/// Position of each label's first appearance, counting distinct labels.
pub fn first_appearance(text: &str) -> HashMap<u32, usize> {
    let mut order = HashMap::new();
    for label in map_labels(text) {
        let next = order.len();
        order.entry(label).or_insert(next);
    }
    order
}

/// Rewrites every map label through `f`.
pub fn relabel(text: &str, mut f: impl FnMut(u32) -> u32) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some((start, end)) = next_label(bytes, pos) {
        out.push_str(&text[pos..start]);
        match text[start..end].parse::<u32>() {
            Ok(label) => out.push_str(&f(label).to_string()),
            Err(_) => out.push_str(&text[start..end]),
        }
        pos = end;
    }
    out.push_str(&text[pos..]);
    out
}

/// Removes every map label, including its colon.
pub fn strip_map_labels(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some((start, end)) = next_label(bytes, pos) {
        out.push_str(&text[pos..start - 1]);
        pos = end;
    }
    out.push_str(&text[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_read_in_order() {
        assert_eq!(map_labels("[C:2](-[CH3:10])=[O:3]"), vec![2, 10, 3]);
    }

    #[test]
    fn first_appearance_skips_repeats() {
        let order = first_appearance("[C:7](-[O:3])>>[O:3]-[C:7].[N:1]");
        assert_eq!(order.len(), 3);
        assert_eq!(order[&7], 0);
        assert_eq!(order[&3], 1);
        assert_eq!(order[&1], 2);
    }

    #[test]
    fn aromatic_bonds_are_not_labels() {
        assert_eq!(map_labels("[cH:1]:[cH:2]:c"), vec![1, 2]);
        assert_eq!(strip_map_labels("[cH:1]:[cH:2]:c"), "[cH]:[cH]:c");
    }

    #[test]
    fn strip_removes_colon_and_digits() {
        assert_eq!(strip_map_labels("[C;H0;+0:12]-Cl"), "[C;H0;+0]-Cl");
        assert_eq!(strip_map_labels("CC"), "CC");
    }

    #[test]
    fn relabel_rewrites_each_occurrence() {
        let out = relabel("[C:5]-[O:7].[N:5]", |l| l * 10);
        assert_eq!(out, "[C:50]-[O:70].[N:50]");
    }
}
