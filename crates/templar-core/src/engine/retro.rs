use super::canon::split_molecules;

/// Flattens the molecule groups of a side into one `.`-joined list.
fn flatten_side(side: &str) -> String {
    split_molecules(side).join(".")
}

/// Retrosynthetic form of a forward template `R>>P`: the flattened products
/// become the left side and the flattened reactants the right side.
///
/// Returns `None` when the text is not a two-sided template.
pub fn convert_to_retro(forward: &str) -> Option<String> {
    let (reactants, products) = forward.split_once(">>")?;
    if products.contains(">>") {
        return None;
    }
    Some(format!(
        "{}>>{}",
        flatten_side(products),
        flatten_side(reactants)
    ))
}
