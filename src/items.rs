use crate::types::{Item, Part, Size};

/// Bounds of a part that takes part in nesting, or `None` when it is hidden
/// or its bounding box is missing, non-finite or non-positive.
fn nestable_bounds(part: &Part) -> Option<Size> {
    if !part.visible {
        return None;
    }
    part.bounds.filter(Size::is_valid)
}

/// Number of items `expand_parts` would produce, without allocating them.
pub fn count_items(parts: &[Part]) -> u64 {
    parts
        .iter()
        .filter(|p| nestable_bounds(p).is_some())
        .map(|p| p.qty.max(1) as u64)
        .sum()
}

/// Expands every nestable part into one item per requested copy.
pub fn expand_parts(parts: &[Part]) -> Vec<Item> {
    let mut items = Vec::new();
    for part in parts {
        let Some(bounds) = nestable_bounds(part) else {
            continue;
        };
        for _ in 0..part.qty.max(1) {
            items.push(Item {
                part_id: part.id.clone(),
                name: part.name.clone(),
                w: bounds.w,
                h: bounds.h,
            });
        }
    }
    items
}
