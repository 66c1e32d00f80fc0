use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::Item;

/// Initial processing order of the items for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortStrategy {
    /// Area descending, then longest side descending.
    #[default]
    AreaDesc,
    /// Longest side descending, then area descending.
    MaxSideDesc,
    /// Aspect ratio descending, then area descending.
    AspectDesc,
}

impl SortStrategy {
    pub const ALL: [SortStrategy; 3] = [
        SortStrategy::AreaDesc,
        SortStrategy::MaxSideDesc,
        SortStrategy::AspectDesc,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortStrategy::AreaDesc => "area-desc",
            SortStrategy::MaxSideDesc => "max-side-desc",
            SortStrategy::AspectDesc => "aspect-desc",
        }
    }

    /// Total order over items. After the strategy's own keys, width and then
    /// height (both descending) separate items of different shape.
    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let primary = match self {
            SortStrategy::AreaDesc => b
                .area()
                .total_cmp(&a.area())
                .then_with(|| b.max_side().total_cmp(&a.max_side())),
            SortStrategy::MaxSideDesc => b
                .max_side()
                .total_cmp(&a.max_side())
                .then_with(|| b.area().total_cmp(&a.area())),
            SortStrategy::AspectDesc => b
                .aspect_ratio()
                .total_cmp(&a.aspect_ratio())
                .then_with(|| b.area().total_cmp(&a.area())),
        };
        primary
            .then_with(|| b.w.total_cmp(&a.w))
            .then_with(|| b.h.total_cmp(&a.h))
    }

    /// Stable sort, so identical shapes keep their input order.
    pub fn sort(&self, items: &mut [Item]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl std::fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
