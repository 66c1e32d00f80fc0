use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{Rect, Size};

/// Rule for ranking the free rectangles an item could go into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Heuristic {
    #[default]
    BestShortSideFit,
    BestAreaFit,
    BottomLeft,
}

/// Ranking tuple for one candidate; lower is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score(pub [f64; 3]);

impl Score {
    pub fn compare(&self, other: &Score) -> Ordering {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl Heuristic {
    pub const ALL: [Heuristic; 3] = [
        Heuristic::BestShortSideFit,
        Heuristic::BestAreaFit,
        Heuristic::BottomLeft,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Heuristic::BestShortSideFit => "bssf",
            Heuristic::BestAreaFit => "baf",
            Heuristic::BottomLeft => "bl",
        }
    }

    /// Scores placing a footprint of `padded` size at the corner of `free`.
    /// The footprint must fit.
    pub fn score(&self, free: &Rect, padded: Size) -> Score {
        let leftover_w = free.w - padded.w;
        let leftover_h = free.h - padded.h;
        let leftover_area = free.area() - padded.area();
        let short = leftover_w.min(leftover_h);
        let long = leftover_w.max(leftover_h);

        match self {
            Heuristic::BestShortSideFit => Score([short, long, leftover_area]),
            Heuristic::BestAreaFit => Score([leftover_area, short, long]),
            Heuristic::BottomLeft => Score([free.y, free.x, leftover_area]),
        }
    }
}

impl std::fmt::Display for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
