use serde::{Deserialize, Serialize};

use crate::heuristic::Heuristic;
use crate::sort::SortStrategy;
use crate::types::{Part, Size};

/// Tunables of a nesting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestConfig {
    /// Clearance in mm kept free on every side of each part.
    pub gap: f64,
    /// Allow turning non-square parts by 90°.
    pub allow_rotate: bool,
    /// Upper bound on the number of expanded items.
    pub max_items: u64,
    /// Orderings tried by the search. Empty means all of them.
    pub sort_strategies: Vec<SortStrategy>,
    /// Heuristics tried by the search. Empty means all of them.
    pub heuristics: Vec<Heuristic>,
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            gap: 0.0,
            allow_rotate: true,
            max_items: 10_000,
            sort_strategies: SortStrategy::ALL.to_vec(),
            heuristics: Heuristic::ALL.to_vec(),
        }
    }
}

impl NestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_rotation(mut self, allow_rotate: bool) -> Self {
        self.allow_rotate = allow_rotate;
        self
    }

    pub fn with_max_items(mut self, max_items: u64) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_sort_strategies(mut self, strategies: Vec<SortStrategy>) -> Self {
        self.sort_strategies = strategies;
        self
    }

    pub fn with_heuristics(mut self, heuristics: Vec<Heuristic>) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// The gap actually used: negative or NaN input counts as no gap.
    pub fn effective_gap(&self) -> f64 {
        if self.gap.is_finite() && self.gap > 0.0 {
            self.gap
        } else {
            0.0
        }
    }

    pub fn effective_sort_strategies(&self) -> Vec<SortStrategy> {
        if self.sort_strategies.is_empty() {
            SortStrategy::ALL.to_vec()
        } else {
            self.sort_strategies.clone()
        }
    }

    pub fn effective_heuristics(&self) -> Vec<Heuristic> {
        if self.heuristics.is_empty() {
            Heuristic::ALL.to_vec()
        } else {
            self.heuristics.clone()
        }
    }
}

/// A complete nesting request: the stock sheet, the parts and the settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestJob {
    pub sheet: Size,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(flatten)]
    pub config: NestConfig,
}
