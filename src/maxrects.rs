use std::cmp::Ordering;

use crate::heuristic::{Heuristic, Score};
use crate::types::{EPSILON, Item, Placement, Rect, Sheet, Size};

/// Residual strips thinner than this are dropped after a split.
const MIN_RESIDUAL: f64 = EPSILON;

/// A gap-padded footprint anchored at the corner of one free rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub free_idx: usize,
    pub footprint: Rect,
    pub rotated: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredPlacement {
    pub candidate: Candidate,
    pub score: Score,
}

impl ScoredPlacement {
    /// Heuristic score first, then lower y, then lower x.
    fn rank(&self, other: &ScoredPlacement) -> Ordering {
        self.score
            .compare(&other.score)
            .then_with(|| self.candidate.footprint.y.total_cmp(&other.candidate.footprint.y))
            .then_with(|| self.candidate.footprint.x.total_cmp(&other.candidate.footprint.x))
    }
}

/// One sheet being filled. The free rectangles may overlap each other, but
/// together they cover exactly the area no padded placement has claimed,
/// and none of them lies inside another.
#[derive(Debug, Clone)]
pub struct MaxRectsBin {
    gap: f64,
    pub free_rects: Vec<Rect>,
    pub placements: Vec<Placement>,
    used_area: f64,
}

impl MaxRectsBin {
    pub fn new(stock: Size, gap: f64) -> Self {
        Self {
            gap,
            free_rects: vec![Rect::new(0.0, 0.0, stock.w, stock.h)],
            placements: Vec::new(),
            used_area: 0.0,
        }
    }

    /// Sum of the unpadded areas placed so far.
    pub fn used_area(&self) -> f64 {
        self.used_area
    }

    /// Every free rectangle the padded item fits into, unrotated first and
    /// then turned 90° when rotation is allowed and the item is not square.
    pub fn candidates<'a>(
        &'a self,
        item: &Item,
        allow_rotate: bool,
    ) -> impl Iterator<Item = Candidate> + 'a {
        let normal = item.size().padded(self.gap);
        let turned = (allow_rotate && !item.is_square()).then(|| normal.rotated());

        self.free_rects
            .iter()
            .enumerate()
            .flat_map(move |(free_idx, free)| {
                std::iter::once((normal, false))
                    .chain(turned.map(|s| (s, true)))
                    .filter(move |(size, _)| size.fits_in(&free.size()))
                    .map(move |(size, rotated)| Candidate {
                        free_idx,
                        footprint: Rect::new(free.x, free.y, size.w, size.h),
                        rotated,
                    })
            })
    }

    pub fn find_best(
        &self,
        item: &Item,
        allow_rotate: bool,
        heuristic: Heuristic,
    ) -> Option<ScoredPlacement> {
        let mut best: Option<ScoredPlacement> = None;

        for candidate in self.candidates(item, allow_rotate) {
            let free = &self.free_rects[candidate.free_idx];
            let scored = ScoredPlacement {
                candidate,
                score: heuristic.score(free, candidate.footprint.size()),
            };
            if best.is_none_or(|b| scored.rank(&b) == Ordering::Less) {
                best = Some(scored);
            }
        }

        best
    }

    /// Records the item at the scored footprint and carves the footprint out
    /// of the free space.
    pub fn place(&mut self, scored: ScoredPlacement, item: Item) -> &Placement {
        let footprint = scored.candidate.footprint;
        let (w, h) = if scored.candidate.rotated {
            (item.h, item.w)
        } else {
            (item.w, item.h)
        };

        let placement = Placement {
            part_id: item.part_id,
            name: item.name,
            x: footprint.x + self.gap,
            y: footprint.y + self.gap,
            w,
            h,
            rotated: scored.candidate.rotated,
            gap: self.gap,
        };
        self.used_area += placement.area();

        split(&mut self.free_rects, &footprint);
        prune(&mut self.free_rects);

        let idx = self.placements.len();
        self.placements.push(placement);
        &self.placements[idx]
    }

    pub fn into_sheet(self) -> Sheet {
        Sheet {
            placements: self.placements,
            used_area: self.used_area,
        }
    }
}

/// Replaces every free rectangle that overlaps `placed` with the strips of
/// it lying below, above, left and right of `placed`.
pub fn split(free_rects: &mut Vec<Rect>, placed: &Rect) {
    let mut residuals = Vec::new();
    free_rects.retain(|free| {
        if !free.intersects(placed) {
            return true;
        }
        residuals.extend(slice(free, placed));
        false
    });
    free_rects.extend(residuals);
}

fn slice(free: &Rect, cut: &Rect) -> impl Iterator<Item = Rect> {
    let strips = [
        (cut.y > free.y).then(|| Rect::new(free.x, free.y, free.w, cut.y - free.y)),
        (cut.top() < free.top())
            .then(|| Rect::new(free.x, cut.top(), free.w, free.top() - cut.top())),
        (cut.x > free.x).then(|| Rect::new(free.x, free.y, cut.x - free.x, free.h)),
        (cut.right() < free.right())
            .then(|| Rect::new(cut.right(), free.y, free.right() - cut.right(), free.h)),
    ];
    strips
        .into_iter()
        .flatten()
        .filter(|r| r.w >= MIN_RESIDUAL && r.h >= MIN_RESIDUAL)
}

/// Drops every rectangle contained in another one.
/// Of two identical rectangles the earlier one survives.
///
/// One pass is enough: containment is transitive, so a rectangle that is not
/// maximal always has a maximal container still in the list when it is
/// checked, and removals never make a kept rectangle contained.
pub fn prune(free_rects: &mut Vec<Rect>) {
    let mut i = 0;
    while i < free_rects.len() {
        let current = free_rects[i];
        let redundant = free_rects.iter().enumerate().any(|(j, other)| {
            j != i && other.contains(&current) && (j < i || !current.contains(other))
        });
        if redundant {
            free_rects.remove(i);
        } else {
            i += 1;
        }
    }
}
