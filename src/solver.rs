use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::NestConfig;
use crate::error::{NestError, Result};
use crate::heuristic::Heuristic;
use crate::items::{count_items, expand_parts};
use crate::packer::{SheetSpec, check_feasible, fill_sheets};
use crate::sort::SortStrategy;
use crate::types::{Item, Part, Plan, Size};

/// Utilizations closer than this are treated as equal when ranking plans.
const UTILIZATION_TOLERANCE: f64 = 1e-9;

/// The (ordering, heuristic) pair a plan was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Strategy {
    pub sort: SortStrategy,
    pub heuristic: Heuristic,
}

impl Strategy {
    pub fn new(sort: SortStrategy, heuristic: Heuristic) -> Self {
        Self { sort, heuristic }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.sort, self.heuristic)
    }
}

fn cmp_utilization(a: f64, b: f64) -> Ordering {
    if (a - b).abs() <= UTILIZATION_TOLERANCE {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

impl Plan {
    /// Fewer sheets, then higher overall utilization, then a fuller first sheet.
    pub fn is_better_than(&self, other: &Plan) -> bool {
        let ranking = self
            .sheet_count()
            .cmp(&other.sheet_count())
            .then_with(|| cmp_utilization(other.utilization(), self.utilization()))
            .then_with(|| {
                cmp_utilization(
                    other.first_sheet_utilization(),
                    self.first_sheet_utilization(),
                )
            });
        ranking == Ordering::Less
    }
}

/// Runs every configured (ordering, heuristic) trial and keeps the best plan.
pub struct Solver {
    stock: Size,
    config: NestConfig,
    parts: Vec<Part>,
}

impl Solver {
    pub fn new(stock: Size, config: NestConfig, parts: Vec<Part>) -> Self {
        Self {
            stock,
            config,
            parts,
        }
    }

    fn spec(&self) -> SheetSpec {
        SheetSpec {
            stock: self.stock,
            gap: self.config.effective_gap(),
            allow_rotate: self.config.allow_rotate,
        }
    }

    /// Material, ceiling and feasibility checks, in that order. Returns the
    /// expanded items once all pass.
    fn prepare(&self) -> Result<Vec<Item>> {
        if !self.stock.is_valid() {
            warn!(stock = %self.stock, "rejecting invalid material");
            return Err(NestError::InvalidMaterial {
                width: self.stock.w,
                height: self.stock.h,
            });
        }

        let count = count_items(&self.parts);
        if count > self.config.max_items {
            warn!(count, max = self.config.max_items, "rejecting oversized run");
            return Err(NestError::ItemCeilingExceeded {
                count,
                max: self.config.max_items,
            });
        }

        let items = expand_parts(&self.parts);
        if let Err(e) = check_feasible(&items, &self.spec()) {
            warn!(error = %e, "rejecting infeasible run");
            return Err(e);
        }
        Ok(items)
    }

    fn run_trial(&self, mut items: Vec<Item>, strategy: Strategy) -> Result<Plan> {
        strategy.sort.sort(&mut items);
        let sheets = fill_sheets(items, strategy.heuristic, &self.spec())?;
        let plan = Plan {
            stock: self.stock,
            sheets,
            strategy,
        };
        debug!(
            %strategy,
            sheets = plan.sheet_count(),
            utilization = plan.utilization(),
            "trial finished"
        );
        Ok(plan)
    }

    pub fn solve(&self) -> Result<Plan> {
        let items = self.prepare()?;
        if items.is_empty() {
            return Ok(Plan {
                stock: self.stock,
                sheets: vec![],
                strategy: Strategy::default(),
            });
        }

        let mut best: Option<Plan> = None;
        for sort in self.config.effective_sort_strategies() {
            for heuristic in self.config.effective_heuristics() {
                let plan = self.run_trial(items.clone(), Strategy::new(sort, heuristic))?;
                if best.as_ref().is_none_or(|b| plan.is_better_than(b)) {
                    best = Some(plan);
                }
            }
        }

        let best = best.ok_or(NestError::InternalPackingInvariantViolation {
            sheet: 0,
            remaining: items.len(),
        })?;
        info!(
            strategy = %best.strategy,
            sheets = best.sheet_count(),
            utilization = best.utilization(),
            "nesting finished"
        );
        Ok(best)
    }

    /// Runs a single trial with the given pair instead of searching.
    pub fn solve_with(&self, strategy: Strategy) -> Result<Plan> {
        let items = self.prepare()?;
        self.run_trial(items, strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EPSILON, Placement};

    fn part(id: &str, w: f64, h: f64, qty: u32) -> Part {
        Part::new(id, format!("{id}.dxf"), w, h, qty)
    }

    fn solve(stock: Size, gap: f64, rotate: bool, parts: Vec<Part>) -> Result<Plan> {
        let config = NestConfig::new().with_gap(gap).with_rotation(rotate);
        Solver::new(stock, config, parts).solve()
    }

    /// Validates a complete plan:
    /// 1. Every padded placement lies on its sheet
    /// 2. No two padded placements on the same sheet overlap
    /// 3. Placement count and used-area bookkeeping are consistent
    fn assert_plan_valid(plan: &Plan, expected_pieces: usize) {
        assert_eq!(
            plan.placement_count(),
            expected_pieces,
            "expected {} pieces placed, got {}",
            expected_pieces,
            plan.placement_count()
        );

        for (si, sheet) in plan.sheets.iter().enumerate() {
            for (pi, p) in sheet.placements.iter().enumerate() {
                let r = p.padded_rect();
                assert!(
                    r.x >= -EPSILON
                        && r.y >= -EPSILON
                        && r.right() <= plan.stock.w + EPSILON
                        && r.top() <= plan.stock.h + EPSILON,
                    "sheet {si}, piece {pi} ({}) leaves the sheet: {r:?}",
                    p.name
                );
            }
            assert_no_overlaps(si, &sheet.placements);

            let used: f64 = sheet.placements.iter().map(|p| p.area()).sum();
            assert!((used - sheet.used_area).abs() < 1e-6);
        }

        let util = plan.utilization();
        assert!((0.0..=1.0).contains(&util));
    }

    fn assert_no_overlaps(sheet_idx: usize, placements: &[Placement]) {
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                let a = placements[i].padded_rect();
                let b = placements[j].padded_rect();
                assert!(
                    !a.intersects(&b),
                    "sheet {sheet_idx}: piece {i} {a:?} overlaps piece {j} {b:?}"
                );
            }
        }
    }

    #[test]
    fn test_six_pieces_fit_one_sheet() {
        let plan = solve(
            Size::new(1000.0, 1000.0),
            0.0,
            false,
            vec![part("p", 400.0, 300.0, 6)],
        )
        .unwrap();
        assert_plan_valid(&plan, 6);
        assert_eq!(plan.sheet_count(), 1);
        assert_eq!(plan.sheets[0].used_area, 720_000.0);
        assert!((plan.utilization() - 0.72).abs() < 1e-9);
        assert!(plan.sheets[0].placements.iter().all(|p| !p.rotated));
    }

    #[test]
    fn test_oversized_item_is_infeasible() {
        let err = solve(
            Size::new(500.0, 500.0),
            5.0,
            false,
            vec![part("long", 600.0, 100.0, 1)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            NestError::InfeasibleItem {
                part_id: "long".into(),
                name: "long.dxf".into(),
                width: 600.0,
                height: 100.0,
            }
        );
    }

    #[test]
    fn test_mixed_sizes_with_gap_and_rotation() {
        let plan = solve(
            Size::new(1000.0, 1000.0),
            2.0,
            true,
            vec![part("small", 300.0, 300.0, 4), part("big", 700.0, 700.0, 1)],
        )
        .unwrap();
        assert_plan_valid(&plan, 5);
        // 704 + 304 > 1000, so the big square cannot share a sheet with a small one
        assert_eq!(plan.sheet_count(), 2);
        let expected = 4.0 * 90_000.0 + 490_000.0;
        assert!((plan.total_used_area() - expected).abs() < 1e-6);
        assert!((plan.utilization() - expected / 2_000_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_search_never_worse_than_single_trials() {
        let stock = Size::new(1200.0, 800.0);
        let parts = vec![
            part("a", 500.0, 300.0, 3),
            part("b", 250.0, 120.0, 7),
            part("c", 700.0, 90.0, 4),
            part("d", 180.0, 180.0, 5),
        ];
        let solver = Solver::new(stock, NestConfig::new().with_gap(3.0), parts);

        let area_bssf = solver
            .solve_with(Strategy::new(SortStrategy::AreaDesc, Heuristic::BestShortSideFit))
            .unwrap();
        let aspect_bl = solver
            .solve_with(Strategy::new(SortStrategy::AspectDesc, Heuristic::BottomLeft))
            .unwrap();
        let best = solver.solve().unwrap();

        assert_plan_valid(&area_bssf, 19);
        assert_plan_valid(&aspect_bl, 19);
        assert_plan_valid(&best, 19);
        assert!(best.sheet_count() <= area_bssf.sheet_count());
        assert!(best.sheet_count() <= aspect_bl.sheet_count());
        assert!(!area_bssf.is_better_than(&best));
        assert!(!aspect_bl.is_better_than(&best));
    }

    #[test]
    fn test_deterministic() {
        let parts = vec![
            part("a", 320.0, 210.0, 5),
            part("b", 90.0, 450.0, 3),
            part("c", 120.0, 120.0, 9),
        ];
        let run = || {
            solve(Size::new(1000.0, 600.0), 1.5, true, parts.clone()).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_larger_sheet_needs_no_more_sheets() {
        let parts = vec![part("sq", 300.0, 300.0, 10)];
        let small = solve(Size::new(1000.0, 1000.0), 0.0, true, parts.clone()).unwrap();
        let large = solve(Size::new(1200.0, 1200.0), 0.0, true, parts).unwrap();
        assert_plan_valid(&small, 10);
        assert_plan_valid(&large, 10);
        assert_eq!(small.sheet_count(), 2);
        assert_eq!(large.sheet_count(), 1);
    }

    #[test]
    fn test_rotation_only_when_allowed() {
        let parts = vec![part("tall", 100.0, 400.0, 3), part("sq", 100.0, 100.0, 4)];

        let fixed = solve(Size::new(450.0, 300.0), 0.0, false, parts.clone());
        assert!(matches!(fixed, Err(NestError::InfeasibleItem { .. })));

        let plan = solve(Size::new(450.0, 300.0), 0.0, true, parts).unwrap();
        assert_plan_valid(&plan, 7);
        for p in plan.sheets.iter().flat_map(|s| &s.placements) {
            if p.part_id == "sq" {
                assert!(!p.rotated);
            } else {
                assert!(p.rotated);
                assert_eq!((p.w, p.h), (400.0, 100.0));
            }
        }
    }

    #[test]
    fn test_invalid_material() {
        let err = solve(Size::new(0.0, 100.0), 0.0, true, vec![part("a", 1.0, 1.0, 1)]).unwrap_err();
        assert_eq!(
            err,
            NestError::InvalidMaterial {
                width: 0.0,
                height: 100.0
            }
        );
    }

    #[test]
    fn test_item_ceiling() {
        let solver = Solver::new(
            Size::new(1000.0, 1000.0),
            NestConfig::new().with_max_items(10),
            vec![part("a", 10.0, 10.0, 6), part("b", 10.0, 10.0, 5)],
        );
        assert_eq!(
            solver.solve().unwrap_err(),
            NestError::ItemCeilingExceeded { count: 11, max: 10 }
        );
    }

    #[test]
    fn test_ceiling_checked_before_feasibility() {
        let solver = Solver::new(
            Size::new(100.0, 100.0),
            NestConfig::new().with_max_items(1),
            vec![part("huge", 1000.0, 1000.0, 2)],
        );
        assert!(matches!(
            solver.solve(),
            Err(NestError::ItemCeilingExceeded { .. })
        ));
    }

    #[test]
    fn test_no_parts_gives_empty_plan() {
        let plan = solve(Size::new(100.0, 100.0), 0.0, true, vec![]).unwrap();
        assert_eq!(plan.sheet_count(), 0);
        assert_eq!(plan.utilization(), 0.0);
    }

    #[test]
    fn test_restricted_search_reports_its_strategy() {
        let config = NestConfig::new()
            .with_sort_strategies(vec![SortStrategy::MaxSideDesc])
            .with_heuristics(vec![Heuristic::BestAreaFit]);
        let plan = Solver::new(Size::new(100.0, 100.0), config, vec![part("a", 30.0, 20.0, 3)])
            .solve()
            .unwrap();
        assert_eq!(
            plan.strategy,
            Strategy::new(SortStrategy::MaxSideDesc, Heuristic::BestAreaFit)
        );
        assert_eq!(plan.strategy.to_string(), "max-side-desc/baf");
    }

    #[test]
    fn test_plan_ranking() {
        let stock = Size::new(100.0, 100.0);
        let sheet = |used: f64| crate::types::Sheet {
            placements: vec![],
            used_area: used,
        };
        let plan = |sheets| Plan {
            stock,
            sheets,
            strategy: Strategy::default(),
        };

        let one = plan(vec![sheet(5000.0)]);
        let two = plan(vec![sheet(9000.0), sheet(1000.0)]);
        let two_front_loaded = plan(vec![sheet(9500.0), sheet(500.0)]);

        assert!(one.is_better_than(&two));
        assert!(!two.is_better_than(&one));
        assert!(two_front_loaded.is_better_than(&two));
        assert!(!two.is_better_than(&two.clone()));
    }

    /// 30 pieces, 6 sizes, 2440x1220 plywood, 3 mm gap.
    #[test]
    fn test_plywood_batch() {
        let parts = vec![
            part("a", 800.0, 600.0, 5),
            part("b", 400.0, 300.0, 8),
            part("c", 600.0, 400.0, 4),
            part("d", 1200.0, 600.0, 3),
            part("e", 300.0, 200.0, 6),
            part("f", 500.0, 500.0, 4),
        ];
        let plan = solve(Size::new(2440.0, 1220.0), 3.0, true, parts).unwrap();
        assert_plan_valid(&plan, 30);

        let total_area = plan.total_used_area();
        let min_sheets = (total_area / (2440.0 * 1220.0)).ceil() as usize;
        assert!(plan.sheet_count() >= min_sheets);
    }
}
