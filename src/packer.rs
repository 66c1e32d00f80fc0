use tracing::trace;

use crate::error::{NestError, Result};
use crate::heuristic::Heuristic;
use crate::maxrects::MaxRectsBin;
use crate::types::{Item, Sheet, Size};

/// Geometry shared by every sheet of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetSpec {
    pub stock: Size,
    pub gap: f64,
    pub allow_rotate: bool,
}

impl SheetSpec {
    /// Whether the padded item fits an empty sheet in some allowed orientation.
    pub fn admits(&self, item: &Item) -> bool {
        let padded = item.size().padded(self.gap);
        padded.fits_in(&self.stock)
            || (self.allow_rotate && !item.is_square() && padded.rotated().fits_in(&self.stock))
    }
}

/// Result of filling one sheet.
#[derive(Debug, Clone)]
pub struct SheetPass {
    pub sheet: Sheet,
    /// Items that did not fit, in their original relative order.
    pub unplaced: Vec<Item>,
}

/// Greedily places `items` in order onto one fresh sheet.
pub fn pack_sheet(items: Vec<Item>, heuristic: Heuristic, spec: &SheetSpec) -> SheetPass {
    let mut bin = MaxRectsBin::new(spec.stock, spec.gap);
    let mut unplaced = Vec::new();

    for item in items {
        match bin.find_best(&item, spec.allow_rotate, heuristic) {
            Some(scored) => {
                let p = bin.place(scored, item);
                trace!(part = %p.name, x = p.x, y = p.y, rotated = p.rotated, "placed");
            }
            None => unplaced.push(item),
        }
    }

    SheetPass {
        sheet: bin.into_sheet(),
        unplaced,
    }
}

/// Fails with the first item that no empty sheet can hold.
pub fn check_feasible(items: &[Item], spec: &SheetSpec) -> Result<()> {
    match items.iter().find(|item| !spec.admits(item)) {
        Some(item) => Err(NestError::InfeasibleItem {
            part_id: item.part_id.clone(),
            name: item.name.clone(),
            width: item.w,
            height: item.h,
        }),
        None => Ok(()),
    }
}

/// Opens sheets one after another until every item is placed.
pub fn pack_sheets(items: Vec<Item>, heuristic: Heuristic, spec: &SheetSpec) -> Result<Vec<Sheet>> {
    check_feasible(&items, spec)?;
    fill_sheets(items, heuristic, spec)
}

/// `pack_sheets` without the pre-flight check; callers must have run it.
pub(crate) fn fill_sheets(
    items: Vec<Item>,
    heuristic: Heuristic,
    spec: &SheetSpec,
) -> Result<Vec<Sheet>> {
    let mut sheets = Vec::new();
    let mut remaining = items;

    while !remaining.is_empty() {
        let before = remaining.len();
        let pass = pack_sheet(remaining, heuristic, spec);
        if pass.unplaced.len() >= before {
            return Err(NestError::InternalPackingInvariantViolation {
                sheet: sheets.len(),
                remaining: before,
            });
        }
        sheets.push(pass.sheet);
        remaining = pass.unplaced;
    }

    Ok(sheets)
}
