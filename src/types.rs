use serde::{Deserialize, Deserializer, Serialize};

use crate::solver::Strategy;

/// Tolerance in millimetres for fit, overlap and containment tests.
pub const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Size) -> bool {
        self.w <= other.w + EPSILON && self.h <= other.h + EPSILON
    }

    /// Both sides finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0
    }

    /// The footprint with `gap` added on every side.
    pub fn padded(&self, gap: f64) -> Self {
        Self {
            w: self.w + 2.0 * gap,
            h: self.h + 2.0 * gap,
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Axis-aligned rectangle on a sheet, origin at the sheet's bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn top(&self) -> f64 {
        self.y + self.h
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    /// True when the interiors overlap; rectangles sharing an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() - EPSILON
            && other.x < self.right() - EPSILON
            && self.y < other.top() - EPSILON
            && other.y < self.top() - EPSILON
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.top() <= self.top() + EPSILON
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.top()
    }

    pub fn inflate(&self, d: f64) -> Self {
        Self {
            x: self.x - d,
            y: self.y - d,
            w: self.w + 2.0 * d,
            h: self.h + 2.0 * d,
        }
    }
}

/// A drawing as handed over by the parts editor: its bounding box, how many
/// copies to cut and whether it takes part in nesting at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_bounds")]
    pub bounds: Option<Size>,
    #[serde(default = "default_qty", deserialize_with = "deserialize_qty")]
    pub qty: u32,
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl Part {
    pub fn new(id: impl Into<String>, name: impl Into<String>, w: f64, h: f64, qty: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bounds: Some(Size::new(w, h)),
            qty,
            visible: true,
        }
    }
}

fn default_qty() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Accepts any JSON number (or null) and turns it into a whole quantity of at
/// least one; fractions round up.
pub fn deserialize_qty<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(match raw {
        Some(q) if q.is_finite() => q.max(1.0).ceil().min(u32::MAX as f64) as u32,
        _ => 1,
    })
}

#[derive(Deserialize)]
struct RawBounds {
    #[serde(default)]
    w: Option<f64>,
    #[serde(default)]
    h: Option<f64>,
}

/// Bounds with a null or missing side come through as `None` instead of
/// failing the whole document; the item builder skips such parts.
pub fn deserialize_bounds<'de, D>(deserializer: D) -> Result<Option<Size>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawBounds>::deserialize(deserializer)?;
    Ok(raw.and_then(|b| Some(Size::new(b.w?, b.h?))))
}

/// One physical copy of a part waiting to be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub part_id: String,
    pub name: String,
    pub w: f64,
    pub h: f64,
}

impl Item {
    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn max_side(&self) -> f64 {
        self.w.max(self.h)
    }

    pub fn min_side(&self) -> f64 {
        self.w.min(self.h)
    }

    /// Long side over short side; the short side is clamped away from zero.
    pub fn aspect_ratio(&self) -> f64 {
        self.max_side() / self.min_side().max(EPSILON)
    }

    pub fn is_square(&self) -> bool {
        (self.w - self.h).abs() <= EPSILON
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub part_id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub rotated: bool,
    pub gap: f64,
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    pub fn padded_rect(&self) -> Rect {
        self.rect().inflate(self.gap)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub placements: Vec<Placement>,
    pub used_area: f64,
}

impl Sheet {
    pub fn utilization(&self, stock: Size) -> f64 {
        let area = stock.area();
        if area <= 0.0 {
            return 0.0;
        }
        (self.used_area / area).clamp(0.0, 1.0)
    }
}

/// The outcome of a nesting run: every sheet that was opened, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub stock: Size,
    pub sheets: Vec<Sheet>,
    pub strategy: Strategy,
}

impl Plan {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn placement_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }

    pub fn total_used_area(&self) -> f64 {
        self.sheets.iter().map(|s| s.used_area).sum()
    }

    /// Used area over the area of all opened sheets, in `[0, 1]`.
    pub fn utilization(&self) -> f64 {
        let total_stock_area = self.stock.area() * self.sheets.len() as f64;
        if total_stock_area <= 0.0 {
            return 0.0;
        }
        (self.total_used_area() / total_stock_area).clamp(0.0, 1.0)
    }

    pub fn first_sheet_utilization(&self) -> f64 {
        self.sheets
            .first()
            .map(|s| s.utilization(self.stock))
            .unwrap_or(0.0)
    }
}

/// A plan flattened for output, with the summary figures precomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub sheets: Vec<SheetReport>,
    pub stock: Size,
    pub sheet_count: usize,
    pub total_used_area: f64,
    pub utilization: f64,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetReport {
    pub placements: Vec<Placement>,
    pub used_area: f64,
    pub utilization: f64,
    pub part_count: usize,
}

impl From<Plan> for PlanReport {
    fn from(plan: Plan) -> Self {
        let stock = plan.stock;
        PlanReport {
            sheet_count: plan.sheet_count(),
            total_used_area: plan.total_used_area(),
            utilization: plan.utilization(),
            strategy: plan.strategy,
            stock,
            sheets: plan
                .sheets
                .into_iter()
                .map(|s| SheetReport {
                    used_area: s.used_area,
                    utilization: s.utilization(stock),
                    part_count: s.placements.len(),
                    placements: s.placements,
                })
                .collect(),
        }
    }
}
