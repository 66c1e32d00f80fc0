//! Error types for a nesting run.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NestError>;

/// Reasons a run produces no plan. Every variant is raised before the first
/// sheet would be handed back, so there is never a partial plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NestError {
    #[error("invalid material {width}x{height} mm: both sides must be positive")]
    InvalidMaterial { width: f64, height: f64 },

    #[error("part \"{name}\" ({:.0}x{:.0} mm) does not fit on the material", .width.round(), .height.round())]
    InfeasibleItem {
        part_id: String,
        name: String,
        width: f64,
        height: f64,
    },

    #[error("{count} items requested, the limit is {max}")]
    ItemCeilingExceeded { count: u64, max: u64 },

    /// A sheet pass placed nothing even though every item fits an empty sheet.
    #[error("internal packing error: sheet {sheet} placed none of {remaining} remaining items")]
    InternalPackingInvariantViolation { sheet: usize, remaining: usize },
}

impl NestError {
    /// Stable identifier for machine consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            NestError::InvalidMaterial { .. } => "invalid_material",
            NestError::InfeasibleItem { .. } => "infeasible_item",
            NestError::ItemCeilingExceeded { .. } => "item_ceiling_exceeded",
            NestError::InternalPackingInvariantViolation { .. } => "internal_error",
        }
    }
}
