//! Rectangular nesting of part bounding boxes onto stock sheets.
//!
//! Parts are expanded into items, and the [`solver::Solver`] packs them with
//! a MaxRects free-space tracker under every configured
//! (ordering, heuristic) pair. The plan using the fewest sheets wins.
//!
//! ```ignore
//! use sheet_nester::config::NestConfig;
//! use sheet_nester::solver::Solver;
//! use sheet_nester::types::{Part, Size};
//!
//! let parts = vec![Part::new("p1", "bracket.dxf", 400.0, 300.0, 6)];
//! let plan = Solver::new(Size::new(1000.0, 1000.0), NestConfig::new().with_gap(2.0), parts)
//!     .solve()?;
//! println!("{} sheets, {:.1}% used", plan.sheet_count(), plan.utilization() * 100.0);
//! ```

pub mod config;
pub mod error;
pub mod heuristic;
pub mod items;
pub mod maxrects;
pub mod packer;
pub mod render;
pub mod solver;
pub mod sort;
pub mod types;

pub use error::{NestError, Result};
