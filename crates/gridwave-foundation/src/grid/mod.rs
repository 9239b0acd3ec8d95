//! Grid layout engine: persistent layout state, matrix filling, range
//! solving, and the per-frame measure strategies.

mod cache_ahead;
mod irregular;
mod item_provider;
mod layout_info;
mod line_measurer;
mod matrix_filler;
mod measure;
mod range_solver;
mod regular;
mod strategy;

pub use cache_ahead::*;
pub use irregular::measure_irregular_grid;
pub use item_provider::*;
pub use layout_info::*;
pub use matrix_filler::*;
pub use measure::{
    GridMeasureConfig, GridViewport, LayoutEvent, LineAlign, MeasureOutput, PlacedItem,
    DEFAULT_MEASURE_TIME_BUDGET,
};
pub use range_solver::{JumpRange, RangeSolver, StartingLine};
pub use regular::measure_regular_grid;
pub use strategy::*;
