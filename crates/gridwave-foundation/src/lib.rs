//! Virtualized grid layout & scroll-position engine.
//!
//! The engine renders large, scrollable, grid-arranged collections without
//! realizing every item eagerly. One measure+layout pass runs per frame:
//! it extends a sparse placement matrix, measures only the lines near the
//! viewport, solves jumps and large-offset skips from partially known line
//! heights, and schedules idle-time cache-ahead measurement for what it
//! skipped.

pub mod grid;
pub mod scroll;

pub use grid::*;
pub use scroll::*;
