//! Item provider trait for virtualized grids.
//!
//! The provider is the engine's only window into the host's item tree:
//! items are realized and measured lazily, one index at a time.

use gridwave_ui_layout::GridSpan;

/// Provides lazy realization and measurement for grid items.
///
/// Implementations should be cheap to query for counts and spans; only
/// [`GridItemProvider::provide_item`] may do real work (composition,
/// text measurement). A `None` from `provide_item` is not an error — it is
/// the terminal condition for the current fill direction (index out of
/// range, or the item cannot be created yet).
pub trait GridItemProvider {
    /// The total number of items in the grid (realized or not).
    fn item_count(&self) -> usize;

    /// Realizes and measures the item at `index` under the given cross-axis
    /// size, returning its main-axis extent.
    fn provide_item(&mut self, index: usize, cross_size: f32) -> Option<f32>;

    /// Returns the span override for the item at `index`.
    ///
    /// If not overridden, every item occupies a single cell.
    fn span(&self, index: usize) -> GridSpan {
        let _ = index;
        GridSpan::unit()
    }

    /// Returns true when any item declares a span larger than one cell.
    ///
    /// Decides the layout strategy for the frame; implementations that know
    /// their span table should answer without realizing items.
    fn has_multi_span_items(&self) -> bool {
        false
    }

    /// Returns the stable key for the item at `index`.
    ///
    /// Keys keep scroll position stable across data changes. Defaults to the
    /// index itself.
    fn key(&self, index: usize) -> u64 {
        index as u64
    }
}
