//! Layout strategy selection.
//!
//! One strategy is selected per frame from the template/span shape; both
//! variants share the matrix filler, range solver and line measurer as
//! services instead of inheriting from a common algorithm base.

use gridwave_core::TelemetrySink;

use super::irregular::measure_irregular_grid;
use super::item_provider::GridItemProvider;
use super::layout_info::GridLayoutInfo;
use super::measure::{GridMeasureConfig, GridViewport, MeasureOutput};
use super::regular::measure_regular_grid;

/// Which measure variant handles the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutStrategy {
    /// Every item occupies a single cell; placement is arithmetic.
    Regular,
    /// Span overrides exist; placement needs the full matrix machinery.
    Irregular,
}

impl LayoutStrategy {
    /// Selects the strategy for a frame.
    pub fn select(provider: &dyn GridItemProvider) -> Self {
        if provider.has_multi_span_items() {
            LayoutStrategy::Irregular
        } else {
            LayoutStrategy::Regular
        }
    }
}

/// Runs one measure+layout pass, moving `info` through the frame and back
/// out — the ownership transfer that gives the engine its single-writer
/// invariant without locking.
pub fn run_measure_pass(
    info: GridLayoutInfo,
    provider: &mut dyn GridItemProvider,
    config: &GridMeasureConfig,
    viewport: GridViewport,
    telemetry: &mut dyn TelemetrySink,
) -> (GridLayoutInfo, MeasureOutput) {
    let mut info = info;
    let output = match LayoutStrategy::select(provider) {
        LayoutStrategy::Regular => {
            measure_regular_grid(&mut info, provider, config, viewport, telemetry)
        }
        LayoutStrategy::Irregular => {
            measure_irregular_grid(&mut info, provider, config, viewport, telemetry)
        }
    };
    (info, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwave_ui_layout::GridSpan;

    struct Plain;
    impl GridItemProvider for Plain {
        fn item_count(&self) -> usize {
            1
        }
        fn provide_item(&mut self, _index: usize, _cross_size: f32) -> Option<f32> {
            Some(10.0)
        }
    }

    struct Spanned;
    impl GridItemProvider for Spanned {
        fn item_count(&self) -> usize {
            1
        }
        fn provide_item(&mut self, _index: usize, _cross_size: f32) -> Option<f32> {
            Some(10.0)
        }
        fn span(&self, _index: usize) -> GridSpan {
            GridSpan::sized(2, 2)
        }
        fn has_multi_span_items(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(LayoutStrategy::select(&Plain), LayoutStrategy::Regular);
        assert_eq!(LayoutStrategy::select(&Spanned), LayoutStrategy::Irregular);
    }
}
