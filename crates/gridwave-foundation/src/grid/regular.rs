//! Regular-template measure variant.
//!
//! Every item occupies one cell, so structure changes can be handled with a
//! targeted reload instead of throwing everything away: an item-count change
//! invalidates placement only from the lowest changed index, and a template
//! change reloads around the previous start item.

use gridwave_core::TelemetrySink;
use gridwave_ui_layout::ScrollAlign;

use super::item_provider::GridItemProvider;
use super::layout_info::{GridLayoutInfo, StructureSignature};
use super::measure::{FramePass, GridMeasureConfig, GridViewport, MeasureOutput};

/// One regular-grid measure+layout pass.
pub fn measure_regular_grid(
    info: &mut GridLayoutInfo,
    provider: &mut dyn GridItemProvider,
    config: &GridMeasureConfig,
    viewport: GridViewport,
    telemetry: &mut dyn TelemetrySink,
) -> MeasureOutput {
    apply_structure_change(info, provider, config);
    info.has_multi_span_items = false;
    FramePass::new(info, provider, config, viewport, telemetry).run()
}

/// Phase 1: compare the structural signature and reload as little as
/// possible.
fn apply_structure_change(
    info: &mut GridLayoutInfo,
    provider: &dyn GridItemProvider,
    config: &GridMeasureConfig,
) {
    let signature = StructureSignature {
        cross_count: config.template.lane_count(),
        children_count: provider.item_count(),
        options_id: config.options_id,
    };
    let previous = info.signature;
    info.signature = Some(signature);

    let Some(previous) = previous else {
        info.cross_count = signature.cross_count;
        info.children_count = signature.children_count;
        return;
    };
    if previous == signature {
        return;
    }

    if previous.cross_count == signature.cross_count && previous.options_id == signature.options_id
    {
        // Item count changed: placement before the lowest changed index is
        // still valid.
        let lowest_invalidated = previous.children_count.min(signature.children_count);
        info.children_count = signature.children_count;
        if signature.children_count == 0 {
            info.reset();
        } else {
            info.clear_from_index(lowest_invalidated);
            if info.start_index >= signature.children_count {
                info.request_jump(signature.children_count - 1, ScrollAlign::End);
            }
        }
        return;
    }

    // Column update: per-line placement arithmetic changed wholly. Reload
    // from the previous start item so the viewport stays where the user was.
    let anchor = info.start_index().min(signature.children_count.saturating_sub(1));
    info.reset();
    info.cross_count = signature.cross_count;
    info.children_count = signature.children_count;
    if signature.children_count > 0 && anchor > 0 {
        info.request_jump(anchor, ScrollAlign::Start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountedProvider {
        count: usize,
    }

    impl GridItemProvider for CountedProvider {
        fn item_count(&self) -> usize {
            self.count
        }
        fn provide_item(&mut self, _index: usize, _cross_size: f32) -> Option<f32> {
            Some(40.0)
        }
    }

    fn config_with_lanes(lanes: usize) -> GridMeasureConfig {
        GridMeasureConfig {
            template: gridwave_ui_layout::TrackTemplate::uniform(lanes),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_frame_adopts_signature() {
        let mut info = GridLayoutInfo::new();
        let provider = CountedProvider { count: 12 };
        apply_structure_change(&mut info, &provider, &config_with_lanes(3));
        assert_eq!(info.cross_count(), 3);
        assert_eq!(info.children_count(), 12);
    }

    #[test]
    fn test_item_count_growth_keeps_existing_placement() {
        let mut info = GridLayoutInfo::new();
        let config = config_with_lanes(2);
        apply_structure_change(&mut info, &CountedProvider { count: 4 }, &config);
        // Simulate a filled matrix for 4 items.
        {
            use super::super::matrix_filler::MatrixFiller;
            let provider = CountedProvider { count: 4 };
            MatrixFiller::new(&mut info).fill_until_index(&provider, 3);
        }
        apply_structure_change(&mut info, &CountedProvider { count: 8 }, &config);

        // Items 0..4 survive; the grid just grows.
        assert_eq!(info.children_count(), 8);
        assert_eq!(info.item_at(0, 0), Some(0));
        assert_eq!(info.item_at(1, 1), Some(3));
    }

    #[test]
    fn test_column_change_resets_and_restores_anchor() {
        let mut info = GridLayoutInfo::new();
        apply_structure_change(&mut info, &CountedProvider { count: 20 }, &config_with_lanes(2));
        info.start_index = 10;
        apply_structure_change(&mut info, &CountedProvider { count: 20 }, &config_with_lanes(4));

        assert_eq!(info.cross_count(), 4);
        // Placement cleared, reload anchored at the old start item.
        assert!(!info.line_has_data(0));
        assert_eq!(info.jump_index, Some(10));
        assert_eq!(info.scroll_align, ScrollAlign::Start);
    }

    #[test]
    fn test_shrink_below_window_jumps_to_last() {
        let mut info = GridLayoutInfo::new();
        let config = config_with_lanes(2);
        apply_structure_change(&mut info, &CountedProvider { count: 40 }, &config);
        info.start_index = 30;
        apply_structure_change(&mut info, &CountedProvider { count: 10 }, &config);

        assert_eq!(info.children_count(), 10);
        assert_eq!(info.jump_index, Some(9));
    }
}
