//! Irregular-span measure variant.
//!
//! With span overrides in play, a structure change can move any item to any
//! cell, so the only safe reaction is a full reload from index 0; the
//! realized window then re-forms around the restored start item.

use gridwave_core::TelemetrySink;
use gridwave_ui_layout::ScrollAlign;

use super::item_provider::GridItemProvider;
use super::layout_info::{GridLayoutInfo, StructureSignature};
use super::measure::{FramePass, GridMeasureConfig, GridViewport, MeasureOutput};

/// One irregular-grid measure+layout pass.
pub fn measure_irregular_grid(
    info: &mut GridLayoutInfo,
    provider: &mut dyn GridItemProvider,
    config: &GridMeasureConfig,
    viewport: GridViewport,
    telemetry: &mut dyn TelemetrySink,
) -> MeasureOutput {
    apply_structure_change(info, provider, config);
    info.has_multi_span_items = true;
    FramePass::new(info, provider, config, viewport, telemetry).run()
}

/// Phase 1: any structural mismatch clears placement wholly.
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

    let changed = match previous {
        None => false,
        Some(previous) => previous != signature,
    };
    if changed {
        let anchor = info.start_index().min(signature.children_count.saturating_sub(1));
        info.reset();
        if signature.children_count > 0 && anchor > 0 {
            // Full reload from index 0, viewport restored near the old
            // start item once placement exists again.
            info.jump_index = Some(anchor);
            info.scroll_align = ScrollAlign::Start;
        }
    }
    info.cross_count = signature.cross_count;
    info.children_count = signature.children_count;
}
