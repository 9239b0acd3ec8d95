//! Line measurement.
//!
//! Realizes the items of one matrix line through the provider and derives
//! the line's main-axis extent. Multi-line items contribute a per-line share
//! of their extent, so every line a row-span crosses carries enough height
//! for it.

use gridwave_ui_layout::LaneSlot;

use super::item_provider::GridItemProvider;
use super::layout_info::GridLayoutInfo;
use super::matrix_filler::MatrixFiller;
use super::measure::GridMeasureConfig;

/// Measures matrix lines for both the synchronous fill and the idle
/// cache-ahead path.
pub(crate) struct LineMeasurer<'a> {
    config: &'a GridMeasureConfig,
    lane_slots: &'a [LaneSlot],
}

impl<'a> LineMeasurer<'a> {
    pub fn new(config: &'a GridMeasureConfig, lane_slots: &'a [LaneSlot]) -> Self {
        Self { config, lane_slots }
    }

    /// Ensures `line` is placed and measured, returning its height.
    ///
    /// Already-measured lines return their cached height without touching
    /// the provider. Returns `None` when the line cannot be realized: items
    /// ran out, or the provider refused an item — the terminal condition for
    /// the current fill direction, never an error.
    pub fn measure_line(
        &self,
        info: &mut GridLayoutInfo,
        provider: &mut dyn GridItemProvider,
        line: i32,
    ) -> Option<f32> {
        if let Some(height) = info.line_height(line) {
            return Some(height);
        }
        if !MatrixFiller::new(info).fill_to_line(&*provider, line) {
            return None;
        }

        let cells: Vec<_> = info.line_cells(line).collect();
        let mut height: f32 = 0.0;
        let mut measured_any = false;

        for (lane, cell) in cells {
            let index = cell.item();
            let span = provider.span(index).resolve(info.cross_count().max(1));

            if !cell.is_anchor() {
                let Some((anchor_line, anchor_lane)) = info.find_anchor_cell(index, line) else {
                    debug_assert!(false, "grid matrix: tail of item {} has no anchor", index);
                    log::warn!("grid matrix: skipping tail of item {} with no anchor", index);
                    continue;
                };
                if anchor_line == line {
                    // Horizontal tail; the anchor on this line carries it.
                    continue;
                }
                // Row-span continuation: reuse the extent measured at the
                // anchor, measuring it now if backward fill got here first.
                let extent = match info.item_extent(index) {
                    Some(extent) => extent,
                    None => {
                        let cross_size =
                            LaneSlot::spanned_size(self.lane_slots, anchor_lane as usize, span.cross);
                        match provider.provide_item(index, cross_size) {
                            Some(extent) => {
                                info.record_item_extent(index, extent);
                                extent
                            }
                            None => continue,
                        }
                    }
                };
                height = height.max(per_line_share(extent, span.main, self.config.main_gap));
                measured_any = true;
                continue;
            }

            let cross_size = LaneSlot::spanned_size(self.lane_slots, lane as usize, span.cross);
            let extent = provider.provide_item(index, cross_size)?;
            info.record_item_extent(index, extent);
            height = height.max(per_line_share(extent, span.main, self.config.main_gap));
            measured_any = true;
        }

        if !measured_any {
            return None;
        }
        info.record_line_height(line, height);
        Some(height)
    }
}

/// The share of a multi-line item's extent attributed to each spanned line.
/// Internal gaps are carried by the lines, not the item.
fn per_line_share(extent: f32, main_span: usize, main_gap: f32) -> f32 {
    if main_span > 1 {
        ((extent - main_gap * (main_span - 1) as f32) / main_span as f32).max(0.0)
    } else {
        extent
    }
}
