//! Per-frame measure/layout orchestration.
//!
//! One [`FramePass`] runs per rendering frame, phases in order: consume
//! one-shot requests, apply the pending scroll delta (with large-offset
//! skipping), extend the realized window, lay out absolute item rectangles,
//! and plan idle cache-ahead work. Each phase is idempotent when re-entered
//! with unchanged inputs; nothing in the pass is an error — exhausted
//! providers and invalid requests early-return and leave flags behind.

use std::collections::VecDeque;

use gridwave_core::{Scene, TelemetrySink};
use gridwave_ui_layout::{Axis, Constraints, LaneSlot, ScrollEdgeType, TrackTemplate};
use web_time::{Duration, Instant};

use super::cache_ahead::CacheAheadPlan;
use super::item_provider::GridItemProvider;
use super::layout_info::GridLayoutInfo;
use super::line_measurer::LineMeasurer;
use super::matrix_filler::MatrixFiller;
use super::range_solver::{block_end_of, block_start_of, RangeSolver};

/// Wall-clock budget for one synchronous measure pass.
///
/// Adapting to device speed beats a hard item-count limit: when the budget
/// runs out the pass stops extending the window and the next frame continues
/// with whatever was measured.
pub const DEFAULT_MEASURE_TIME_BUDGET: Duration = Duration::from_millis(50);

/// How an item shorter than its line is positioned along the main axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineAlign {
    Start,
    Center,
    End,
    /// Stretch the item to the full line extent.
    #[default]
    Stretch,
}

/// Configuration for one grid's measure passes.
#[derive(Clone, Debug)]
pub struct GridMeasureConfig {
    /// Main scroll axis. The engine is axis-agnostic: "line" reads as row
    /// and "lane" as column for [`Axis::Vertical`], transposed otherwise.
    pub axis: Axis,

    /// Cross-axis track template.
    pub template: TrackTemplate,

    /// Gap between adjacent lines.
    pub main_gap: f32,

    /// Gap between adjacent lanes.
    pub cross_gap: f32,

    /// Extra pixels beyond the viewport filled synchronously.
    pub cache_margin: f32,

    /// Out-of-window lines measured by idle cache-ahead, per direction.
    pub cached_line_count: usize,

    /// Mirror lanes for right-to-left layouts.
    pub rtl: bool,

    /// Main-axis alignment of items inside their line.
    pub line_align: LineAlign,

    /// Identity of the host's layout options; a change invalidates
    /// persisted placement.
    pub options_id: u64,

    /// Wall-clock budget for the synchronous pass.
    pub time_budget: Duration,
}

impl Default for GridMeasureConfig {
    fn default() -> Self {
        Self {
            axis: Axis::Vertical,
            template: TrackTemplate::default(),
            main_gap: 0.0,
            cross_gap: 0.0,
            cache_margin: 0.0,
            cached_line_count: 2,
            rtl: false,
            line_align: LineAlign::default(),
            options_id: 0,
            time_budget: DEFAULT_MEASURE_TIME_BUDGET,
        }
    }
}

/// Viewport extents along the grid's axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridViewport {
    pub main_extent: f32,
    pub cross_extent: f32,
}

/// Maximum viewport extent before the grid treats it as unbounded.
const MAX_REASONABLE_VIEWPORT: f32 = 100_000.0;

/// Number of lines shown in the unbounded-viewport fallback case.
const INFINITE_VIEWPORT_LINE_COUNT: f32 = 20.0;

impl GridViewport {
    pub fn new(main_extent: f32, cross_extent: f32) -> Self {
        Self {
            main_extent,
            cross_extent,
        }
    }

    /// Derives the viewport from the incoming layout constraints' upper
    /// bounds, mapped through the scroll axis.
    pub fn from_constraints(constraints: &Constraints, axis: Axis) -> Self {
        Self {
            main_extent: axis.main_extent(constraints.max_width, constraints.max_height),
            cross_extent: axis.cross_extent(constraints.max_width, constraints.max_height),
        }
    }
}

/// Absolute rectangle of one realized item, viewport-relative.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedItem {
    pub index: usize,
    pub key: u64,
    pub line: i32,
    pub lane: i32,
    pub main_offset: f32,
    pub cross_offset: f32,
    pub main_size: f32,
    pub cross_size: f32,
}

/// Events produced by a measure pass, consumed explicitly by the host
/// instead of being delivered through captured callbacks.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutEvent {
    /// The realized `[first, last]` item window changed.
    VisibleRangeChanged { first: usize, last: usize },
    /// The viewport reached a content edge.
    ReachedEdge(ScrollEdgeType),
    /// The content-extent estimate moved (scrollbar sizing input).
    ContentEstimateChanged { height: f32, offset: f32 },
}

/// Result of one measure pass.
#[derive(Debug, Default)]
pub struct MeasureOutput {
    /// Realized items with their viewport-relative rectangles.
    pub items: Vec<PlacedItem>,
    /// What changed this frame.
    pub events: Vec<LayoutEvent>,
    /// Idle cache-ahead work, if any lines are worth pre-measuring.
    pub cache_plan: Option<CacheAheadPlan>,
}

/// The shared phase driver. Strategy-specific behavior (structure-change
/// policy) runs before this; everything else — request resolution, delta
/// application, filling, layout, cache planning — is common to the regular
/// and irregular variants.
pub(crate) struct FramePass<'a> {
    pub info: &'a mut GridLayoutInfo,
    pub provider: &'a mut dyn GridItemProvider,
    pub config: &'a GridMeasureConfig,
    pub viewport: GridViewport,
    pub telemetry: &'a mut dyn TelemetrySink,
    lane_slots: Vec<LaneSlot>,
    start_time: Instant,
}

impl<'a> FramePass<'a> {
    pub fn new(
        info: &'a mut GridLayoutInfo,
        provider: &'a mut dyn GridItemProvider,
        config: &'a GridMeasureConfig,
        viewport: GridViewport,
        telemetry: &'a mut dyn TelemetrySink,
    ) -> Self {
        let mut viewport = viewport;
        if viewport.main_extent.is_infinite() || viewport.main_extent > MAX_REASONABLE_VIEWPORT {
            // A grid measured in an unconstrained parent would realize
            // everything; fall back to a line-count estimate instead.
            let fallback = (info.average_line_height() + config.main_gap)
                * INFINITE_VIEWPORT_LINE_COUNT;
            log::warn!(
                "grid: unbounded viewport ({}), using fallback extent {}",
                viewport.main_extent,
                fallback
            );
            viewport.main_extent = fallback;
        }
        let lane_slots = config.template.resolve(viewport.cross_extent, config.cross_gap);
        Self {
            info,
            provider,
            config,
            viewport,
            telemetry,
            lane_slots,
            start_time: Instant::now(),
        }
    }

    pub fn run(mut self) -> MeasureOutput {
        self.telemetry.scene_start(Scene::MeasurePass);

        let prev_window = (self.info.start_index(), self.info.end_index());
        let prev_reach = (self.info.reach_start(), self.info.reach_end());
        let prev_estimate = self.info.estimated_content_height(self.config.main_gap);

        if self.info.children_count() == 0 || self.viewport.main_extent <= 0.0 {
            // Nothing to realize; preserve scroll state for collapsed
            // viewports, reset it for genuinely empty grids.
            if self.info.children_count() == 0 {
                self.info.reset();
            }
            let events = self.collect_events(prev_window, prev_reach, prev_estimate);
            self.info.synced = true;
            self.telemetry.scene_end(Scene::MeasurePass);
            return MeasureOutput {
                items: Vec::new(),
                events,
                cache_plan: None,
            };
        }

        self.resolve_requests();
        self.apply_pending_delta();
        self.fill_window();
        self.info.update_window_indices();
        let items = self.emit_layout();

        let direction = self.info.scroll_position() - self.info.prev_offset;
        let cache_plan = self.plan_cache_ahead(direction);
        let events = self.collect_events(prev_window, prev_reach, prev_estimate);

        self.info.prev_offset = self.info.scroll_position();
        self.info.synced = true;
        self.telemetry.scene_end(Scene::MeasurePass);

        MeasureOutput {
            items,
            events,
            cache_plan,
        }
    }

    /// Phase 2: consume the one-shot jump/target requests.
    fn resolve_requests(&mut self) {
        if let Some(target) = self.info.target_index.take() {
            // Animated-scroll target: extend the matrix so the position of
            // `target` is solvable, without moving the viewport.
            MatrixFiller::new(self.info).fill_until_index(&*self.provider, target);
        }

        let Some(jump) = self.info.jump_index.take() else {
            return;
        };
        let align = std::mem::take(&mut self.info.scroll_align);
        self.telemetry.scene_start(Scene::Jump);
        let mut solver = RangeSolver::new(
            self.info,
            self.config.main_gap,
            self.viewport.main_extent,
        );
        if let Some(range) = solver.find_range_on_jump(&mut *self.provider, jump, align) {
            let position = solver.position_of_line(range.start_line);
            self.info.start_line = range.start_line;
            self.info.current_offset = range.start_offset.max(0.0);
            self.info.start_line_position = position.max(0.0);
            // The jump defines the position; a stale gesture delta or idle
            // result must not fight it.
            self.info.pending_delta = 0.0;
            self.info.pending_backfill = None;
            self.info.generation.bump();
        }
        self.telemetry.scene_end(Scene::Jump);
    }

    /// Phases 3–4 entry: apply the pending delta, skipping line-by-line
    /// measurement when it exceeds one viewport extent.
    fn apply_pending_delta(&mut self) {
        let delta = self.info.take_pending_delta();
        if delta == 0.0 {
            return;
        }

        if delta.abs() > self.viewport.main_extent {
            self.telemetry.scene_start(Scene::OffsetSkip);
            let max_scroll = (self.info.estimated_content_height(self.config.main_gap)
                - self.viewport.main_extent)
                .max(0.0);
            let target = (self.info.scroll_position() + delta).clamp(0.0, max_scroll);

            let old_start = self.info.start_line;
            let old_end = self.info.end_line;
            let start = RangeSolver::new(
                self.info,
                self.config.main_gap,
                self.viewport.main_extent,
            )
            .find_starting_line(target);

            // The skipped-over region keeps estimated heights; mark it for
            // lazy backfill instead of measuring it synchronously.
            self.info.pending_backfill = if start.line > old_end + 1 {
                Some((old_end + 1, start.line - 1))
            } else if start.line + 1 < old_start {
                Some((start.line + 1, old_start - 1))
            } else {
                None
            };

            self.info.start_line = start.line;
            self.info.current_offset = start.residual_offset;
            self.info.start_line_position = target - start.residual_offset;
            self.telemetry.scene_end(Scene::OffsetSkip);
        } else {
            self.info.current_offset += delta;
        }
    }

    /// Phase 3: normalize the window anchor and extend the matrix until the
    /// measured extent covers the viewport plus the cache margin.
    fn fill_window(&mut self) {
        self.info.reach_start = false;
        self.info.reach_end = false;
        self.info.offset_end = false;

        self.normalize_backward();
        self.snap_to_block_start();
        self.normalize_forward();

        let covered = self.fill_forward();

        // The window ending on the final line with every item placed is the
        // end of content even when no provider call failed.
        let last_line = (self.info.total_lines_estimate() - 1).max(0);
        if !self.info.reach_end
            && self.info.end_line >= last_line
            && self.info.next_fill_index >= self.info.children_count()
        {
            self.info.reach_end = true;
        }

        // Clamp at the end edge: when content ends inside the viewport but
        // we are scrolled past zero, shift the window back down.
        if self.info.reach_end && covered < self.viewport.main_extent {
            let deficit = (self.viewport.main_extent - covered).min(self.info.scroll_position());
            if deficit > 0.0 {
                self.info.current_offset -= deficit;
                self.normalize_backward();
                self.snap_to_block_start();
                self.fill_forward();
            }
            self.info.offset_end = true;
        } else if self.info.reach_end {
            self.info.offset_end = covered - self.viewport.main_extent <= 0.5;
        }

        if self.info.start_line == 0 && self.info.current_offset <= 0.0 {
            self.info.current_offset = self.info.current_offset.max(0.0);
            self.info.start_line_position = 0.0;
            self.info.reach_start = true;
        }
    }

    /// Walks the window anchor backward while the residual is negative,
    /// measuring real line heights so estimates cannot make the top sticky.
    fn normalize_backward(&mut self) {
        let gap = self.config.main_gap;
        let measurer = LineMeasurer::new(self.config, &self.lane_slots);
        while self.info.current_offset < 0.0 && self.info.start_line > 0 {
            if self.budget_exceeded("backward normalization") {
                break;
            }
            let prev = self.info.start_line - 1;
            let Some(height) = measurer.measure_line(self.info, &mut *self.provider, prev) else {
                break;
            };
            self.info.current_offset += height + gap;
            self.info.start_line = prev;
            self.info.start_line_position -= height + gap;
        }
        if self.info.start_line == 0 && self.info.current_offset < 0.0 {
            self.info.current_offset = 0.0;
            self.info.start_line_position = 0.0;
        }
    }

    /// Moves the anchor up to its block start so a row-span block is always
    /// entered whole and its anchor line is realized.
    fn snap_to_block_start(&mut self) {
        let start = block_start_of(self.info, self.info.start_line);
        if start == self.info.start_line {
            return;
        }
        let gap = self.config.main_gap;
        let measurer = LineMeasurer::new(self.config, &self.lane_slots);
        for line in (start..self.info.start_line).rev() {
            let Some(height) = measurer.measure_line(self.info, &mut *self.provider, line) else {
                break;
            };
            self.info.current_offset += height + gap;
            self.info.start_line = line;
            self.info.start_line_position -= height + gap;
        }
    }

    /// Advances the window anchor while the residual has scrolled past the
    /// anchor block entirely.
    fn normalize_forward(&mut self) {
        let gap = self.config.main_gap;
        let measurer = LineMeasurer::new(self.config, &self.lane_slots);
        loop {
            if self.budget_exceeded("forward normalization") {
                break;
            }
            let start = self.info.start_line;
            let end = block_end_of(self.info, start);
            let mut block_height = 0.0;
            let mut complete = true;
            for line in start..=end {
                match measurer.measure_line(self.info, &mut *self.provider, line) {
                    Some(height) => block_height += height,
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                break;
            }
            block_height += gap * (end - start) as f32;
            if self.info.current_offset < block_height + gap {
                break;
            }
            let last_line = (self.info.total_lines_estimate() - 1).max(0);
            if end >= last_line {
                break;
            }
            self.info.current_offset -= block_height + gap;
            self.info.start_line_position += block_height + gap;
            self.info.start_line = end + 1;
        }
    }

    /// Extends the matrix forward from the anchor until the measured extent
    /// covers the viewport plus the cache margin, or items run out.
    ///
    /// Returns the covered extent below the viewport top.
    fn fill_forward(&mut self) -> f32 {
        let gap = self.config.main_gap;
        let coverage = self.viewport.main_extent + self.config.cache_margin;
        let measurer = LineMeasurer::new(self.config, &self.lane_slots);

        let mut line = self.info.start_line;
        let mut covered = -self.info.current_offset;
        let mut last_realized = self.info.start_line;
        let mut measured_any = false;

        loop {
            if self.budget_exceeded("forward fill") {
                break;
            }
            match measurer.measure_line(self.info, &mut *self.provider, line) {
                Some(height) => {
                    covered += height;
                    last_realized = line;
                    measured_any = true;
                    if covered >= coverage {
                        break;
                    }
                    covered += gap;
                    line += 1;
                }
                None => {
                    self.info.reach_end = true;
                    if measured_any {
                        covered -= gap;
                    }
                    break;
                }
            }
        }

        self.info.end_line = block_end_of(self.info, last_realized).min(
            (self.info.total_lines_estimate() - 1).max(0),
        );
        covered
    }

    /// Phase 5: absolute per-item rectangles for the realized window.
    fn emit_layout(&mut self) -> Vec<PlacedItem> {
        let gap = self.config.main_gap;
        let mut items = Vec::new();
        let mut line_position = -self.info.current_offset;

        for line in self.info.start_line..=self.info.end_line {
            let (line_height, _) = self.info.line_height_or_estimate(line);
            let cells: Vec<_> = self.info.line_cells(line).collect();
            for (lane, cell) in cells {
                if !cell.is_anchor() {
                    continue;
                }
                let index = cell.item();
                let span = self.provider.span(index).resolve(self.info.cross_count().max(1));

                let extent = match self.info.item_extent(index) {
                    Some(extent) => extent,
                    None => {
                        let cross_size =
                            LaneSlot::spanned_size(&self.lane_slots, lane as usize, span.cross);
                        match self.provider.provide_item(index, cross_size) {
                            Some(extent) => {
                                self.info.record_item_extent(index, extent);
                                extent
                            }
                            None => continue,
                        }
                    }
                };

                // Extent of the spanned slot: this line for unit items, the
                // spanned lines plus internal gaps for row spans.
                let mut slot_extent = line_height;
                for offset in 1..span.main as i32 {
                    let (h, _) = self.info.line_height_or_estimate(line + offset);
                    slot_extent += h + gap;
                }

                let (main_offset, main_size) = match self.config.line_align {
                    LineAlign::Stretch => (line_position, slot_extent),
                    LineAlign::Start => (line_position, extent.min(slot_extent)),
                    LineAlign::Center => {
                        let size = extent.min(slot_extent);
                        (line_position + (slot_extent - size) / 2.0, size)
                    }
                    LineAlign::End => {
                        let size = extent.min(slot_extent);
                        (line_position + slot_extent - size, size)
                    }
                };

                let cross_size = LaneSlot::spanned_size(&self.lane_slots, lane as usize, span.cross);
                let lane_offset = self.lane_slots.get(lane as usize).map_or(0.0, |slot| slot.offset);
                let cross_offset = if self.config.rtl {
                    self.viewport.cross_extent - lane_offset - cross_size
                } else {
                    lane_offset
                };

                items.push(PlacedItem {
                    index,
                    key: self.provider.key(index),
                    line,
                    lane,
                    main_offset,
                    cross_offset,
                    main_size,
                    cross_size,
                });
            }
            line_position += line_height + gap;
        }
        items
    }

    /// Phase 6: queue out-of-window lines for idle measurement, skip-region
    /// backfill first.
    fn plan_cache_ahead(&mut self, direction: f32) -> Option<CacheAheadPlan> {
        if self.config.cached_line_count == 0 {
            return None;
        }
        let mut lines = VecDeque::new();
        if let Some((low, high)) = self.info.pending_backfill {
            for line in low..=high {
                if self.info.line_height(line).is_none() {
                    lines.push_back(line);
                }
            }
        }

        let last_line = (self.info.total_lines_estimate() - 1).max(0);
        let ahead = self.config.cached_line_count as i32;
        if direction >= 0.0 {
            let from = self.info.end_line + 1;
            for line in from..=(from + ahead - 1).min(last_line) {
                if self.info.line_height(line).is_none() && !lines.contains(&line) {
                    lines.push_back(line);
                }
            }
        } else {
            let from = self.info.start_line - 1;
            let to = (from - ahead + 1).max(0);
            for line in (to..=from).rev() {
                if line >= 0 && self.info.line_height(line).is_none() && !lines.contains(&line) {
                    lines.push_back(line);
                }
            }
        }

        if lines.is_empty() {
            None
        } else {
            Some(CacheAheadPlan::new(lines, self.info.generation()))
        }
    }

    fn collect_events(
        &self,
        prev_window: (usize, usize),
        prev_reach: (bool, bool),
        prev_estimate: f32,
    ) -> Vec<LayoutEvent> {
        let mut events = Vec::new();
        let window = (self.info.start_index(), self.info.end_index());
        if window != prev_window {
            events.push(LayoutEvent::VisibleRangeChanged {
                first: window.0,
                last: window.1,
            });
        }
        if self.info.reach_start() && !prev_reach.0 {
            events.push(LayoutEvent::ReachedEdge(ScrollEdgeType::Top));
        }
        if self.info.reach_end() && !prev_reach.1 {
            events.push(LayoutEvent::ReachedEdge(ScrollEdgeType::Bottom));
        }
        let estimate = self.info.estimated_content_height(self.config.main_gap);
        if (estimate - prev_estimate).abs() > 0.5 {
            events.push(LayoutEvent::ContentEstimateChanged {
                height: estimate,
                offset: self.info.scroll_position(),
            });
        }
        events
    }

    fn budget_exceeded(&self, phase: &str) -> bool {
        if self.start_time.elapsed() > self.config.time_budget {
            log::warn!(
                "grid measure exceeded time budget ({:?}) during {}; stopping early",
                self.config.time_budget,
                phase
            );
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_from_constraints_maps_axes() {
        let constraints = Constraints::loose(360.0, 640.0);
        let vertical = GridViewport::from_constraints(&constraints, Axis::Vertical);
        assert_eq!(vertical.main_extent, 640.0);
        assert_eq!(vertical.cross_extent, 360.0);

        let horizontal = GridViewport::from_constraints(&constraints, Axis::Horizontal);
        assert_eq!(horizontal.main_extent, 360.0);
        assert_eq!(horizontal.cross_extent, 640.0);
    }

    #[test]
    fn test_unbounded_viewport_falls_back() {
        struct NoItems;
        impl GridItemProvider for NoItems {
            fn item_count(&self) -> usize {
                1
            }
            fn provide_item(&mut self, _index: usize, _cross_size: f32) -> Option<f32> {
                Some(48.0)
            }
        }
        let mut info = GridLayoutInfo::new();
        let mut provider = NoItems;
        let config = GridMeasureConfig::default();
        let mut telemetry = gridwave_core::NoopTelemetry;
        let pass = FramePass::new(
            &mut info,
            &mut provider,
            &config,
            GridViewport::new(f32::INFINITY, 300.0),
            &mut telemetry,
        );
        // Default estimate of 48 per line, 20 lines.
        assert_eq!(pass.viewport.main_extent, 960.0);
    }
}
