//! Scroll session owning one grid's layout state across frames.
//!
//! Translates gesture deltas and over-scroll policy into offset updates fed
//! through the measure pass, and answers the edge/boundary queries the
//! nested-scroll coordinator and scrollbar need.

use gridwave_core::{IdleDeadline, NodeArena, NodeHandle, NoopTelemetry, Scene, TelemetrySink};
use gridwave_ui_layout::{ScrollAlign, ScrollEdgeType};

use crate::grid::{
    run_measure_pass, CacheAheadTask, GridItemProvider, GridLayoutInfo, GridMeasureConfig,
    GridViewport, IdleOutcome, MeasureOutput,
};

/// Edge effect rendered when content is pulled past a boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EdgeEffect {
    /// No effect; deltas clamp hard at the boundary.
    #[default]
    None,
    /// Spring-back effect; over-scroll is permitted.
    Spring,
    /// Fade/glow effect; over-scroll is permitted.
    Fade,
}

/// How much of a delta would push beyond the content bounds at either edge.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct OverScroll {
    /// Pixels beyond the start (top) edge.
    pub start: f32,
    /// Pixels beyond the end (bottom) edge.
    pub end: f32,
}

/// One realized item node, addressed by stable [`NodeHandle`]s instead of
/// pointers into the host's tree.
#[derive(Clone, Debug, PartialEq)]
pub struct RealizedItem {
    pub index: usize,
    pub key: u64,
    pub main_size: f32,
    pub cross_size: f32,
}

/// Owns one [`GridLayoutInfo`] across frames and drives measure passes.
///
/// The layout state moves into the pass at the start of each frame and moves
/// back out when it completes; between frames the session is the only owner.
pub struct ScrollSession<P: GridItemProvider, T: TelemetrySink = NoopTelemetry> {
    info: GridLayoutInfo,
    provider: P,
    config: GridMeasureConfig,
    viewport: GridViewport,
    edge_effect: EdgeEffect,
    can_over_scroll: bool,
    over_scroll: f32,
    telemetry: T,
    cache_task: Option<CacheAheadTask>,
    last_frame: MeasureOutput,
    nodes: NodeArena<RealizedItem>,
}

impl<P: GridItemProvider> ScrollSession<P, NoopTelemetry> {
    pub fn new(provider: P, config: GridMeasureConfig) -> Self {
        Self::with_telemetry(provider, config, NoopTelemetry)
    }
}

impl<P: GridItemProvider, T: TelemetrySink> ScrollSession<P, T> {
    /// Creates a session with an explicit telemetry sink — there is no
    /// process-wide monitor to fall back to.
    pub fn with_telemetry(provider: P, config: GridMeasureConfig, telemetry: T) -> Self {
        Self {
            info: GridLayoutInfo::new(),
            provider,
            config,
            viewport: GridViewport::new(0.0, 0.0),
            edge_effect: EdgeEffect::None,
            can_over_scroll: false,
            over_scroll: 0.0,
            telemetry,
            cache_task: None,
            last_frame: MeasureOutput::default(),
            nodes: NodeArena::new(),
        }
    }

    // ── Configuration ──────────────────────────────────────────────────

    pub fn set_viewport(&mut self, viewport: GridViewport) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.info.mark_dirty();
        }
    }

    pub fn set_config(&mut self, config: GridMeasureConfig) {
        self.config = config;
        self.info.mark_dirty();
    }

    pub fn set_edge_effect(&mut self, effect: EdgeEffect) {
        self.edge_effect = effect;
    }

    /// Set by the nested-scroll coordinator when an ancestor permits
    /// over-scroll regardless of the configured edge effect.
    pub fn set_can_over_scroll(&mut self, can: bool) {
        self.can_over_scroll = can;
    }

    pub fn config(&self) -> &GridMeasureConfig {
        &self.config
    }

    pub fn info(&self) -> &GridLayoutInfo {
        &self.info
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        self.info.mark_dirty();
        &mut self.provider
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    // ── Frame driving ──────────────────────────────────────────────────

    /// Runs one measure+layout pass, handing the layout state through the
    /// frame by move. The returned output is also retained and readable via
    /// [`ScrollSession::last_frame`].
    pub fn measure_frame(&mut self) -> &MeasureOutput {
        let info = std::mem::take(&mut self.info);
        let (info, mut output) = run_measure_pass(
            info,
            &mut self.provider,
            &self.config,
            self.viewport,
            &mut self.telemetry,
        );
        self.info = info;
        if let Some(plan) = output.cache_plan.take() {
            self.cache_task = Some(CacheAheadTask::new(plan));
        }
        self.sync_nodes(&output);
        self.last_frame = output;
        &self.last_frame
    }

    /// Mirrors the realized window into the node arena: items entering the
    /// window get a handle, items leaving it free theirs. Handles of items
    /// that stay realized remain valid across frames.
    fn sync_nodes(&mut self, output: &MeasureOutput) {
        self.nodes
            .retain_items(|item| output.items.iter().any(|placed| placed.index == item));
        for placed in &output.items {
            let realized = RealizedItem {
                index: placed.index,
                key: placed.key,
                main_size: placed.main_size,
                cross_size: placed.cross_size,
            };
            match self.nodes.handle_for_item(placed.index) {
                Some(handle) => {
                    if let Some(node) = self.nodes.get_mut(handle) {
                        *node = realized;
                    }
                }
                None => {
                    self.nodes.insert_for_item(placed.index, realized);
                }
            }
        }
    }

    /// Handle of the realized node for `index`, if it is in the window.
    pub fn node_for_item(&self, index: usize) -> Option<NodeHandle> {
        self.nodes.handle_for_item(index)
    }

    /// The realized node behind `handle`; `None` once the item left the
    /// window (stale handles fail the generation check instead of aliasing).
    pub fn realized_item(&self, handle: NodeHandle) -> Option<&RealizedItem> {
        self.nodes.get(handle)
    }

    /// Output of the most recent pass.
    pub fn last_frame(&self) -> &MeasureOutput {
        &self.last_frame
    }

    /// Runs pending idle cache-ahead work against `deadline`.
    ///
    /// Returns `None` when nothing is pending. A yielded task stays queued
    /// for the next idle slot; finished or stale tasks are dropped.
    pub fn run_cache_ahead(&mut self, deadline: IdleDeadline) -> Option<IdleOutcome> {
        let mut task = self.cache_task.take()?;
        self.telemetry.scene_start(Scene::CacheAhead);
        let outcome = task.run(
            &mut self.info,
            &mut self.provider,
            &self.config,
            self.viewport,
            deadline,
        );
        self.telemetry.scene_end(Scene::CacheAhead);
        if outcome == IdleOutcome::Yielded {
            self.cache_task = Some(task);
        }
        Some(outcome)
    }

    // ── Scrolling ──────────────────────────────────────────────────────

    /// Applies a gesture delta (positive scrolls toward the content end) and
    /// returns how much of it was consumed.
    ///
    /// At a boundary the delta clamps unless an edge effect is configured or
    /// the nested-scroll coordinator set the over-scroll flag; the clamped
    /// remainder is reported unconsumed so ancestors can take it.
    pub fn apply_delta(&mut self, delta: f32) -> f32 {
        if delta == 0.0 {
            return 0.0;
        }
        let over = self.over_scroll_offset(delta);
        let interior = delta + over.start - over.end;
        let allowed = self.can_over_scroll || self.edge_effect != EdgeEffect::None;

        if interior != 0.0 {
            self.info.push_delta(interior);
            self.measure_frame();
        }
        if allowed {
            self.over_scroll += over.start - over.end;
            delta
        } else {
            interior
        }
    }

    /// How much of `delta` would push beyond the content bounds.
    pub fn over_scroll_offset(&self, delta: f32) -> OverScroll {
        let target = self.info.scroll_position() + delta;
        OverScroll {
            start: (-target).max(0.0),
            end: (target - self.max_scroll()).max(0.0),
        }
    }

    /// Current over-scroll displacement: positive past the start edge,
    /// negative past the end edge. Driven back to zero by the host's edge
    /// effect animation.
    pub fn over_scroll_displacement(&self) -> f32 {
        self.over_scroll
    }

    pub fn release_over_scroll(&mut self) {
        self.over_scroll = 0.0;
    }

    /// Requests a jump that brings `index` into view on the next frame.
    pub fn jump_to(&mut self, index: usize, align: ScrollAlign) {
        self.info.request_jump(index, align);
    }

    /// Requests matrix extension to `index` for an animated scroll.
    pub fn scroll_to_target(&mut self, index: usize) {
        self.info.request_target(index);
    }

    // ── Boundary queries ───────────────────────────────────────────────

    /// Estimated total content extent, for scrollbar sizing.
    pub fn content_height(&self) -> f32 {
        self.info.estimated_content_height(self.config.main_gap)
    }

    /// Estimated content offset of the viewport top, for scrollbar
    /// positioning.
    pub fn content_offset(&self) -> f32 {
        self.info.scroll_position()
    }

    /// Distance from the viewport bottom to the content end.
    pub fn distance_to_bottom(&self) -> f32 {
        (self.content_height() - self.content_offset() - self.viewport.main_extent).max(0.0)
    }

    /// Whether the viewport currently rests at `edge`.
    pub fn is_at_edge(&self, edge: ScrollEdgeType) -> bool {
        match edge {
            ScrollEdgeType::Top => self.info.reach_start() && self.content_offset() <= 0.0,
            ScrollEdgeType::Bottom => self.info.offset_end(),
        }
    }

    /// The realized `[start, end]` item window, for items-visible events.
    pub fn visible_range(&self) -> (usize, usize) {
        (self.info.start_index(), self.info.end_index())
    }

    // ── Restore state ──────────────────────────────────────────────────

    /// Restart-persistence state: the start item index as decimal.
    pub fn restore_state_string(&self) -> String {
        self.info.restore_state_string()
    }

    /// Applies a previously saved restore string; invalid input is ignored.
    pub fn apply_restore_state(&mut self, state: &str) {
        self.info.apply_restore_state(state);
    }

    fn max_scroll(&self) -> f32 {
        (self.content_height() - self.viewport.main_extent).max(0.0)
    }
}
