//! Persistent per-grid layout state.
//!
//! [`GridLayoutInfo`] is the single source of truth for one grid instance:
//! the sparse placement matrix, the line-height cache, the realized window,
//! scroll offsets and one-shot requests. It is exclusively owned and mutated
//! by the active measure pass during one frame, then handed to the next
//! frame's pass by move at the frame boundary — a single-writer invariant
//! enforced by ownership rather than locking.

use std::collections::{BTreeMap, HashMap};

use gridwave_core::FrameGeneration;
use gridwave_ui_layout::ScrollAlign;

/// Fallback line-height estimate used before anything has been measured.
/// 48.0 is a common list item height (Material Design list tile).
pub const DEFAULT_LINE_HEIGHT_ESTIMATE: f32 = 48.0;

/// One occupied slot of the placement matrix.
///
/// The anchor cell carries the true item index; every other cell covered by
/// a multi-span item is a tail that encodes "same item, not the anchor", so
/// callers can distinguish "occupied by this item" from "this is where the
/// measurement data lives". (The source convention of negating the index
/// cannot represent a tail of item 0; the tagged cell can.)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixCell {
    /// First cell of an item, in scan order.
    Anchor(usize),
    /// Continuation cell of a multi-span item anchored elsewhere.
    Tail(usize),
}

impl MatrixCell {
    /// The item index occupying this cell, anchor or tail.
    #[inline]
    pub fn item(self) -> usize {
        match self {
            MatrixCell::Anchor(index) | MatrixCell::Tail(index) => index,
        }
    }

    /// True for the cell that carries the item's measurement data.
    #[inline]
    pub fn is_anchor(self) -> bool {
        matches!(self, MatrixCell::Anchor(_))
    }
}

/// Structural inputs whose change invalidates persisted placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructureSignature {
    /// Lane count derived from the track template.
    pub cross_count: usize,
    /// Total item count.
    pub children_count: usize,
    /// Identity of the layout options (span table, template revision).
    pub options_id: u64,
}

/// Scan cursor of the matrix filler, persisted between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillCursor {
    pub line: i32,
    pub lane: i32,
}

/// Persistent layout state for one grid instance.
#[derive(Debug, Default)]
pub struct GridLayoutInfo {
    /// Sparse line → (lane → cell) placement matrix.
    matrix: BTreeMap<i32, BTreeMap<i32, MatrixCell>>,

    /// Main-axis extent per line, populated only for measured lines.
    line_heights: BTreeMap<i32, f32>,

    /// Measured main-axis extent per item, the per-item side of the
    /// line-height cache. Trimmed together with the matrix.
    item_extents: HashMap<usize, f32>,

    /// Realized item window.
    pub(crate) start_index: usize,
    pub(crate) end_index: usize,

    /// Realized line window.
    pub(crate) start_line: i32,
    pub(crate) end_line: i32,

    /// Content-space position of the top of `start_line`, estimate-corrected
    /// as real measurements arrive.
    pub(crate) start_line_position: f32,

    /// Scroll residual inside `start_line`: how far the viewport top sits
    /// below the line top. Non-negative after normalization; positive means
    /// content scrolled down from the top.
    pub(crate) current_offset: f32,
    pub(crate) prev_offset: f32,

    /// Template-derived lane count and total item count.
    pub(crate) cross_count: usize,
    pub(crate) children_count: usize,

    /// One-shot requests, consumed and cleared by a single measure pass.
    pub(crate) jump_index: Option<usize>,
    pub(crate) scroll_align: ScrollAlign,
    pub(crate) target_index: Option<usize>,
    pub(crate) pending_delta: f32,

    /// Edge and consistency flags.
    pub(crate) reach_start: bool,
    pub(crate) reach_end: bool,
    pub(crate) offset_end: bool,
    pub(crate) has_multi_span_items: bool,
    pub(crate) synced: bool,

    /// Incremental height statistics backing `average_line_height`.
    total_known_height: f32,

    /// Matrix fill progress: next unplaced item and the scan cursor.
    pub(crate) next_fill_index: usize,
    pub(crate) fill_cursor: FillCursor,

    /// Line range skipped by a large-offset jump, awaiting lazy backfill.
    pub(crate) pending_backfill: Option<(i32, i32)>,

    /// Bumped on jumps and resets; stale idle work compares against it.
    pub(crate) generation: FrameGeneration,

    /// Signature of the structure this state was built for.
    pub(crate) signature: Option<StructureSignature>,
}

impl GridLayoutInfo {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Matrix access ──────────────────────────────────────────────────

    /// The cell at `(line, lane)`, if occupied.
    pub fn cell_at(&self, line: i32, lane: i32) -> Option<MatrixCell> {
        self.matrix.get(&line).and_then(|row| row.get(&lane)).copied()
    }

    /// The item index occupying `(line, lane)`, anchor or tail.
    pub fn item_at(&self, line: i32, lane: i32) -> Option<usize> {
        self.cell_at(line, lane).map(MatrixCell::item)
    }

    /// True when `(line, lane)` holds no item.
    #[inline]
    pub fn is_cell_free(&self, line: i32, lane: i32) -> bool {
        self.cell_at(line, lane).is_none()
    }

    /// True when the matrix holds any cell on `line`.
    pub fn line_has_data(&self, line: i32) -> bool {
        self.matrix.get(&line).is_some_and(|row| !row.is_empty())
    }

    /// Occupied cells of `line` in lane order.
    pub fn line_cells(&self, line: i32) -> impl Iterator<Item = (i32, MatrixCell)> + '_ {
        self.matrix
            .get(&line)
            .into_iter()
            .flat_map(|row| row.iter().map(|(&lane, &cell)| (lane, cell)))
    }

    pub(crate) fn set_cell(&mut self, line: i32, lane: i32, cell: MatrixCell) {
        self.matrix.entry(line).or_default().insert(lane, cell);
    }

    /// The line containing the anchor of `index`, if placed.
    ///
    /// Regular layouts resolve arithmetically; irregular layouts scan the
    /// matrix for the anchor.
    pub fn find_item_line(&self, index: usize) -> Option<i32> {
        if !self.has_multi_span_items && self.cross_count > 0 {
            let line = (index / self.cross_count) as i32;
            return if index < self.next_fill_index || self.line_has_data(line) {
                Some(line)
            } else {
                None
            };
        }
        for (&line, row) in &self.matrix {
            for cell in row.values() {
                if *cell == MatrixCell::Anchor(index) {
                    return Some(line);
                }
            }
        }
        None
    }

    /// The anchor cell of `item`, searching at `at_or_above` and upward.
    ///
    /// An anchor always sits at or above (and at or before, in lanes) every
    /// tail of its item, so the scan walks lines downward from
    /// `at_or_above` and usually terminates within the item's row span.
    pub fn find_anchor_cell(&self, item: usize, at_or_above: i32) -> Option<(i32, i32)> {
        for (&line, row) in self.matrix.range(..=at_or_above).rev() {
            for (&lane, &cell) in row {
                if cell == MatrixCell::Anchor(item) {
                    return Some((line, lane));
                }
            }
        }
        None
    }

    /// The smallest item index present on `line`, or the nearest anchored
    /// predecessor when `(line, 0)` holds no regular item.
    pub fn anchor_index_for_line(&self, line: i32) -> Option<usize> {
        if let Some(index) = self.item_at(line, 0) {
            return Some(index);
        }
        self.matrix
            .get(&line)
            .and_then(|row| row.values().map(|cell| cell.item()).min())
    }

    /// The largest item index present on `line`.
    pub fn last_index_on_line(&self, line: i32) -> Option<usize> {
        self.matrix
            .get(&line)
            .and_then(|row| row.values().map(|cell| cell.item()).max())
    }

    // ── Line heights & estimation ──────────────────────────────────────

    /// Records the measured main-axis extent of `line`.
    pub fn record_line_height(&mut self, line: i32, height: f32) {
        if let Some(old) = self.line_heights.insert(line, height) {
            self.total_known_height += height - old;
        } else {
            self.total_known_height += height;
        }
    }

    /// The measured height of `line`, if known.
    #[inline]
    pub fn line_height(&self, line: i32) -> Option<f32> {
        self.line_heights.get(&line).copied()
    }

    /// Number of lines with a measured height.
    #[inline]
    pub fn known_line_count(&self) -> usize {
        self.line_heights.len()
    }

    /// Running average of measured line heights, recomputed from the latest
    /// known values on every call — never cached stale. Falls back to
    /// [`DEFAULT_LINE_HEIGHT_ESTIMATE`] before anything was measured.
    pub fn average_line_height(&self) -> f32 {
        if self.line_heights.is_empty() {
            DEFAULT_LINE_HEIGHT_ESTIMATE
        } else {
            self.total_known_height / self.line_heights.len() as f32
        }
    }

    /// The height of `line`, estimated when unmeasured. The flag reports
    /// whether the value is an estimate.
    pub fn line_height_or_estimate(&self, line: i32) -> (f32, bool) {
        match self.line_height(line) {
            Some(height) => (height, false),
            None => (self.average_line_height(), true),
        }
    }

    /// Records the measured main-axis extent of one item.
    pub(crate) fn record_item_extent(&mut self, index: usize, extent: f32) {
        self.item_extents.insert(index, extent);
    }

    /// The cached main-axis extent of `index`, if it was ever measured.
    #[inline]
    pub fn item_extent(&self, index: usize) -> Option<f32> {
        self.item_extents.get(&index).copied()
    }

    /// Estimated total line count.
    ///
    /// Exact once every item is placed; otherwise lines filled so far plus
    /// the remaining items spread across the lanes.
    pub fn total_lines_estimate(&self) -> i32 {
        if self.children_count == 0 || self.cross_count == 0 {
            return 0;
        }
        if !self.has_multi_span_items {
            return self.children_count.div_ceil(self.cross_count) as i32;
        }
        let filled_lines = self
            .matrix
            .keys()
            .next_back()
            .map(|&line| line + 1)
            .unwrap_or(0);
        if self.next_fill_index >= self.children_count {
            return filled_lines;
        }
        let remaining = self.children_count - self.next_fill_index;
        filled_lines + remaining.div_ceil(self.cross_count) as i32
    }

    /// Estimated main-axis extent of the full content, gaps included.
    pub fn estimated_content_height(&self, main_gap: f32) -> f32 {
        let lines = self.total_lines_estimate();
        if lines == 0 {
            return 0.0;
        }
        let unknown = (lines as usize).saturating_sub(self.line_heights.len());
        let heights = self.total_known_height + unknown as f32 * self.average_line_height();
        heights + main_gap * (lines - 1).max(0) as f32
    }

    /// Estimated content-space scroll position of the viewport top.
    pub fn scroll_position(&self) -> f32 {
        self.start_line_position + self.current_offset
    }

    // ── Window & flags ─────────────────────────────────────────────────

    #[inline]
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    #[inline]
    pub fn end_index(&self) -> usize {
        self.end_index
    }

    #[inline]
    pub fn start_line(&self) -> i32 {
        self.start_line
    }

    #[inline]
    pub fn end_line(&self) -> i32 {
        self.end_line
    }

    #[inline]
    pub fn current_offset(&self) -> f32 {
        self.current_offset
    }

    #[inline]
    pub fn cross_count(&self) -> usize {
        self.cross_count
    }

    #[inline]
    pub fn children_count(&self) -> usize {
        self.children_count
    }

    #[inline]
    pub fn reach_start(&self) -> bool {
        self.reach_start
    }

    #[inline]
    pub fn reach_end(&self) -> bool {
        self.reach_end
    }

    #[inline]
    pub fn offset_end(&self) -> bool {
        self.offset_end
    }

    #[inline]
    pub fn has_multi_span_items(&self) -> bool {
        self.has_multi_span_items
    }

    /// True when this state reflects the latest frame's inputs.
    #[inline]
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    #[inline]
    pub fn generation(&self) -> FrameGeneration {
        self.generation
    }

    /// Recomputes `start_index`/`end_index` from the matrix for the realized
    /// line window.
    pub(crate) fn update_window_indices(&mut self) {
        if let Some(index) = self.anchor_index_for_line(self.start_line) {
            self.start_index = index;
        }
        if let Some(index) = self.last_index_on_line(self.end_line) {
            self.end_index = index;
        }
        if self.end_index < self.start_index {
            self.end_index = self.start_index;
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.synced = false;
    }

    // ── One-shot requests ──────────────────────────────────────────────

    /// Requests a jump that brings `index` into view on the next pass.
    ///
    /// Indices outside `[0, children_count)` are silently ignored once the
    /// count is known; the request is validated again when consumed.
    pub fn request_jump(&mut self, index: usize, align: ScrollAlign) {
        if self.children_count > 0 && index >= self.children_count {
            return;
        }
        self.jump_index = Some(index);
        self.scroll_align = align;
        self.mark_dirty();
    }

    /// Requests matrix extension up to `index` (animated-scroll target) so
    /// its position is solvable without jumping.
    pub fn request_target(&mut self, index: usize) {
        if self.children_count > 0 && index >= self.children_count {
            return;
        }
        self.target_index = Some(index);
        self.mark_dirty();
    }

    /// Adds a gesture delta to be consumed by the next pass.
    pub fn push_delta(&mut self, delta: f32) {
        self.pending_delta += delta;
        self.mark_dirty();
    }

    pub(crate) fn take_pending_delta(&mut self) -> f32 {
        std::mem::take(&mut self.pending_delta)
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Clears all placement, measurement and window state.
    pub fn reset(&mut self) {
        self.matrix.clear();
        self.line_heights.clear();
        self.item_extents.clear();
        self.total_known_height = 0.0;
        self.start_index = 0;
        self.end_index = 0;
        self.start_line = 0;
        self.end_line = 0;
        self.start_line_position = 0.0;
        self.current_offset = 0.0;
        self.prev_offset = 0.0;
        self.reach_start = false;
        self.reach_end = false;
        self.offset_end = false;
        self.next_fill_index = 0;
        self.fill_cursor = FillCursor::default();
        self.pending_backfill = None;
        self.synced = false;
        self.generation.bump();
    }

    /// Drops placement and measurement data for `line` and everything after
    /// it, rewinding the fill cursor to the smallest index that was removed.
    ///
    /// A row-span item whose anchor sits above `line` but whose tail reaches
    /// into the cleared region widens the clear to its anchor line, so no
    /// half-placed item survives.
    pub fn reset_from_line(&mut self, line: i32) {
        // Tails removed without their anchor point at items anchored above.
        let mut dangling: Option<usize> = None;
        for (_, row) in self.matrix.range(line..) {
            for cell in row.values() {
                if let MatrixCell::Tail(item) = cell {
                    let anchored_above = self
                        .matrix
                        .range(..line)
                        .any(|(_, kept)| kept.values().any(|c| *c == MatrixCell::Anchor(*item)));
                    if anchored_above {
                        dangling = Some(dangling.map_or(*item, |low| low.min(*item)));
                    }
                }
            }
        }
        if let Some(item) = dangling {
            if let Some(anchor_line) = self.find_item_line(item) {
                if anchor_line < line {
                    self.reset_from_line(anchor_line);
                    return;
                }
            }
        }

        let removed_lines: Vec<i32> = self.matrix.range(line..).map(|(&l, _)| l).collect();
        let mut lowest_removed: Option<usize> = None;
        for l in removed_lines {
            if let Some(row) = self.matrix.remove(&l) {
                for cell in row.values() {
                    let item = cell.item();
                    self.item_extents.remove(&item);
                    lowest_removed = Some(lowest_removed.map_or(item, |low| low.min(item)));
                }
            }
        }
        let removed_heights: Vec<i32> = self.line_heights.range(line..).map(|(&l, _)| l).collect();
        for l in removed_heights {
            if let Some(height) = self.line_heights.remove(&l) {
                self.total_known_height -= height;
            }
        }
        if let Some(lowest) = lowest_removed {
            self.next_fill_index = self.next_fill_index.min(lowest);
        }
        // The cursor only ever rewinds; clearing beyond the placed region
        // must not teleport it forward past unplaced cells.
        if line <= self.fill_cursor.line {
            self.fill_cursor = FillCursor { line, lane: 0 };
        }
        self.pending_backfill = None;
        self.synced = false;
        self.generation.bump();
    }

    /// Drops placement data from the line containing `index` onward.
    pub fn clear_from_index(&mut self, index: usize) {
        let line = if let Some(line) = self.find_item_line(index) {
            line
        } else if !self.has_multi_span_items && self.cross_count > 0 {
            (index / self.cross_count) as i32
        } else {
            return;
        };
        self.reset_from_line(line);
    }

    // ── Restore state ──────────────────────────────────────────────────

    /// Serializes the restart-persistence state: `start_index` as decimal.
    pub fn restore_state_string(&self) -> String {
        self.start_index.to_string()
    }

    /// Applies a restore-state string by requesting a start-aligned jump to
    /// the recorded index. Invalid input is silently ignored.
    pub fn apply_restore_state(&mut self, state: &str) {
        if let Ok(index) = state.trim().parse::<usize>() {
            self.request_jump(index, ScrollAlign::Start);
        }
    }
}
