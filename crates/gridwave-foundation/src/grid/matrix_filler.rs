//! Matrix placement and filling.
//!
//! Places item indices into the sparse matrix respecting row/column spans,
//! in cursor order: the scan never backtracks, a span that does not fit the
//! remaining lanes of the current line wraps to the next line, and already
//! occupied cells are never overwritten.

use gridwave_ui_layout::ItemSpan;

use super::item_provider::GridItemProvider;
use super::layout_info::{FillCursor, GridLayoutInfo, MatrixCell};

/// Fills the placement matrix of a [`GridLayoutInfo`].
///
/// Both the fill-eagerly path (synchronous measure) and the fill-lazily path
/// (idle cache-ahead) go through this type, so placement policy exists in
/// exactly one place.
pub struct MatrixFiller<'a> {
    info: &'a mut GridLayoutInfo,
}

impl<'a> MatrixFiller<'a> {
    pub fn new(info: &'a mut GridLayoutInfo) -> Self {
        Self { info }
    }

    /// Attempts to place a single item at the current scan cursor, advancing
    /// the cursor past the placed cells.
    ///
    /// Returns false when the item cannot be placed: zero lanes, an index
    /// already behind the cursor, or a structural collision. Collisions are
    /// a bug in the caller, not a transient failure — asserted in debug
    /// builds, skipped fail-closed in release.
    pub fn place_one(&mut self, index: usize, span: ItemSpan) -> bool {
        let cross_count = self.info.cross_count as i32;
        if cross_count <= 0 {
            return false;
        }
        if index != self.info.next_fill_index {
            debug_assert!(
                index == self.info.next_fill_index,
                "place_one out of order: expected {}, got {}",
                self.info.next_fill_index,
                index
            );
            log::warn!(
                "grid matrix: refusing out-of-order placement of item {} (cursor at {})",
                index,
                self.info.next_fill_index
            );
            return false;
        }

        let cross = (span.cross as i32).min(cross_count).max(1);
        let main = span.main.max(1) as i32;

        let FillCursor { mut line, mut lane } = self.info.fill_cursor;
        let (anchor_line, anchor_lane) = loop {
            match self.find_free_run(line, lane, cross, main) {
                Some(found_lane) => break (line, found_lane),
                None => {
                    line += 1;
                    lane = 0;
                }
            }
        };

        // The scan only yields free cells; a collision here means the
        // cursor or matrix is corrupt.
        for r in 0..main {
            for c in 0..cross {
                if !self.info.is_cell_free(anchor_line + r, anchor_lane + c) {
                    debug_assert!(false, "grid matrix: cell collision at ({}, {})", anchor_line + r, anchor_lane + c);
                    log::warn!(
                        "grid matrix: skipping item {} due to occupied cell ({}, {})",
                        index,
                        anchor_line + r,
                        anchor_lane + c
                    );
                    return false;
                }
            }
        }

        for r in 0..main {
            for c in 0..cross {
                let cell = if r == 0 && c == 0 {
                    MatrixCell::Anchor(index)
                } else {
                    MatrixCell::Tail(index)
                };
                self.info.set_cell(anchor_line + r, anchor_lane + c, cell);
            }
        }

        self.info.next_fill_index = index + 1;
        self.advance_cursor(anchor_line, anchor_lane + cross);
        true
    }

    /// Fills forward until `until_index` is placed or items run out.
    ///
    /// Idempotent: when the region is already filled this is a no-op that
    /// returns the same result. Returns the index the fill reached, or
    /// `None` for an empty grid.
    pub fn fill_until_index(
        &mut self,
        provider: &dyn GridItemProvider,
        until_index: usize,
    ) -> Option<usize> {
        let count = self.info.children_count;
        if count == 0 {
            return None;
        }
        let until = until_index.min(count - 1);
        while self.info.next_fill_index <= until {
            let index = self.info.next_fill_index;
            let span = provider.span(index).resolve(self.info.cross_count);
            if !self.place_one(index, span) {
                // Fail-closed: skip the offending placement.
                self.info.next_fill_index = index + 1;
            }
        }
        Some(until)
    }

    /// Fills forward until `line` is complete — the scan cursor has moved
    /// past it — or items run out. Returns true when the line has data
    /// afterwards.
    ///
    /// Completeness matters at the matrix frontier: a line that already
    /// holds its first item may still have free cells waiting for the next
    /// indices.
    pub fn fill_to_line(&mut self, provider: &dyn GridItemProvider, line: i32) -> bool {
        while self.info.next_fill_index < self.info.children_count
            && self.info.fill_cursor.line <= line
        {
            let index = self.info.next_fill_index;
            let span = provider.span(index).resolve(self.info.cross_count);
            if !self.place_one(index, span) {
                self.info.next_fill_index = index + 1;
            }
        }
        self.info.line_has_data(line)
    }

    /// Finds the lowest lane on `line`, at or after `from_lane`, where a
    /// `cross`-wide, `main`-deep rectangle is free. Lines below the scan
    /// line only carry tails of earlier items, so the depth check rarely
    /// rejects.
    fn find_free_run(&self, line: i32, from_lane: i32, cross: i32, main: i32) -> Option<i32> {
        let cross_count = self.info.cross_count as i32;
        let mut lane = from_lane;
        'candidate: while lane + cross <= cross_count {
            for r in 0..main {
                for c in 0..cross {
                    if !self.info.is_cell_free(line + r, lane + c) {
                        lane += 1;
                        continue 'candidate;
                    }
                }
            }
            return Some(lane);
        }
        None
    }

    /// Moves the cursor to the first free cell at or after `(line, lane)`.
    fn advance_cursor(&mut self, line: i32, lane: i32) {
        let cross_count = self.info.cross_count as i32;
        let mut cursor = FillCursor { line, lane };
        if cursor.lane >= cross_count {
            cursor.line += 1;
            cursor.lane = 0;
        }
        while !self.info.is_cell_free(cursor.line, cursor.lane) {
            cursor.lane += 1;
            if cursor.lane >= cross_count {
                cursor.line += 1;
                cursor.lane = 0;
            }
        }
        self.info.fill_cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwave_ui_layout::GridSpan;

    struct SpanProvider {
        count: usize,
        spans: Vec<(usize, GridSpan)>,
    }

    impl GridItemProvider for SpanProvider {
        fn item_count(&self) -> usize {
            self.count
        }

        fn provide_item(&mut self, _index: usize, _cross_size: f32) -> Option<f32> {
            Some(40.0)
        }

        fn span(&self, index: usize) -> GridSpan {
            self.spans
                .iter()
                .find(|(i, _)| *i == index)
                .map(|(_, s)| *s)
                .unwrap_or_else(GridSpan::unit)
        }

        fn has_multi_span_items(&self) -> bool {
            !self.spans.is_empty()
        }
    }

    fn info_with(cross_count: usize, children_count: usize) -> GridLayoutInfo {
        let mut info = GridLayoutInfo::new();
        info.cross_count = cross_count;
        info.children_count = children_count;
        info.has_multi_span_items = true;
        info
    }

    #[test]
    fn test_documented_matrix_example() {
        // 3-column template, 10 items, item 0 spanning 2 columns.
        let provider = SpanProvider {
            count: 10,
            spans: vec![(0, GridSpan::sized(1, 2))],
        };
        let mut info = info_with(3, 10);
        let mut filler = MatrixFiller::new(&mut info);
        filler.fill_until_index(&provider, 9);

        // Row 0 reads {0: 0, 1: 0, 2: 1}.
        assert_eq!(info.item_at(0, 0), Some(0));
        assert_eq!(info.item_at(0, 1), Some(0));
        assert_eq!(info.item_at(0, 2), Some(1));
        assert!(info.cell_at(0, 0).unwrap().is_anchor());
        assert!(!info.cell_at(0, 1).unwrap().is_anchor());

        // Line count after full fill = 4.
        assert_eq!(info.total_lines_estimate(), 4);
        assert_eq!(info.last_index_on_line(3), Some(9));
    }

    #[test]
    fn test_fill_is_idempotent() {
        let provider = SpanProvider {
            count: 6,
            spans: vec![(2, GridSpan::sized(1, 2))],
        };
        let mut info = info_with(3, 6);
        MatrixFiller::new(&mut info).fill_until_index(&provider, 5);
        let first_cursor = info.fill_cursor;
        let snapshot: Vec<_> = (0..4)
            .flat_map(|line| (0..3).map(move |lane| (line, lane)))
            .map(|(line, lane)| info.cell_at(line, lane))
            .collect();

        let result = MatrixFiller::new(&mut info).fill_until_index(&provider, 5);
        assert_eq!(result, Some(5));
        assert_eq!(info.fill_cursor, first_cursor);
        let again: Vec<_> = (0..4)
            .flat_map(|line| (0..3).map(move |lane| (line, lane)))
            .map(|(line, lane)| info.cell_at(line, lane))
            .collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_span_wraps_to_next_line() {
        // Lane layout: item 0 (1x1), item 1 wants 2 lanes but only 1 remains.
        let provider = SpanProvider {
            count: 3,
            spans: vec![(1, GridSpan::sized(1, 2))],
        };
        let mut info = info_with(2, 3);
        MatrixFiller::new(&mut info).fill_until_index(&provider, 2);

        assert_eq!(info.item_at(0, 0), Some(0));
        // The gap at (0, 1) stays free; item 1 wrapped.
        assert_eq!(info.item_at(0, 1), None);
        assert_eq!(info.item_at(1, 0), Some(1));
        assert_eq!(info.item_at(1, 1), Some(1));
        assert_eq!(info.item_at(2, 0), Some(2));
    }

    #[test]
    fn test_row_span_blocks_lanes_below() {
        // Item 0 spans 2 rows in lane 0; items 1..3 flow around it.
        let provider = SpanProvider {
            count: 4,
            spans: vec![(0, GridSpan::sized(2, 1))],
        };
        let mut info = info_with(2, 4);
        MatrixFiller::new(&mut info).fill_until_index(&provider, 3);

        assert_eq!(info.cell_at(0, 0), Some(MatrixCell::Anchor(0)));
        assert_eq!(info.cell_at(1, 0), Some(MatrixCell::Tail(0)));
        assert_eq!(info.item_at(0, 1), Some(1));
        assert_eq!(info.item_at(1, 1), Some(2));
        assert_eq!(info.item_at(2, 0), Some(3));
    }

    #[test]
    fn test_no_overlaps_in_random_span_fill() {
        let spans = vec![
            (0, GridSpan::sized(2, 2)),
            (3, GridSpan::sized(1, 3)),
            (5, GridSpan::sized(3, 1)),
            (8, GridSpan::sized(2, 2)),
        ];
        let provider = SpanProvider { count: 12, spans };
        let mut info = info_with(3, 12);
        MatrixFiller::new(&mut info).fill_until_index(&provider, 11);

        // Every item appears exactly once as an anchor.
        let mut anchors = std::collections::BTreeSet::new();
        for line in 0..info.total_lines_estimate() {
            for (_, cell) in info.line_cells(line) {
                if cell.is_anchor() {
                    assert!(anchors.insert(cell.item()), "item {} anchored twice", cell.item());
                }
            }
        }
        assert_eq!(anchors.len(), 12);
    }

    #[test]
    fn test_fill_to_line_stops_early_when_items_run_out() {
        let provider = SpanProvider {
            count: 4,
            spans: Vec::new(),
        };
        let mut info = info_with(3, 4);
        let reached = MatrixFiller::new(&mut info).fill_to_line(&provider, 5);
        assert!(!reached);
        assert_eq!(info.next_fill_index, 4);
    }

    #[test]
    fn test_zero_lanes_refuses_placement() {
        let mut info = GridLayoutInfo::new();
        info.children_count = 3;
        let mut filler = MatrixFiller::new(&mut info);
        assert!(!filler.place_one(0, ItemSpan::unit()));
    }
}
