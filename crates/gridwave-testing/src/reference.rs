//! Brute-force reference implementations.
//!
//! Deliberately naive: linear scans with no estimation or anchoring, used
//! to cross-check the incremental solver and the matrix invariants.

use gridwave_foundation::GridLayoutInfo;

/// Linear-scan reference for starting-line resolution: the greatest line
/// whose top is at or before `target`, with the residual inside it.
pub fn linear_starting_line(heights: &[f32], main_gap: f32, target: f32) -> (usize, f32) {
    let mut line = 0;
    let mut position = 0.0;
    while line + 1 < heights.len() && position + heights[line] + main_gap <= target {
        position += heights[line] + main_gap;
        line += 1;
    }
    (line, target - position)
}

/// Asserts the matrix invariants over `lines` lines: every occupied cell
/// belongs to exactly one item and every item has exactly one anchor.
pub fn assert_matrix_consistent(info: &GridLayoutInfo, lines: i32) {
    let mut anchors = std::collections::BTreeMap::new();
    for line in 0..lines {
        for (lane, cell) in info.line_cells(line) {
            if cell.is_anchor() {
                let previous = anchors.insert(cell.item(), (line, lane));
                assert!(
                    previous.is_none(),
                    "item {} anchored at {:?} and ({}, {})",
                    cell.item(),
                    previous.unwrap(),
                    line,
                    lane
                );
            }
        }
    }
    // Every tail references an item that is anchored somewhere above or
    // before it.
    for line in 0..lines {
        for (lane, cell) in info.line_cells(line) {
            if !cell.is_anchor() {
                let anchor = anchors.get(&cell.item());
                assert!(
                    anchor.is_some(),
                    "tail of item {} at ({}, {}) has no anchor",
                    cell.item(),
                    line,
                    lane
                );
                let &(anchor_line, anchor_lane) = anchor.unwrap();
                assert!(
                    anchor_line < line || (anchor_line == line && anchor_lane < lane),
                    "anchor of item {} does not precede its tail",
                    cell.item()
                );
            }
        }
    }
}

/// Collects the realized matrix as `(line, lane, item)` triples for
/// comparisons between passes.
pub fn matrix_snapshot(info: &GridLayoutInfo, lines: i32) -> Vec<(i32, i32, usize)> {
    let mut snapshot = Vec::new();
    for line in 0..lines {
        for (lane, cell) in info.line_cells(line) {
            snapshot.push((line, lane, cell.item()));
        }
    }
    snapshot
}
