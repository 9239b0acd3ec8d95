//! Scroll-offset and jump solving.
//!
//! Given a pixel target or a jump request, determines which matrix lines
//! must exist and where the viewport lands, using known line heights plus
//! the running average for lines that were never measured. Estimates are
//! recomputed from the latest known average on every use, never cached.

use gridwave_ui_layout::ScrollAlign;

use super::item_provider::GridItemProvider;
use super::layout_info::GridLayoutInfo;
use super::matrix_filler::MatrixFiller;

/// Result of resolving a pixel position to a matrix line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartingLine {
    /// The line containing the position (block start for row-span blocks).
    pub line: i32,
    /// Pixel distance from the line top to the position. May exceed the
    /// line height when the line starts a multi-line block, and may be
    /// negative in the over-scroll region before line 0.
    pub residual_offset: f32,
}

/// Result of resolving a jump request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpRange {
    pub start_line: i32,
    /// Residual scroll inside `start_line` after the jump.
    pub start_offset: f32,
    pub end_index: usize,
    pub end_line: i32,
}

/// Solves offsets and jumps against one grid's layout state.
pub struct RangeSolver<'a> {
    info: &'a mut GridLayoutInfo,
    main_gap: f32,
    viewport_extent: f32,
}

impl<'a> RangeSolver<'a> {
    pub fn new(info: &'a mut GridLayoutInfo, main_gap: f32, viewport_extent: f32) -> Self {
        Self {
            info,
            main_gap,
            viewport_extent,
        }
    }

    /// Resolves the content-space pixel position `target` to the line it
    /// falls inside, walking forward or backward from the known viewport
    /// anchor depending on the sign of the delta.
    ///
    /// For irregular layouts, lines covered by a row-span block are entered
    /// or skipped together: the returned line is the block start.
    pub fn find_starting_line(&self, target: f32) -> StartingLine {
        if target <= 0.0 {
            // Content start, regardless of accumulated estimate drift.
            return StartingLine {
                line: 0,
                residual_offset: target,
            };
        }
        let last_line = (self.info.total_lines_estimate() - 1).max(0);
        let mut line = self.block_start(self.info.start_line.clamp(0, last_line));
        let mut position = self.info.start_line_position;

        if target >= position {
            // Forward walk.
            loop {
                let (block_end, block_height) = self.block_metrics(line);
                let next = block_end + 1;
                if next > last_line || target < position + block_height + self.main_gap {
                    break;
                }
                position += block_height + self.main_gap;
                line = next;
            }
        } else {
            // Backward walk.
            while line > 0 && target < position {
                let prev = self.block_start(line - 1);
                let (_, block_height) = self.block_metrics(prev);
                position -= block_height + self.main_gap;
                line = prev;
            }
        }

        StartingLine {
            line,
            residual_offset: target - position,
        }
    }

    /// Resolves a jump request to the window it implies.
    ///
    /// Extends the matrix forward when `target_index` has not been placed
    /// yet. Invalid indices return `None` and leave all state untouched.
    pub fn find_range_on_jump(
        &mut self,
        provider: &mut dyn GridItemProvider,
        target_index: usize,
        align: ScrollAlign,
    ) -> Option<JumpRange> {
        if target_index >= self.info.children_count {
            return None;
        }
        MatrixFiller::new(self.info).fill_until_index(provider, target_index);
        let anchor_line = self.info.find_item_line(target_index)?;

        let span = provider
            .span(target_index)
            .resolve(self.info.cross_count.max(1));
        let target_top = self.position_of_line(anchor_line);
        let mut target_height = 0.0;
        for offset in 0..span.main as i32 {
            let (height, _) = self.info.line_height_or_estimate(anchor_line + offset);
            target_height += height;
        }
        target_height += self.main_gap * (span.main as i32 - 1).max(0) as f32;
        let target_bottom = target_top + target_height;

        let current = self.info.scroll_position();
        let viewport = self.viewport_extent;

        let resolved = match align {
            ScrollAlign::Start | ScrollAlign::None => Some(target_top),
            ScrollAlign::End => Some(target_bottom - viewport),
            ScrollAlign::Center => Some((target_top + target_bottom - viewport) / 2.0),
            ScrollAlign::Auto => {
                if target_top >= current && target_bottom <= current + viewport {
                    // Already fully visible: degrade to a no-op.
                    None
                } else if target_top < current {
                    // Leading edge violated: prefer Start, unless the target
                    // is taller than the viewport and start-alignment would
                    // leave the trailing edge off-screen.
                    if span.main > 1 && target_height > viewport {
                        Some(target_bottom - viewport)
                    } else {
                        Some(target_top)
                    }
                } else {
                    Some(target_bottom - viewport)
                }
            }
        };

        let new_position = match resolved {
            Some(position) => {
                let max_scroll =
                    (self.info.estimated_content_height(self.main_gap) - viewport).max(0.0);
                position.clamp(0.0, max_scroll)
            }
            None => current,
        };

        let start = self.find_starting_line(new_position);
        let end = self.find_starting_line(new_position + viewport);
        let end_index = self
            .info
            .last_index_on_line(end.line)
            .unwrap_or(target_index);

        Some(JumpRange {
            start_line: start.line,
            start_offset: start.residual_offset,
            end_index,
            end_line: end.line,
        })
    }

    /// Content-space position of the top of `line`, walking from the anchor
    /// so estimates stay consistent with [`RangeSolver::find_starting_line`].
    pub fn position_of_line(&self, line: i32) -> f32 {
        let anchor = self.info.start_line;
        let mut position = self.info.start_line_position;
        if line >= anchor {
            for l in anchor..line {
                let (height, _) = self.info.line_height_or_estimate(l);
                position += height + self.main_gap;
            }
        } else {
            for l in line..anchor {
                let (height, _) = self.info.line_height_or_estimate(l);
                position -= height + self.main_gap;
            }
        }
        position
    }

    fn block_start(&self, line: i32) -> i32 {
        block_start_of(self.info, line)
    }

    /// End line and total height (gaps included) of the block starting at
    /// `line`.
    fn block_metrics(&self, line: i32) -> (i32, f32) {
        let end = block_end_of(self.info, line);
        let mut height = 0.0;
        for l in line..=end {
            let (h, _) = self.info.line_height_or_estimate(l);
            height += h;
        }
        height += self.main_gap * (end - line) as f32;
        (end, height)
    }
}

/// True when some item occupies both `line - 1` and `line`, i.e. a row-span
/// block straddles the boundary above `line`.
pub(crate) fn straddles_boundary(info: &GridLayoutInfo, line: i32) -> bool {
    info.line_cells(line).any(|(_, cell)| {
        !cell.is_anchor()
            && info
                .line_cells(line - 1)
                .any(|(_, above)| above.item() == cell.item())
    })
}

/// Start line of the row-span block covering `line`. Lines outside any block
/// are their own block.
pub(crate) fn block_start_of(info: &GridLayoutInfo, line: i32) -> i32 {
    if !info.has_multi_span_items() {
        return line;
    }
    let mut start = line;
    while start > 0 && straddles_boundary(info, start) {
        start -= 1;
    }
    start
}

/// End line of the row-span block starting at `line`.
pub(crate) fn block_end_of(info: &GridLayoutInfo, line: i32) -> i32 {
    if !info.has_multi_span_items() {
        return line;
    }
    let mut end = line;
    while straddles_boundary(info, end + 1) {
        end += 1;
    }
    end
}
