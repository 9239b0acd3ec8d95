//! Idle-time cache-ahead measurement.
//!
//! The synchronous pass plans which out-of-window lines are worth
//! pre-measuring; the host runs the resulting task during scheduler idle
//! time. The task polls its deadline between lines and yields when it runs
//! out — cooperative preemption, not concurrency — and drops itself when
//! the layout generation moved on underneath it.

use std::collections::VecDeque;

use gridwave_core::{FrameGeneration, IdleDeadline};

use super::item_provider::GridItemProvider;
use super::layout_info::GridLayoutInfo;
use super::line_measurer::LineMeasurer;
use super::measure::{GridMeasureConfig, GridViewport};

/// Lines one measure pass wants pre-measured, skip-backfill first.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheAheadPlan {
    lines: VecDeque<i32>,
    generation: FrameGeneration,
}

impl CacheAheadPlan {
    pub(crate) fn new(lines: VecDeque<i32>, generation: FrameGeneration) -> Self {
        Self { lines, generation }
    }

    /// Remaining lines to measure, in priority order.
    pub fn lines(&self) -> &VecDeque<i32> {
        &self.lines
    }

    /// Layout generation the plan was made for.
    pub fn generation(&self) -> FrameGeneration {
        self.generation
    }
}

/// What a cache-ahead slice accomplished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleOutcome {
    /// Every planned line is measured; the task is done.
    Finished,
    /// The deadline passed mid-plan; re-post the task with a new deadline.
    Yielded,
    /// A jump or reset moved the layout generation; the pending work was
    /// dropped unexecuted.
    Stale,
}

/// Deadline-polled idle measurement task.
#[derive(Debug)]
pub struct CacheAheadTask {
    plan: CacheAheadPlan,
}

impl CacheAheadTask {
    pub fn new(plan: CacheAheadPlan) -> Self {
        Self { plan }
    }

    /// Lines still pending.
    pub fn remaining(&self) -> usize {
        self.plan.lines.len()
    }

    /// Measures planned lines until the plan is empty or the deadline
    /// expires, checking the deadline between lines.
    pub fn run(
        &mut self,
        info: &mut GridLayoutInfo,
        provider: &mut dyn GridItemProvider,
        config: &GridMeasureConfig,
        viewport: GridViewport,
        deadline: IdleDeadline,
    ) -> IdleOutcome {
        if info.generation() != self.plan.generation {
            self.plan.lines.clear();
            return IdleOutcome::Stale;
        }

        let lane_slots = config.template.resolve(viewport.cross_extent, config.cross_gap);
        let measurer = LineMeasurer::new(config, &lane_slots);

        while let Some(&line) = self.plan.lines.front() {
            if deadline.expired() {
                return IdleOutcome::Yielded;
            }
            self.plan.lines.pop_front();
            // A refused item just means this line cannot be cached yet; the
            // remaining plan lines may still succeed.
            let _ = measurer.measure_line(info, provider, line);
        }

        if let Some((low, high)) = info.pending_backfill {
            if (low..=high).all(|line| info.line_height(line).is_some()) {
                info.pending_backfill = None;
            }
        }
        IdleOutcome::Finished
    }
}
