//! Large-offset skip and lazy backfill behavior.

use gridwave_core::IdleDeadline;
use gridwave_foundation::{GridMeasureConfig, GridViewport, IdleOutcome, ScrollSession};
use gridwave_testing::{TruncatedProvider, UniformProvider, VariedProvider};
use gridwave_ui_layout::{ScrollEdgeType, TrackTemplate};
use web_time::Duration;

fn config(lanes: usize) -> GridMeasureConfig {
    GridMeasureConfig {
        template: TrackTemplate::uniform(lanes),
        ..Default::default()
    }
}

#[test]
fn skip_keeps_window_invariants() {
    let heights: Vec<f32> = (0..240).map(|i| 30.0 + (i % 7) as f32 * 10.0).collect();
    let mut session = ScrollSession::new(VariedProvider::new(heights), config(2));
    session.set_viewport(GridViewport::new(300.0, 200.0));
    session.measure_frame();

    // Five viewport heights in one gesture takes the skip path.
    session.apply_delta(1500.0);

    let (start, end) = session.visible_range();
    assert!(start <= end, "start {} > end {}", start, end);
    assert!(start > 0, "skip did not move the window");
    assert!(!session.info().reach_start());
    assert!(!session.info().reach_end());
}

#[test]
fn skip_to_far_end_sets_reach_end() {
    let mut session = ScrollSession::new(UniformProvider::new(120, 50.0), config(2));
    session.set_viewport(GridViewport::new(300.0, 200.0));
    session.measure_frame();

    // Far past the content end: clamps to the last window.
    session.apply_delta(1_000_000.0);

    let (start, end) = session.visible_range();
    assert!(start <= end);
    assert_eq!(end, 119);
    assert!(session.info().reach_end());
    assert!(session.is_at_edge(ScrollEdgeType::Bottom));
}

#[test]
fn skip_back_to_top_sets_reach_start() {
    let mut session = ScrollSession::new(UniformProvider::new(120, 50.0), config(2));
    session.set_viewport(GridViewport::new(300.0, 200.0));
    session.measure_frame();
    session.apply_delta(2000.0);
    assert!(session.visible_range().0 > 0);

    session.apply_delta(-1_000_000.0);
    assert_eq!(session.visible_range().0, 0);
    assert_eq!(session.content_offset(), 0.0);
    assert!(session.info().reach_start());
    assert!(session.is_at_edge(ScrollEdgeType::Top));
}

#[test]
fn skipped_region_is_backfilled_on_idle() {
    let mut session = ScrollSession::new(UniformProvider::new(200, 50.0), config(2));
    session.set_viewport(GridViewport::new(300.0, 200.0));
    session.measure_frame();

    session.apply_delta(1200.0);

    // The skipped-over lines were estimated, not measured.
    let skipped_line = 10;
    assert!(session.info().line_height(skipped_line).is_none());

    let outcome = session.run_cache_ahead(IdleDeadline::after(Duration::from_secs(10)));
    assert_eq!(outcome, Some(IdleOutcome::Finished));
    assert_eq!(session.info().line_height(skipped_line), Some(50.0));

    // Nothing pending afterwards.
    assert_eq!(
        session.run_cache_ahead(IdleDeadline::after(Duration::from_secs(10))),
        None
    );
}

#[test]
fn repeated_skips_converge_after_backfill() {
    // The skip estimator intentionally compounds error from the running
    // average; real measurements correct the window afterwards.
    let heights: Vec<f32> = (0..300)
        .map(|i| if i % 3 == 0 { 90.0 } else { 40.0 })
        .collect();
    let mut session = ScrollSession::new(VariedProvider::new(heights), config(1));
    session.set_viewport(GridViewport::new(250.0, 200.0));
    session.measure_frame();

    session.apply_delta(1300.0);
    session.apply_delta(1300.0);
    let (start, end) = session.visible_range();
    assert!(start <= end);

    // Backfill then jump home; the engine recovers exactly.
    while session.run_cache_ahead(IdleDeadline::after(Duration::from_secs(10))).is_some() {}
    session.apply_delta(-1_000_000.0);
    assert_eq!(session.visible_range().0, 0);
    assert_eq!(session.content_offset(), 0.0);
}

#[test]
fn exhausted_provider_is_terminal_not_error() {
    // 100 declared items but only 10 creatable: the fill direction just
    // ends and the reach flag is set.
    let mut session = ScrollSession::new(TruncatedProvider::new(100, 40.0, 10), config(2));
    session.set_viewport(GridViewport::new(400.0, 200.0));
    session.measure_frame();

    assert_eq!(session.visible_range(), (0, 9));
    assert!(session.info().reach_end());
    assert!(session.is_at_edge(ScrollEdgeType::Bottom));
}

#[test]
fn yielded_backfill_resumes_across_idle_slots() {
    let mut session = ScrollSession::new(UniformProvider::new(400, 50.0), config(2));
    session.set_viewport(GridViewport::new(300.0, 200.0));
    session.measure_frame();
    session.apply_delta(5000.0);

    // An already-expired deadline measures nothing and yields.
    let outcome = session.run_cache_ahead(IdleDeadline::after(Duration::ZERO));
    assert_eq!(outcome, Some(IdleOutcome::Yielded));

    // The re-posted task finishes with a real deadline.
    let outcome = session.run_cache_ahead(IdleDeadline::after(Duration::from_secs(10)));
    assert_eq!(outcome, Some(IdleOutcome::Finished));
}
