//! Jump resolution driven through the session API.

use gridwave_foundation::{GridMeasureConfig, GridViewport, ScrollSession};
use gridwave_testing::{linear_starting_line, UniformProvider, VariedProvider};
use gridwave_ui_layout::{ScrollAlign, ScrollEdgeType, TrackTemplate};

fn config(lanes: usize) -> GridMeasureConfig {
    GridMeasureConfig {
        template: TrackTemplate::uniform(lanes),
        ..Default::default()
    }
}

fn uniform_session() -> ScrollSession<UniformProvider> {
    let mut session = ScrollSession::new(UniformProvider::new(60, 50.0), config(3));
    session.set_viewport(GridViewport::new(200.0, 300.0));
    session.measure_frame();
    session
}

#[test]
fn jump_start_lands_with_zero_residual() {
    let mut session = uniform_session();
    session.jump_to(30, ScrollAlign::Start);
    session.measure_frame();

    // Item 30 anchors line 10 at position 500; the realized window's first
    // line offset is exactly 0.
    assert_eq!(session.visible_range().0, 30);
    assert_eq!(session.info().current_offset(), 0.0);
    assert_eq!(session.content_offset(), 500.0);
}

#[test]
fn jump_auto_to_visible_target_is_noop() {
    let mut session = uniform_session();
    session.jump_to(30, ScrollAlign::Start);
    session.measure_frame();
    let offset = session.content_offset();
    let window = session.visible_range();

    // A subsequent AUTO jump to the same index must not move anything.
    session.jump_to(30, ScrollAlign::Auto);
    session.measure_frame();
    assert_eq!(session.content_offset(), offset);
    assert_eq!(session.visible_range(), window);
}

#[test]
fn jump_auto_from_below_uses_end_alignment() {
    let mut session = uniform_session();
    // Target far below the window: AUTO resolves to End, placing the
    // target's trailing edge at the viewport bottom.
    session.jump_to(30, ScrollAlign::Auto);
    session.measure_frame();

    // Line 10 spans [500, 550); end-aligned viewport starts at 350.
    assert_eq!(session.content_offset(), 350.0);
    assert_eq!(session.visible_range().1, 32);
}

#[test]
fn jump_center_centers_the_line() {
    let mut session = uniform_session();
    session.jump_to(30, ScrollAlign::Center);
    session.measure_frame();
    // Center of line 10 is 525; viewport center lands there.
    assert_eq!(session.content_offset(), 425.0);
}

#[test]
fn jump_end_to_first_item_clamps_at_top() {
    let mut session = uniform_session();
    session.jump_to(30, ScrollAlign::Start);
    session.measure_frame();

    session.jump_to(0, ScrollAlign::End);
    session.measure_frame();
    assert_eq!(session.content_offset(), 0.0);
    assert!(session.is_at_edge(ScrollEdgeType::Top));
}

#[test]
fn jump_outside_children_is_ignored() {
    let mut session = uniform_session();
    let offset = session.content_offset();
    session.jump_to(60, ScrollAlign::Start);
    session.measure_frame();
    assert_eq!(session.content_offset(), offset);
    assert_eq!(session.visible_range().0, 0);
}

#[test]
fn jump_positions_agree_with_linear_reference() {
    // Single lane: line heights are item extents. Scroll through the whole
    // list first so every height is measured, then jumps are exact.
    let heights: Vec<f32> = (0..15).map(|i| 30.0 + (i % 7) as f32 * 10.0).collect();
    let mut session = ScrollSession::new(VariedProvider::new(heights.clone()), config(1));
    session.set_viewport(GridViewport::new(150.0, 100.0));
    session.measure_frame();
    for _ in 0..200 {
        session.apply_delta(40.0);
        if session.is_at_edge(ScrollEdgeType::Bottom) {
            break;
        }
    }
    assert!(session.is_at_edge(ScrollEdgeType::Bottom));

    let content: f32 = heights.iter().sum();
    let max_scroll = (content - 150.0).max(0.0);
    for index in [0usize, 3, 7, 11, 14] {
        session.jump_to(index, ScrollAlign::Start);
        session.measure_frame();

        // Brute-force position of line `index`.
        let mut expected = 0.0;
        for h in heights.iter().take(index) {
            expected += h;
        }
        let expected = expected.min(max_scroll);
        let (reference_line, _) = linear_starting_line(&heights, 0.0, expected);

        assert!(
            (session.content_offset() - expected).abs() < 1e-2,
            "jump to {}: offset {} expected {}",
            index,
            session.content_offset(),
            expected
        );
        assert_eq!(session.info().start_line(), reference_line as i32);
    }
}

#[test]
fn restore_state_jump_converges() {
    let mut session = uniform_session();
    session.jump_to(42, ScrollAlign::Start);
    session.measure_frame();
    let state = session.restore_state_string();
    assert_eq!(state, "42");

    let mut restored = uniform_session();
    restored.apply_restore_state(&state);
    restored.measure_frame();
    assert_eq!(restored.visible_range().0, 42);
    assert_eq!(restored.info().current_offset(), 0.0);
}
