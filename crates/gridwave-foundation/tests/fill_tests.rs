//! Matrix filling properties driven through full measure passes.

use gridwave_foundation::{GridMeasureConfig, GridViewport, ScrollSession};
use gridwave_testing::{
    assert_matrix_consistent, matrix_snapshot, SpannedProvider, UniformProvider,
};
use gridwave_ui_layout::{GridSpan, TrackTemplate};

fn config(lanes: usize) -> GridMeasureConfig {
    GridMeasureConfig {
        template: TrackTemplate::uniform(lanes),
        ..Default::default()
    }
}

#[test]
fn forward_fill_is_idempotent() {
    let mut session = ScrollSession::new(UniformProvider::new(60, 50.0), config(3));
    session.set_viewport(GridViewport::new(200.0, 300.0));

    session.measure_frame();
    let lines = session.info().total_lines_estimate();
    let first = matrix_snapshot(session.info(), lines);
    let first_offset = session.content_offset();

    // Re-entering the pass with no offset change must not move anything.
    session.measure_frame();
    assert_eq!(matrix_snapshot(session.info(), lines), first);
    assert_eq!(session.content_offset(), first_offset);
    assert_eq!(session.visible_range(), (0, 11));
}

#[test]
fn only_window_items_are_measured() {
    let mut session = ScrollSession::new(UniformProvider::new(60, 50.0), config(3));
    session.set_viewport(GridViewport::new(200.0, 300.0));
    session.measure_frame();

    // 200px viewport over 50px lines realizes 4 lines of 3 items.
    assert_eq!(session.provider().measure_calls(), 12);

    // A second pass serves everything from the caches.
    session.measure_frame();
    assert_eq!(session.provider().measure_calls(), 12);
}

#[test]
fn documented_span_matrix_through_full_pass() {
    // 3-column template, 10 items, item 0 spanning 2 columns.
    let provider = SpannedProvider::new(10, 50.0, vec![(0, GridSpan::sized(1, 2))]);
    let mut session = ScrollSession::new(provider, config(3));
    session.set_viewport(GridViewport::new(400.0, 300.0));
    session.measure_frame();

    let info = session.info();
    assert_eq!(info.item_at(0, 0), Some(0));
    assert_eq!(info.item_at(0, 1), Some(0));
    assert_eq!(info.item_at(0, 2), Some(1));
    assert_eq!(info.total_lines_estimate(), 4);
    assert_matrix_consistent(info, 4);
}

#[test]
fn span_fill_produces_no_overlaps() {
    let spans = vec![
        (0, GridSpan::sized(2, 2)),
        (4, GridSpan::sized(1, 3)),
        (7, GridSpan::sized(3, 1)),
        (13, GridSpan::sized(2, 2)),
    ];
    let provider = SpannedProvider::new(24, 60.0, spans);
    let mut session = ScrollSession::new(provider, config(3));
    session.set_viewport(GridViewport::new(2000.0, 300.0));
    session.measure_frame();

    let lines = session.info().total_lines_estimate();
    assert_matrix_consistent(session.info(), lines);

    // All 24 items placed exactly once.
    let anchors: std::collections::BTreeSet<usize> = (0..lines)
        .flat_map(|line| {
            session
                .info()
                .line_cells(line)
                .filter(|(_, cell)| cell.is_anchor())
                .map(|(_, cell)| cell.item())
                .collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(anchors.len(), 24);
}

#[test]
fn lane_slots_and_rtl_mirroring() {
    let mut config = config(3);
    config.cross_gap = 10.0;
    let mut session = ScrollSession::new(UniformProvider::new(12, 50.0), config.clone());
    session.set_viewport(GridViewport::new(200.0, 320.0));
    let items = session.measure_frame().items.clone();

    // (320 - 2 * 10) / 3 = 100 per lane.
    let first = items.iter().find(|item| item.index == 0).unwrap();
    let third = items.iter().find(|item| item.index == 2).unwrap();
    assert_eq!(first.cross_offset, 0.0);
    assert_eq!(first.cross_size, 100.0);
    assert_eq!(third.cross_offset, 220.0);

    config.rtl = true;
    let mut session = ScrollSession::new(UniformProvider::new(12, 50.0), config);
    session.set_viewport(GridViewport::new(200.0, 320.0));
    let items = session.measure_frame().items.clone();
    let first = items.iter().find(|item| item.index == 0).unwrap();
    // Mirrored: lane 0 hugs the right edge.
    assert_eq!(first.cross_offset, 220.0);
}

#[test]
fn main_offsets_stack_with_gaps() {
    let mut config = config(2);
    config.main_gap = 10.0;
    let mut session = ScrollSession::new(UniformProvider::new(12, 50.0), config);
    session.set_viewport(GridViewport::new(300.0, 200.0));
    let items = session.measure_frame().items.clone();

    let row0 = items.iter().find(|item| item.index == 0).unwrap();
    let row1 = items.iter().find(|item| item.index == 2).unwrap();
    let row2 = items.iter().find(|item| item.index == 4).unwrap();
    assert_eq!(row0.main_offset, 0.0);
    assert_eq!(row1.main_offset, 60.0);
    assert_eq!(row2.main_offset, 120.0);
    assert_eq!(row0.main_size, 50.0);
}
