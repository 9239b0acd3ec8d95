//! Deterministic item providers.

use std::cell::Cell;

use gridwave_foundation::GridItemProvider;
use gridwave_ui_layout::GridSpan;

/// Provider with one extent for every item.
pub struct UniformProvider {
    count: usize,
    extent: f32,
    measured: Cell<usize>,
}

impl UniformProvider {
    pub fn new(count: usize, extent: f32) -> Self {
        Self {
            count,
            extent,
            measured: Cell::new(0),
        }
    }

    /// How many provide calls the engine issued — the laziness probe.
    pub fn measure_calls(&self) -> usize {
        self.measured.get()
    }
}

impl GridItemProvider for UniformProvider {
    fn item_count(&self) -> usize {
        self.count
    }

    fn provide_item(&mut self, index: usize, _cross_size: f32) -> Option<f32> {
        if index >= self.count {
            return None;
        }
        self.measured.set(self.measured.get() + 1);
        Some(self.extent)
    }
}

/// Provider with an explicit extent per item.
pub struct VariedProvider {
    extents: Vec<f32>,
}

impl VariedProvider {
    pub fn new(extents: Vec<f32>) -> Self {
        Self { extents }
    }
}

impl GridItemProvider for VariedProvider {
    fn item_count(&self) -> usize {
        self.extents.len()
    }

    fn provide_item(&mut self, index: usize, _cross_size: f32) -> Option<f32> {
        self.extents.get(index).copied()
    }
}

/// Provider with span overrides on selected indices.
pub struct SpannedProvider {
    count: usize,
    extent: f32,
    spans: Vec<(usize, GridSpan)>,
}

impl SpannedProvider {
    pub fn new(count: usize, extent: f32, spans: Vec<(usize, GridSpan)>) -> Self {
        Self {
            count,
            extent,
            spans,
        }
    }
}

impl GridItemProvider for SpannedProvider {
    fn item_count(&self) -> usize {
        self.count
    }

    fn provide_item(&mut self, index: usize, _cross_size: f32) -> Option<f32> {
        (index < self.count).then_some(self.extent)
    }

    fn span(&self, index: usize) -> GridSpan {
        self.spans
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, span)| *span)
            .unwrap_or_else(GridSpan::unit)
    }

    fn has_multi_span_items(&self) -> bool {
        !self.spans.is_empty()
    }
}

/// Provider that refuses to realize items from a cutoff index on, modeling
/// data that is not yet creatable.
pub struct TruncatedProvider {
    count: usize,
    extent: f32,
    available_below: usize,
}

impl TruncatedProvider {
    pub fn new(count: usize, extent: f32, available_below: usize) -> Self {
        Self {
            count,
            extent,
            available_below,
        }
    }
}

impl GridItemProvider for TruncatedProvider {
    fn item_count(&self) -> usize {
        self.count
    }

    fn provide_item(&mut self, index: usize, _cross_size: f32) -> Option<f32> {
        (index < self.available_below).then_some(self.extent)
    }
}
