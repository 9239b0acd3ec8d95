//! Telemetry sink contract.
//!
//! Scene markers are emitted through an explicitly injected sink rather than
//! a process-wide singleton, so hosts decide where (and whether) timing data
//! goes.

/// Scroll/layout scenes whose start and end a host may want to time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scene {
    /// One synchronous measure+layout pass.
    MeasurePass,
    /// A programmatic jump to an item index.
    Jump,
    /// A large-offset skip over unmeasured lines.
    OffsetSkip,
    /// An idle cache-ahead slice.
    CacheAhead,
}

/// Receiver for scene markers.
///
/// Implementations must be cheap: markers are emitted inside the frame
/// budget.
pub trait TelemetrySink {
    /// Called when a scene begins.
    fn scene_start(&mut self, scene: Scene);

    /// Called when the matching scene ends.
    fn scene_end(&mut self, scene: Scene);
}

/// Sink that discards all markers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn scene_start(&mut self, _scene: Scene) {}

    fn scene_end(&mut self, _scene: Scene) {}
}

/// Sink that records markers in order, for tests.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Vec<(Scene, bool)>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(scene, is_start)` markers in emission order.
    pub fn events(&self) -> &[(Scene, bool)] {
        &self.events
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn scene_start(&mut self, scene: Scene) {
        self.events.push((scene, true));
    }

    fn scene_end(&mut self, scene: Scene) {
        self.events.push((scene, false));
    }
}
