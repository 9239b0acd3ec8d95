/// Represents the main scroll axis of a grid.
///
/// The grid lays lines out along the main axis and lanes along the cross
/// axis: a vertical grid scrolls through rows of columns, a horizontal grid
/// scrolls through columns of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal main axis.
    /// Main axis: left to right
    /// Cross axis: top to bottom
    Horizontal,

    /// Vertical main axis.
    /// Main axis: top to bottom
    /// Cross axis: left to right
    Vertical,
}

impl Axis {
    /// Returns the opposite axis.
    #[inline]
    pub fn cross_axis(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    /// Returns true if this is the horizontal axis.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Axis::Horizontal)
    }

    /// Returns true if this is the vertical axis.
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Axis::Vertical)
    }

    /// Selects the main-axis component of a `(width, height)` pair.
    #[inline]
    pub fn main_extent(self, width: f32, height: f32) -> f32 {
        match self {
            Axis::Horizontal => width,
            Axis::Vertical => height,
        }
    }

    /// Selects the cross-axis component of a `(width, height)` pair.
    #[inline]
    pub fn cross_extent(self, width: f32, height: f32) -> f32 {
        match self {
            Axis::Horizontal => height,
            Axis::Vertical => width,
        }
    }
}
