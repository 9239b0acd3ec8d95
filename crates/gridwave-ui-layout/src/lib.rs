//! Layout contracts & grid track templates for Gridwave

mod alignment;
mod axis;
mod constraints;
mod span;
mod template;

pub use alignment::*;
pub use axis::*;
pub use constraints::*;
pub use span::*;
pub use template::*;

pub mod prelude {
    pub use crate::alignment::{ScrollAlign, ScrollEdgeType};
    pub use crate::axis::Axis;
    pub use crate::constraints::Constraints;
    pub use crate::span::GridSpan;
    pub use crate::template::TrackTemplate;
}
