//! Core services for Gridwave: node arena, frame stamps, telemetry and idle
//! scheduling contracts.

mod arena;
mod frame;
mod idle;
mod telemetry;

pub use arena::*;
pub use frame::*;
pub use idle::*;
pub use telemetry::*;
