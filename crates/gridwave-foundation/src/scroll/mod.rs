//! Scroll session: the boundary between gesture/nested-scroll coordination
//! and the layout engine.

mod session;

pub use session::*;
