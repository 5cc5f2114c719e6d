//! Utility helpers: vector math, the generational arena, logging, and pass statistics.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{Arena, Handle};
pub use math::*;
pub use profiling::ForcePassStats;
