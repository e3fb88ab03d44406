//! Probed surface height grids with bilinear height lookup
//!
//! A [`HeightGrid`] covers a rectangular work area (for example a CNC machine
//! bed) with evenly spaced probe points. Heights are recorded one point at a
//! time as probes complete, and any position inside the area can then be
//! looked up by blending the four surrounding measurements. Grids persist to
//! a compact XML document that stores only the probed points.

#![forbid(unsafe_code)]

/// Input/output operations, configuration and error handling
pub mod io;
/// Vector arithmetic and interpolation primitives
pub mod math;
/// Height grid, probing bookkeeping and change notifications
pub mod spatial;

pub use io::error::{GridError, Result};
pub use math::vector::Vector2;
pub use spatial::grid::{HeightGrid, ProbePoint};
