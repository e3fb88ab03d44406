//! Spatial data structures for probed height maps
//!
//! This module contains:
//! - The height grid with probing progress and interpolation
//! - The subscribe/publish registry used for update notifications

/// Height grid state, coordinate mapping and bilinear lookup
pub mod grid;
/// Synchronous change notification registry
pub mod observer;

pub use grid::{HeightGrid, HeightRange, PointUpdate, ProbePoint};
pub use observer::{Observers, SubscriptionId};
