//! Mathematical utilities for grid geometry

/// Linear and bilinear blending of grid samples
pub mod interpolation;
/// Two-dimensional vector arithmetic
pub mod vector;
