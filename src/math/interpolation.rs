//! Linear and bilinear blending of grid samples
//!
//! The blend is written as two nested linear interpolations so that a zero
//! fractional offset reproduces the corner sample exactly.

use num_traits::Float;

/// Blend from `a` to `b` by `t` (`t = 0` yields `a`, `t = 1` yields `b`)
pub fn lerp<T: Float>(a: T, b: T, t: T) -> T {
    b * t + a * (T::one() - t)
}

/// Corner samples of one grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellCorners<T> {
    /// Sample at `(x0, y0)`
    pub lower_left: T,
    /// Sample at `(x1, y0)`
    pub lower_right: T,
    /// Sample at `(x0, y1)`
    pub upper_left: T,
    /// Sample at `(x1, y1)`
    pub upper_right: T,
}

impl<T: Float> CellCorners<T> {
    /// Bilinear estimate at fractional offsets `tx`, `ty` within the cell
    ///
    /// Blends along X on the lower and upper edges, then along Y between them.
    pub fn blend(&self, tx: T, ty: T) -> T {
        let top = lerp(self.upper_left, self.upper_right, tx);
        let bottom = lerp(self.lower_left, self.lower_right, tx);
        lerp(bottom, top, ty)
    }
}
