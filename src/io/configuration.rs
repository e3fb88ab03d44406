//! Grid limits, document formatting defaults and display settings

// Grid geometry limits
/// Minimum number of points along either axis
pub const MIN_POINTS_PER_AXIS: usize = 2;

// Safety limit to prevent excessive memory allocation
/// Maximum allowed points along either axis
pub const MAX_GRID_DIMENSION: usize = 10_000;

/// Distance in cell units within which a lookup lands on a grid point
///
/// World positions rebuilt from indices are off by a few ulps; anything this
/// close to a whole index is treated as that index.
pub const INDEX_SNAP_TOLERANCE: f64 = 1e-9;

/// Absolute tolerance used by `Vector2` equality
///
/// This is the smallest positive subnormal `f64`, so equality is effectively
/// exact binary comparison. Use `Vector2::approx_eq` for fuzzy spatial checks.
pub const VECTOR_EQUALITY_TOLERANCE: f64 = f64::from_bits(1);

// Persisted document layout
/// Root element name of a persisted height map
pub const DOCUMENT_ROOT: &str = "heightmap";
/// Fractional digits written for every decimal value
pub const DEFAULT_FRACTIONAL_DIGITS: usize = 3;

// Output settings
/// Suffix added to preview image filenames
pub const PREVIEW_SUFFIX: &str = "_preview";
/// Width of the probing progress bar in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
