//! Probed height grid with progress bookkeeping and bilinear lookup
//!
//! The grid covers a rectangle in world coordinates with `size_x * size_y`
//! evenly spaced sample points. Heights arrive one at a time as probes
//! complete; lookups between samples blend the four surrounding points.

use std::collections::VecDeque;

use log::{debug, trace};
use ndarray::{Array2, ArrayView2};

use crate::io::configuration::{INDEX_SNAP_TOLERANCE, MAX_GRID_DIMENSION, MIN_POINTS_PER_AXIS};
use crate::io::error::{GridError, Result, invalid_parameter};
use crate::math::interpolation::{CellCorners, lerp};
use crate::math::vector::Vector2;
use crate::spatial::observer::{Observers, SubscriptionId};

/// State of a single grid point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ProbePoint {
    /// Measured surface height
    Probed(f64),
    /// No measurement recorded yet
    #[default]
    NotProbed,
}

impl ProbePoint {
    /// Recorded height, if any
    pub const fn height(self) -> Option<f64> {
        match self {
            Self::Probed(height) => Some(height),
            Self::NotProbed => None,
        }
    }

    /// Whether a height has been recorded
    pub const fn is_probed(self) -> bool {
        matches!(self, Self::Probed(_))
    }
}

/// Lowest and highest recorded heights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightRange {
    /// Lowest recorded height
    pub min: f64,
    /// Highest recorded height
    pub max: f64,
}

impl HeightRange {
    const fn single(height: f64) -> Self {
        Self {
            min: height,
            max: height,
        }
    }

    const fn including(self, height: f64) -> Self {
        Self {
            min: self.min.min(height),
            max: self.max.max(height),
        }
    }

    /// Distance between the extremes
    pub fn span(self) -> f64 {
        self.max - self.min
    }
}

/// Notification published after every recorded height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointUpdate {
    /// X index of the updated point
    pub x: usize,
    /// Y index of the updated point
    pub y: usize,
    /// Height that was stored
    pub height: f64,
    /// Probed point count after the update
    pub progress: usize,
    /// Total point count of the grid
    pub total_points: usize,
}

/// Rectangular grid of probed surface heights
///
/// Points are indexed `[x, y]` with `x` along the world X axis. The bounds
/// are normalized at construction so that `min` is the lower-left corner.
#[derive(Debug)]
pub struct HeightGrid {
    points: Array2<ProbePoint>,
    size_x: usize,
    size_y: usize,
    min: Vector2,
    max: Vector2,
    not_probed: VecDeque<(usize, usize)>,
    height_range: Option<HeightRange>,
    z_offset: f64,
    observers: Observers<PointUpdate>,
}

impl HeightGrid {
    /// Create a grid covering `min`..`max` with at most the given spacing
    ///
    /// The point count along each axis is `ceil(span / spacing) + 1`, so the
    /// actual spacing never exceeds the requested one. Reversed bounds are
    /// swapped per axis.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A spacing is not a positive finite number
    /// - The area has zero width or height
    /// - An axis yields fewer than 2 or more than `MAX_GRID_DIMENSION` points
    pub fn new(spacing_x: f64, spacing_y: f64, min: Vector2, max: Vector2) -> Result<Self> {
        check_bounds(min, max)?;
        let size_x = points_along("spacing_x", max.x - min.x, spacing_x)?;
        let size_y = points_along("spacing_y", max.y - min.y, spacing_y)?;
        Self::with_size(size_x, size_y, min, max)
    }

    /// Create a grid with the same spacing on both axes
    ///
    /// # Errors
    ///
    /// Same conditions as [`HeightGrid::new`]
    pub fn with_uniform_spacing(spacing: f64, min: Vector2, max: Vector2) -> Result<Self> {
        Self::new(spacing, spacing, min, max)
    }

    /// Create a grid with explicit point counts
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The area has zero width or height, or a bound is not finite
    /// - A point count is below 2 or above `MAX_GRID_DIMENSION`
    pub fn with_size(size_x: usize, size_y: usize, min: Vector2, max: Vector2) -> Result<Self> {
        check_bounds(min, max)?;

        if size_x < MIN_POINTS_PER_AXIS || size_y < MIN_POINTS_PER_AXIS {
            return Err(GridError::GridTooSmall { size_x, size_y });
        }
        if size_x > MAX_GRID_DIMENSION || size_y > MAX_GRID_DIMENSION {
            return Err(invalid_parameter(
                "size",
                &format!("{size_x}x{size_y}"),
                &format!("at most {MAX_GRID_DIMENSION} points per axis"),
            ));
        }

        let lower = min.min(max);
        let upper = min.max(max);

        let not_probed = (0..size_x)
            .flat_map(|x| (0..size_y).map(move |y| (x, y)))
            .collect();

        debug!("Created {size_x}x{size_y} height grid over {lower} to {upper}");

        Ok(Self {
            points: Array2::default((size_x, size_y)),
            size_x,
            size_y,
            min: lower,
            max: upper,
            not_probed,
            height_range: None,
            z_offset: 0.0,
            observers: Observers::new(),
        })
    }

    /// Point count along X
    pub const fn size_x(&self) -> usize {
        self.size_x
    }

    /// Point count along Y
    pub const fn size_y(&self) -> usize {
        self.size_y
    }

    /// Lower-left corner in world coordinates
    pub const fn min(&self) -> Vector2 {
        self.min
    }

    /// Upper-right corner in world coordinates
    pub const fn max(&self) -> Vector2 {
        self.max
    }

    /// Extent of the probed area
    pub fn delta(&self) -> Vector2 {
        self.max - self.min
    }

    /// Distance between neighboring points along X
    pub fn grid_x(&self) -> f64 {
        (self.max.x - self.min.x) / (self.size_x - 1) as f64
    }

    /// Distance between neighboring points along Y
    pub fn grid_y(&self) -> f64 {
        (self.max.y - self.min.y) / (self.size_y - 1) as f64
    }

    /// Number of points in the grid
    pub const fn total_points(&self) -> usize {
        self.size_x * self.size_y
    }

    /// Number of points with a recorded height
    pub fn progress(&self) -> usize {
        self.total_points() - self.not_probed.len()
    }

    /// Whether every point has been probed
    pub fn is_complete(&self) -> bool {
        self.not_probed.is_empty()
    }

    /// Points still waiting for a measurement, in default probing order
    pub const fn not_probed(&self) -> &VecDeque<(usize, usize)> {
        &self.not_probed
    }

    /// First point in default probing order that has no measurement
    pub fn next_unprobed(&self) -> Option<(usize, usize)> {
        self.not_probed.front().copied()
    }

    /// Range of recorded heights, `None` until the first measurement
    pub const fn height_range(&self) -> Option<HeightRange> {
        self.height_range
    }

    /// Lowest recorded height
    pub fn min_height(&self) -> Option<f64> {
        self.height_range.map(|range| range.min)
    }

    /// Highest recorded height
    pub fn max_height(&self) -> Option<f64> {
        self.height_range.map(|range| range.max)
    }

    /// Vertical correction added to interpolated heights
    pub const fn z_offset(&self) -> f64 {
        self.z_offset
    }

    /// Replace the vertical correction; stored heights are untouched
    pub const fn set_z_offset(&mut self, z_offset: f64) {
        self.z_offset = z_offset;
    }

    /// Read-only view of the point matrix, indexed `[x, y]`
    pub fn points(&self) -> ArrayView2<'_, ProbePoint> {
        self.points.view()
    }

    /// State of the point at `(x, y)`
    ///
    /// # Errors
    ///
    /// Returns an error if the index lies outside the grid
    pub fn height(&self, x: usize, y: usize) -> Result<ProbePoint> {
        self.points
            .get((x, y))
            .copied()
            .ok_or_else(|| self.out_of_range(x, y))
    }

    /// World position of the point at `(x, y)`
    ///
    /// The first and last indices map exactly onto `min` and `max`. Indices
    /// outside the grid are extrapolated linearly.
    pub fn grid_to_world(&self, x: usize, y: usize) -> Vector2 {
        let tx = x as f64 / (self.size_x - 1) as f64;
        let ty = y as f64 / (self.size_y - 1) as f64;
        Vector2::new(
            lerp(self.min.x, self.max.x, tx),
            lerp(self.min.y, self.max.y, ty),
        )
    }

    /// Whether a world position lies inside the grid bounds (edges included)
    pub fn contains(&self, world_x: f64, world_y: f64) -> bool {
        world_x >= self.min.x
            && world_x <= self.max.x
            && world_y >= self.min.y
            && world_y <= self.max.y
    }

    /// Record a measured height and notify subscribers
    ///
    /// The point is removed from the pending list, so `progress` advances on
    /// the first measurement of each point. Re-measuring a point overwrites
    /// the stored height; the height range only ever widens.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The index lies outside the grid
    /// - The height is not a finite number
    pub fn set_height(&mut self, x: usize, y: usize, height: f64) -> Result<()> {
        let previous = self.store_height(x, y, height)?;

        let pending = if previous.is_probed() {
            None
        } else {
            self.not_probed.iter().position(|&p| p == (x, y))
        };
        if let Some(position) = pending {
            self.not_probed.remove(position);
        }

        trace!("Recorded height {height} at ({x}, {y})");

        let update = PointUpdate {
            x,
            y,
            height,
            progress: self.progress(),
            total_points: self.total_points(),
        };
        self.observers.publish(&update);

        Ok(())
    }

    /// Bilinear height estimate at a world position, including `z_offset`
    ///
    /// Positions outside the bounds return the highest recorded height
    /// without `z_offset`, so a tool path never dips below known material.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - One of the four surrounding points has not been probed
    /// - The position is outside the bounds and no height is recorded yet
    pub fn interpolate_height(&self, world_x: f64, world_y: f64) -> Result<f64> {
        if !self.contains(world_x, world_y) {
            debug!("({world_x}, {world_y}) is outside the grid, using maximum height");
            return self.max_height().ok_or(GridError::NoHeightData);
        }

        let fx = fractional_index(world_x - self.min.x, self.grid_x(), self.size_x);
        let fy = fractional_index(world_y - self.min.y, self.grid_y(), self.size_y);

        let (x0, x1) = (fx.floor(), fx.ceil());
        let (y0, y1) = (fy.floor(), fy.ceil());
        let tx = fx - x0;
        let ty = fy - y0;

        let (x0, x1) = (x0 as usize, x1 as usize);
        let (y0, y1) = (y0 as usize, y1 as usize);

        let corners = CellCorners {
            lower_left: self.probed_height(x0, y0)?,
            lower_right: self.probed_height(x1, y0)?,
            upper_left: self.probed_height(x0, y1)?,
            upper_right: self.probed_height(x1, y1)?,
        };

        Ok(corners.blend(tx, ty) + self.z_offset)
    }

    /// Bilinear height estimate at a world position
    ///
    /// # Errors
    ///
    /// Same conditions as [`HeightGrid::interpolate_height`]
    pub fn interpolate_at(&self, position: Vector2) -> Result<f64> {
        self.interpolate_height(position.x, position.y)
    }

    /// Lower-left indices of cells whose four corners are all probed
    pub fn complete_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.size_x - 1)
            .flat_map(move |x| (0..self.size_y - 1).map(move |y| (x, y)))
            .filter(move |&(x, y)| {
                [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)]
                    .iter()
                    .all(|&corner| self.points.get(corner).is_some_and(|p| p.is_probed()))
            })
    }

    /// Register a callback invoked after every recorded height
    pub fn subscribe(&mut self, callback: impl FnMut(&PointUpdate) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    /// Remove a callback registered with [`HeightGrid::subscribe`]
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Write a height into the matrix and widen the range, returning the
    /// previous state of the point
    ///
    /// Leaves the pending list and subscribers alone; bulk loaders call
    /// [`HeightGrid::rebuild_not_probed`] once afterwards.
    pub(crate) fn store_height(&mut self, x: usize, y: usize, height: f64) -> Result<ProbePoint> {
        if !height.is_finite() {
            return Err(invalid_parameter(
                "height",
                &height,
                &"must be a finite number",
            ));
        }

        let out_of_range = self.out_of_range(x, y);
        let point = self.points.get_mut((x, y)).ok_or(out_of_range)?;
        let previous = std::mem::replace(point, ProbePoint::Probed(height));

        self.height_range = Some(
            self.height_range
                .map_or_else(|| HeightRange::single(height), |range| range.including(height)),
        );

        Ok(previous)
    }

    /// Recompute the pending list from the point matrix
    pub(crate) fn rebuild_not_probed(&mut self) {
        self.not_probed = self
            .points
            .indexed_iter()
            .filter(|(_, point)| !point.is_probed())
            .map(|(index, _)| index)
            .collect();
    }

    fn probed_height(&self, x: usize, y: usize) -> Result<f64> {
        self.height(x, y)?
            .height()
            .ok_or(GridError::UnprobedNeighbor { x, y })
    }

    const fn out_of_range(&self, x: usize, y: usize) -> GridError {
        GridError::IndexOutOfRange {
            x,
            y,
            size_x: self.size_x,
            size_y: self.size_y,
        }
    }
}

fn check_bounds(min: Vector2, max: Vector2) -> Result<()> {
    if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
        return Err(invalid_parameter(
            "bounds",
            &format!("{min} to {max}"),
            &"bounds must be finite",
        ));
    }

    let delta = max - min;
    if delta.x == 0.0 || delta.y == 0.0 {
        return Err(GridError::DegenerateArea { min, max });
    }

    Ok(())
}

// Ceiling division keeps the actual spacing at or below the requested one
fn points_along(parameter: &'static str, span: f64, spacing: f64) -> Result<usize> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(invalid_parameter(
            parameter,
            &spacing,
            &"spacing must be a positive finite number",
        ));
    }

    let intervals = (span.abs() / spacing).ceil();
    if intervals >= MAX_GRID_DIMENSION as f64 {
        return Err(invalid_parameter(
            parameter,
            &spacing,
            &format!("would need more than {MAX_GRID_DIMENSION} points per axis"),
        ));
    }

    Ok(intervals as usize + 1)
}

// Snapped onto whole indices within `INDEX_SNAP_TOLERANCE` so a grid point's
// own world position selects that point alone; clamped to the matrix.
fn fractional_index(offset: f64, spacing: f64, size: usize) -> f64 {
    let index = offset / spacing;
    let nearest = index.round();
    let snapped = if (index - nearest).abs() <= INDEX_SNAP_TOLERANCE {
        nearest
    } else {
        index
    };
    snapped.clamp(0.0, (size - 1) as f64)
}
