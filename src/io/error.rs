//! Error types for grid construction, interpolation and persistence

use std::fmt;
use std::path::PathBuf;

use crate::math::vector::Vector2;

/// Main error type for all grid operations
#[derive(Debug)]
pub enum GridError {
    /// Requested area has zero width or zero height
    DegenerateArea {
        /// Requested lower corner
        min: Vector2,
        /// Requested upper corner
        max: Vector2,
    },

    /// Fewer than two points along at least one axis
    GridTooSmall {
        /// Derived or declared point count along X
        size_x: usize,
        /// Derived or declared point count along Y
        size_y: usize,
    },

    /// Grid index outside the point matrix
    IndexOutOfRange {
        /// Requested X index
        x: usize,
        /// Requested Y index
        y: usize,
        /// Point count along X
        size_x: usize,
        /// Point count along Y
        size_y: usize,
    },

    /// Interpolation needs a neighbor that has not been probed yet
    UnprobedNeighbor {
        /// X index of the first missing neighbor
        x: usize,
        /// Y index of the first missing neighbor
        y: usize,
    },

    /// Out-of-bounds lookup on a grid without any recorded height
    NoHeightData,

    /// Persisted document is missing fields or holds unparsable values
    MalformedDocument {
        /// Description of what's wrong with the document
        reason: String,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Document serializer rejected the grid
    Serialization {
        /// Underlying serializer error
        source: quick_xml::se::SeError,
    },

    /// Failed to save a preview image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateArea { min, max } => {
                write!(f, "Probing area from {min} to {max} has zero width or height")
            }
            Self::GridTooSmall { size_x, size_y } => {
                write!(
                    f,
                    "Grid of {size_x}x{size_y} points is too small (at least 2 per axis)"
                )
            }
            Self::IndexOutOfRange {
                x,
                y,
                size_x,
                size_y,
            } => {
                write!(f, "Point ({x}, {y}) is outside the {size_x}x{size_y} grid")
            }
            Self::UnprobedNeighbor { x, y } => {
                write!(f, "Point ({x}, {y}) has not been probed yet")
            }
            Self::NoHeightData => write!(f, "No height has been recorded yet"),
            Self::MalformedDocument { reason } => {
                write!(f, "Malformed height map document: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Serialization { source } => {
                write!(f, "Failed to serialize height map: {source}")
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export preview to '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileSystem { source, .. } => Some(source),
            Self::Serialization { source } => Some(source),
            Self::ImageExport { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for grid results
pub type Result<T> = std::result::Result<T, GridError>;

impl From<quick_xml::se::SeError> for GridError {
    fn from(err: quick_xml::se::SeError) -> Self {
        Self::Serialization { source: err }
    }
}

impl From<quick_xml::de::DeError> for GridError {
    fn from(err: quick_xml::de::DeError) -> Self {
        Self::MalformedDocument {
            reason: err.to_string(),
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> GridError {
    GridError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a malformed document error
pub fn malformed_document(reason: &impl ToString) -> GridError {
    GridError::MalformedDocument {
        reason: reason.to_string(),
    }
}
