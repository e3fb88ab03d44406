//! XML load/save for height grids
//!
//! A document stores the bounds, point counts and z offset as attributes on
//! the root element, followed by one `point` element per probed point:
//!
//! ```xml
//! <heightmap MinX="0.000" MinY="0.000" MaxX="2.000" MaxY="2.000" SizeX="3" SizeY="3" ZOffset="0.000">
//!   <point X="0" Y="0">0.125</point>
//! </heightmap>
//! ```
//!
//! Unprobed points are omitted. Decimals are always written with `.` and a
//! fixed number of fractional digits; any precision is accepted on load.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::io::configuration::{DEFAULT_FRACTIONAL_DIGITS, DOCUMENT_ROOT};
use crate::io::error::{GridError, Result, invalid_parameter, malformed_document};
use crate::math::vector::Vector2;
use crate::spatial::grid::HeightGrid;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// Number formatting used when writing a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentFormat {
    /// Digits written after the decimal point
    pub fractional_digits: usize,
}

impl Default for DocumentFormat {
    fn default() -> Self {
        Self {
            fractional_digits: DEFAULT_FRACTIONAL_DIGITS,
        }
    }
}

impl DocumentFormat {
    fn decimal(self, value: f64) -> String {
        format!("{value:.digits$}", digits = self.fractional_digits)
    }

    // Compared after parsing so `-0.000` and `0.000` also count as equal
    fn collapses(self, a: f64, b: f64) -> bool {
        self.decimal(a).parse::<f64>().ok() == self.decimal(b).parse::<f64>().ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HeightMapDocument {
    #[serde(rename = "@MinX")]
    min_x: String,
    #[serde(rename = "@MinY")]
    min_y: String,
    #[serde(rename = "@MaxX")]
    max_x: String,
    #[serde(rename = "@MaxY")]
    max_y: String,
    #[serde(rename = "@SizeX")]
    size_x: usize,
    #[serde(rename = "@SizeY")]
    size_y: usize,
    #[serde(rename = "@ZOffset", default, skip_serializing_if = "Option::is_none")]
    z_offset: Option<String>,
    #[serde(rename = "point", default)]
    points: Vec<PointElement>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PointElement {
    #[serde(rename = "@X")]
    x: usize,
    #[serde(rename = "@Y")]
    y: usize,
    #[serde(rename = "$text")]
    height: String,
}

/// Serialize a grid to an XML document
///
/// # Errors
///
/// Returns an error if:
/// - The bounds of an axis round to the same decimal at the chosen precision
/// - The XML serializer rejects the document
pub fn save(grid: &HeightGrid, format: DocumentFormat) -> Result<String> {
    let min = grid.min();
    let max = grid.max();

    if format.collapses(min.x, max.x) || format.collapses(min.y, max.y) {
        return Err(invalid_parameter(
            "fractional_digits",
            &format.fractional_digits,
            &format!("bounds {min} to {max} collapse to a zero-size area"),
        ));
    }

    let points = grid
        .points()
        .indexed_iter()
        .filter_map(|((x, y), point)| {
            point.height().map(|height| PointElement {
                x,
                y,
                height: format.decimal(height),
            })
        })
        .collect::<Vec<_>>();

    let document = HeightMapDocument {
        min_x: format.decimal(min.x),
        min_y: format.decimal(min.y),
        max_x: format.decimal(max.x),
        max_y: format.decimal(max.y),
        size_x: grid.size_x(),
        size_y: grid.size_y(),
        z_offset: Some(format.decimal(grid.z_offset())),
        points,
    };

    let body = quick_xml::se::to_string_with_root(DOCUMENT_ROOT, &document)?;
    debug!(
        "Serialized {}x{} height map with {} probed points",
        grid.size_x(),
        grid.size_y(),
        document.points.len()
    );

    Ok(format!("{XML_DECLARATION}{body}"))
}

/// Parse a grid from an XML document
///
/// The pending point list is rebuilt from the matrix after all entries are
/// applied, so entry order in the document does not matter. A missing
/// `ZOffset` attribute loads as `0`.
///
/// # Errors
///
/// Returns an error if:
/// - A required attribute is missing or a number cannot be parsed
/// - A point index lies outside the declared size
/// - The declared bounds or sizes do not describe a valid grid
pub fn load(document: &str) -> Result<HeightGrid> {
    let parsed: HeightMapDocument = quick_xml::de::from_str(document)?;

    let min = Vector2::new(
        parse_decimal("MinX", &parsed.min_x)?,
        parse_decimal("MinY", &parsed.min_y)?,
    );
    let max = Vector2::new(
        parse_decimal("MaxX", &parsed.max_x)?,
        parse_decimal("MaxY", &parsed.max_y)?,
    );

    let mut grid = HeightGrid::with_size(parsed.size_x, parsed.size_y, min, max)?;

    if let Some(z_offset) = &parsed.z_offset {
        grid.set_z_offset(parse_decimal("ZOffset", z_offset)?);
    }

    for point in &parsed.points {
        let height = parse_decimal("point", &point.height)?;
        grid.store_height(point.x, point.y, height)
            .map_err(|error| match error {
                GridError::IndexOutOfRange { .. } => malformed_document(&error),
                other => other,
            })?;
    }

    grid.rebuild_not_probed();

    debug!(
        "Loaded {}x{} height map with {} of {} points probed",
        grid.size_x(),
        grid.size_y(),
        grid.progress(),
        grid.total_points()
    );

    Ok(grid)
}

/// Write a grid to an XML file, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written
pub fn save_to_path(grid: &HeightGrid, path: &Path, format: DocumentFormat) -> Result<()> {
    let document = save(grid, format)?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GridError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    fs::write(path, document).map_err(|e| GridError::FileSystem {
        path: path.to_path_buf(),
        operation: "write",
        source: e,
    })
}

/// Read a grid from an XML file
///
/// # Errors
///
/// Returns an error if the file cannot be read or its contents are invalid
pub fn load_from_path(path: &Path) -> Result<HeightGrid> {
    let document = fs::read_to_string(path).map_err(|e| GridError::FileSystem {
        path: path.to_path_buf(),
        operation: "read",
        source: e,
    })?;
    load(&document)
}

fn parse_decimal(field: &str, text: &str) -> Result<f64> {
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|e| malformed_document(&format!("{field} = '{text}': {e}")))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(malformed_document(&format!(
            "{field} = '{text}': not a finite number"
        )))
    }
}
