//! Grayscale PNG preview of the raw point matrix

use std::path::Path;

use image::{ImageBuffer, LumaA};

use crate::io::error::{GridError, Result};
use crate::spatial::grid::{HeightGrid, HeightRange};

// Mid-gray for a flat surface where the range has no span
const FLAT_LEVEL: u8 = 128;

/// Map a height onto `0..=255` across the recorded range
fn gray_level(height: f64, range: HeightRange) -> u8 {
    let span = range.span();
    if span <= 0.0 {
        return FLAT_LEVEL;
    }
    let normalized = ((height - range.min) / span).clamp(0.0, 1.0);
    (normalized * f64::from(u8::MAX)).round() as u8
}

/// Render one pixel per grid point, lowest height black and highest white
///
/// Row 0 of the image is the maximum Y edge so that the preview reads like a
/// top-down view of the machine bed. Unprobed points are transparent.
///
/// # Errors
///
/// Returns an error if no height has been recorded in the grid
pub fn render_preview(grid: &HeightGrid) -> Result<ImageBuffer<LumaA<u8>, Vec<u8>>> {
    let range = grid.height_range().ok_or(GridError::NoHeightData)?;

    let width = grid.size_x() as u32;
    let height = grid.size_y() as u32;
    let mut img = ImageBuffer::new(width, height);

    for ((x, y), point) in grid.points().indexed_iter() {
        let pixel_x = x as u32;
        let pixel_y = height - 1 - y as u32;

        let pixel = point.height().map_or(LumaA([0, 0]), |value| {
            LumaA([gray_level(value, range), u8::MAX])
        });
        img.put_pixel(pixel_x, pixel_y, pixel);
    }

    Ok(img)
}

/// Export the grid preview as a PNG image
///
/// # Errors
///
/// Returns an error if:
/// - No height has been recorded in the grid
/// - The parent directory cannot be created
/// - The image cannot be saved to the specified path
pub fn export_preview_png(grid: &HeightGrid, output_path: &Path) -> Result<()> {
    let img = render_preview(grid)?;

    if let Some(parent) = output_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent).map_err(|e| GridError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    img.save(output_path)
        .map_err(|e| GridError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
