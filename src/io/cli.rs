//! Command-line interface for creating, filling and querying height map files

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;

use crate::io::configuration::{DEFAULT_FRACTIONAL_DIGITS, PREVIEW_SUFFIX};
use crate::io::error::{GridError, Result, invalid_parameter};
use crate::io::image::export_preview_png;
use crate::io::persistence::{DocumentFormat, load_from_path, save_to_path};
use crate::io::progress::ProbeProgress;
use crate::math::vector::Vector2;
use crate::spatial::grid::HeightGrid;

#[derive(Parser)]
#[command(name = "probegrid")]
#[command(
    author,
    version,
    about = "Record probed surface heights and look up interpolated heights"
)]
/// Command-line arguments for the height map tool
pub struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Fractional digits written to saved height maps
    #[arg(long, global = true, default_value_t = DEFAULT_FRACTIONAL_DIGITS)]
    pub digits: usize,

    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,
}

/// Available operations
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create an empty height map covering a rectangle
    Create {
        /// Maximum distance between points along X
        #[arg(long, allow_negative_numbers = true)]
        spacing_x: f64,
        /// Maximum distance between points along Y (defaults to the X spacing)
        #[arg(long, allow_negative_numbers = true)]
        spacing_y: Option<f64>,
        /// Lower X bound
        #[arg(long, allow_negative_numbers = true)]
        min_x: f64,
        /// Lower Y bound
        #[arg(long, allow_negative_numbers = true)]
        min_y: f64,
        /// Upper X bound
        #[arg(long, allow_negative_numbers = true)]
        max_x: f64,
        /// Upper Y bound
        #[arg(long, allow_negative_numbers = true)]
        max_y: f64,
        /// Vertical correction applied to interpolated heights
        #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
        z_offset: f64,
        /// Height map file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Record measured heights from a file of `x,y,height` lines
    Record {
        /// Height map file to update
        map: PathBuf,
        /// Measurement file (grid indices and height per line)
        measurements: PathBuf,
    },

    /// Print the interpolated height at a world position
    Query {
        /// Height map file to read
        map: PathBuf,
        /// World X coordinate
        #[arg(allow_negative_numbers = true)]
        x: f64,
        /// World Y coordinate
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Print grid geometry and probing progress
    Info {
        /// Height map file to read
        map: PathBuf,
    },

    /// Replace the vertical correction of a height map
    Offset {
        /// Height map file to update
        map: PathBuf,
        /// New vertical correction
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },

    /// Write a grayscale PNG with one pixel per grid point
    Preview {
        /// Height map file to read
        map: PathBuf,
        /// Output image (defaults to `<map>_preview.png`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Number formatting for saved documents
    pub const fn document_format(&self) -> DocumentFormat {
        DocumentFormat {
            fractional_digits: self.digits,
        }
    }
}

/// One recorded probe result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// X index of the probed point
    pub x: usize,
    /// Y index of the probed point
    pub y: usize,
    /// Measured height
    pub height: f64,
}

/// Parse `x,y,height` lines, skipping blank lines and `#` comments
///
/// Fields may be separated by commas, whitespace or both.
///
/// # Errors
///
/// Returns an error naming the first line that does not hold two indices and
/// a height
pub fn parse_measurements(text: &str) -> Result<Vec<Measurement>> {
    let mut measurements = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .collect();

        let [x, y, height] = fields.as_slice() else {
            return Err(invalid_parameter(
                "measurements",
                &line,
                &format!("line {} must hold x, y and height", number + 1),
            ));
        };

        let malformed = |reason: &str| {
            invalid_parameter(
                "measurements",
                &line,
                &format!("line {}: {reason}", number + 1),
            )
        };

        measurements.push(Measurement {
            x: x.parse()
                .map_err(|e| malformed(&format!("x is not a grid index ({e})")))?,
            y: y.parse()
                .map_err(|e| malformed(&format!("y is not a grid index ({e})")))?,
            height: height
                .parse()
                .map_err(|e| malformed(&format!("height is not a number ({e})")))?,
        });
    }

    Ok(measurements)
}

/// Human-readable summary of a grid
pub fn describe(grid: &HeightGrid) -> String {
    let heights = grid.height_range().map_or_else(
        || "none recorded".to_string(),
        |range| format!("{} to {}", range.min, range.max),
    );

    [
        format!("Bounds:   {} to {}", grid.min(), grid.max()),
        format!(
            "Points:   {}x{} (spacing {} x {})",
            grid.size_x(),
            grid.size_y(),
            grid.grid_x(),
            grid.grid_y()
        ),
        format!("Probed:   {}/{}", grid.progress(), grid.total_points()),
        format!("Heights:  {heights}"),
        format!("Z offset: {}", grid.z_offset()),
    ]
    .join("\n")
}

/// Executes a parsed command against height map files
pub struct CommandRunner {
    cli: Cli,
}

impl CommandRunner {
    /// Create a runner for the given CLI arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Execute the command and print its report
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails
    // Allow print for the command report
    #[allow(clippy::print_stdout)]
    pub fn run(&self) -> Result<()> {
        let report = self.execute()?;
        if !report.is_empty() {
            println!("{report}");
        }
        Ok(())
    }

    /// Execute the command and return its report
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or written, the grid
    /// parameters are invalid, or a lookup fails
    pub fn execute(&self) -> Result<String> {
        let format = self.cli.document_format();

        match &self.cli.command {
            Command::Create {
                spacing_x,
                spacing_y,
                min_x,
                min_y,
                max_x,
                max_y,
                z_offset,
                output,
            } => {
                let mut grid = HeightGrid::new(
                    *spacing_x,
                    spacing_y.unwrap_or(*spacing_x),
                    Vector2::new(*min_x, *min_y),
                    Vector2::new(*max_x, *max_y),
                )?;
                grid.set_z_offset(*z_offset);
                save_to_path(&grid, output, format)?;
                info!("Created {}", output.display());
                Ok(describe(&grid))
            }
            Command::Record { map, measurements } => self.record(map, measurements, format),
            Command::Query { map, x, y } => {
                let grid = load_from_path(map)?;
                let height = grid.interpolate_height(*x, *y)?;
                Ok(format!("{height:.digits$}", digits = self.cli.digits))
            }
            Command::Info { map } => Ok(describe(&load_from_path(map)?)),
            Command::Offset { map, value } => {
                let mut grid = load_from_path(map)?;
                grid.set_z_offset(*value);
                save_to_path(&grid, map, format)?;
                Ok(describe(&grid))
            }
            Command::Preview { map, output } => {
                let grid = load_from_path(map)?;
                let output_path = output
                    .clone()
                    .unwrap_or_else(|| Self::get_preview_path(map));
                export_preview_png(&grid, &output_path)?;
                Ok(format!("Preview written to {}", output_path.display()))
            }
        }
    }

    fn record(&self, map: &Path, measurements: &Path, format: DocumentFormat) -> Result<String> {
        let text = std::fs::read_to_string(measurements).map_err(|e| GridError::FileSystem {
            path: measurements.to_path_buf(),
            operation: "read",
            source: e,
        })?;
        let measurements = parse_measurements(&text)?;

        let mut grid = load_from_path(map)?;

        let mut progress = if self.cli.should_show_progress() {
            ProbeProgress::new(&grid)
        } else {
            ProbeProgress::hidden(&grid)
        };
        progress.attach(&mut grid);

        for measurement in &measurements {
            grid.set_height(measurement.x, measurement.y, measurement.height)?;
        }

        progress.finish();
        progress.detach(&mut grid);

        save_to_path(&grid, map, format)?;
        info!(
            "Recorded {} measurements into {}",
            measurements.len(),
            map.display()
        );

        Ok(describe(&grid))
    }

    fn get_preview_path(map: &Path) -> PathBuf {
        let stem = map.file_stem().unwrap_or_default();
        let preview_name = format!("{}{PREVIEW_SUFFIX}.png", stem.to_string_lossy());

        if let Some(parent) = map.parent() {
            parent.join(preview_name)
        } else {
            PathBuf::from(preview_name)
        }
    }
}
