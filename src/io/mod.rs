//! Input/output operations and error handling

/// Command-line interface and command execution
pub mod cli;
/// Grid limits and document formatting defaults
pub mod configuration;
/// Error types and result alias
pub mod error;
/// PNG preview export
pub mod image;
/// XML load/save of height grids
pub mod persistence;
/// Terminal progress display for probing
pub mod progress;
