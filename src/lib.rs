//! Vogel Layout - golden-angle spiral placement for relationship graphs
//!
//! This library assigns graph entities to the slots of a Vogel spiral, improves
//! the assignment with pairwise swaps, and refines it with a force model.
//!
//! # Example
//!
//! ```rust
//! use vogel_layout::{optimize, GraphInput, OptimizerConfig, Stage};
//!
//! let input = GraphInput::from_pairs(1..=4, &[(1, 2), (2, 3), (3, 4)]);
//! let output = optimize(&input, &OptimizerConfig::default()).unwrap();
//!
//! assert_eq!(output.entities.len(), 4);
//! assert!(output.stage(Stage::LocalSearch).is_some());
//! ```

pub mod error;
pub mod graph;
pub mod layout;

pub use error::InputError;
pub use graph::{EntityId, Graph, GraphInput, LoadError};
pub use layout::{
    optimize, optimize_graph, ConfigError, LayoutOutput, OptimizerConfig, RelaxConfig,
    RunMetrics, SearchConfig, Stage,
};

use std::path::Path;

use thiserror::Error;

/// Errors that can occur when running from files
#[derive(Debug, Error)]
pub enum RunError {
    /// Error reading or parsing the input document
    #[error("input: {0}")]
    Load(#[from] LoadError),

    /// Error reading or parsing the configuration file
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// The graph or configuration cannot be optimised
    #[error("{0}")]
    Input(#[from] InputError),
}

/// Load a JSON graph and an optional TOML config, then optimise
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use vogel_layout::optimize_files;
///
/// let output = optimize_files(Path::new("graph.json"), Some(Path::new("layout.toml"))).unwrap();
/// println!("{}", output.to_json().unwrap());
/// ```
pub fn optimize_files(input: &Path, config: Option<&Path>) -> Result<LayoutOutput, RunError> {
    let input = GraphInput::from_file(input)?;
    let config = match config {
        Some(path) => OptimizerConfig::from_file(path)?,
        None => OptimizerConfig::default(),
    };
    Ok(optimize(&input, &config)?)
}
