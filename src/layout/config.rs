//! Configuration for the layout optimiser
//!
//! Every field has a default, so a TOML file only needs the keys it overrides:
//!
//! ```toml
//! random_seed = 7
//! target_count = 1000
//!
//! [search]
//! strategy = "sweep"
//!
//! [relax]
//! min_distance = 45.0
//! regression_policy = "accept"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::InputError;

use super::lattice::DEFAULT_SPACING;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Edge count above which the iteration budget grows per edge instead of saturating
pub const LARGE_GRAPH_EDGES: usize = 50_000;

/// Swap attempts per edge on large graphs
const LARGE_GRAPH_ITERATIONS_PER_EDGE: u64 = 40;

/// Hard ceiling for the adaptive iteration budget
const MAX_ADAPTIVE_ITERATIONS: u64 = 20_000_000;

/// Size-dependent local-search budget.
///
/// `clamp(E·6, 5 000, 50 000)` for moderate graphs; above [`LARGE_GRAPH_EDGES`] it
/// scales with the edge count (≈15M iterations for ~370k edges).
pub fn adaptive_max_iterations(edge_count: usize) -> u64 {
    let edges = edge_count as u64;
    if edge_count <= LARGE_GRAPH_EDGES {
        (edges * 6).clamp(5_000, 50_000)
    } else {
        (edges * LARGE_GRAPH_ITERATIONS_PER_EDGE).clamp(50_000, MAX_ADAPTIVE_ITERATIONS)
    }
}

/// `max(500, 5% of max_iterations)`
pub fn default_stagnation_threshold(max_iterations: u64) -> u64 {
    (max_iterations / 20).max(500)
}

/// How local search picks candidate pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Uniform random distinct pair from the seeded generator
    #[default]
    Random,
    /// Systematic walk over all pairs `(i, j)`, `i < j`
    Sweep,
}

/// What to do when relaxation ends with a longer total distance than it started with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionPolicy {
    /// Keep the discrete coordinates
    #[default]
    Reject,
    /// Keep the relaxed coordinates and only report the regression
    Accept,
}

/// Discrete pairwise-swap phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Iteration cap; `None` uses [`adaptive_max_iterations`]
    pub max_iterations: Option<u64>,
    /// Consecutive non-improving iterations before stopping;
    /// `None` uses [`default_stagnation_threshold`]
    pub stagnation_threshold: Option<u64>,
    /// A swap is committed when `delta <= -min_improvement`
    pub min_improvement: f64,
    pub strategy: SelectionStrategy,
    /// Record a convergence sample every this many iterations (0 disables)
    pub history_interval: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            stagnation_threshold: None,
            min_improvement: 1e-6,
            strategy: SelectionStrategy::Random,
            history_interval: 1_000,
        }
    }
}

impl SearchConfig {
    pub fn resolved_max_iterations(&self, edge_count: usize) -> u64 {
        self.max_iterations
            .unwrap_or_else(|| adaptive_max_iterations(edge_count))
    }

    pub fn resolved_stagnation_threshold(&self, max_iterations: u64) -> u64 {
        self.stagnation_threshold
            .unwrap_or_else(|| default_stagnation_threshold(max_iterations))
    }
}

/// Continuous force-relaxation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelaxConfig {
    pub enabled: bool,
    pub max_iterations: u64,
    /// Multiplier from net force to displacement
    pub step_size: f64,
    /// Largest displacement of one entity in one iteration
    pub max_step: f64,
    /// Spring constant along edges
    pub attraction_strength: f64,
    /// Push strength per unit of overlap below `min_distance`
    pub repulsion_strength: f64,
    /// Pull back toward the position held when relaxation started
    pub anchor_strength: f64,
    /// Edge length at which attraction vanishes
    pub rest_length: f64,
    /// Minimum separation between any two entities
    pub min_distance: f64,
    /// Relative improvement below which an iteration counts as stalled
    pub epsilon: f64,
    /// Stalled iterations in a row before declaring convergence
    pub patience: u32,
    /// Projection passes per iteration that push overlapping pairs apart
    pub separation_passes: u32,
    pub regression_policy: RegressionPolicy,
}

impl Default for RelaxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_iterations: 500,
            step_size: 0.02,
            max_step: 5.0,
            attraction_strength: 0.01,
            repulsion_strength: 0.5,
            anchor_strength: 0.02,
            rest_length: 0.0,
            min_distance: 60.0,
            epsilon: 0.002,
            patience: 15,
            separation_passes: 50,
            regression_policy: RegressionPolicy::Reject,
        }
    }
}

/// Configuration options for a full optimisation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Keep only the first N entities of the input
    pub target_count: Option<usize>,
    pub random_seed: u64,
    /// Spiral spacing constant
    pub spacing: f64,
    /// Record a shuffled assignment as the first (baseline) stage
    pub include_random_baseline: bool,
    pub search: SearchConfig,
    pub relax: RelaxConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            target_count: None,
            random_seed: 42,
            spacing: DEFAULT_SPACING,
            include_random_baseline: true,
            search: SearchConfig::default(),
            relax: RelaxConfig::default(),
        }
    }
}

impl OptimizerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Limit the run to the first `count` entities
    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target_count = Some(count);
        self
    }

    /// Set the spiral spacing
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Enable or disable the random baseline stage
    pub fn with_random_baseline(mut self, enabled: bool) -> Self {
        self.include_random_baseline = enabled;
        self
    }

    /// Set the local search configuration
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Set the relaxation configuration
    pub fn with_relax(mut self, relax: RelaxConfig) -> Self {
        self.relax = relax;
        self
    }

    /// Set the minimum separation enforced by relaxation
    pub fn with_min_distance(mut self, min_distance: f64) -> Self {
        self.relax.min_distance = min_distance;
        self
    }

    /// Stop after the discrete phase
    pub fn without_relaxation(mut self) -> Self {
        self.relax.enabled = false;
        self
    }

    /// Check that every numeric option is in range
    pub fn validate(&self) -> Result<(), InputError> {
        if self.target_count == Some(0) {
            return Err(InputError::InvalidEntityCount { count: 0 });
        }
        positive("spacing", self.spacing)?;
        non_negative("search.min_improvement", self.search.min_improvement)?;
        if self.search.stagnation_threshold == Some(0) {
            return Err(InputError::invalid_config(
                "search.stagnation_threshold",
                "must be at least 1",
            ));
        }

        let relax = &self.relax;
        positive("relax.step_size", relax.step_size)?;
        positive("relax.max_step", relax.max_step)?;
        non_negative("relax.attraction_strength", relax.attraction_strength)?;
        non_negative("relax.repulsion_strength", relax.repulsion_strength)?;
        non_negative("relax.anchor_strength", relax.anchor_strength)?;
        non_negative("relax.rest_length", relax.rest_length)?;
        non_negative("relax.min_distance", relax.min_distance)?;
        non_negative("relax.epsilon", relax.epsilon)?;
        if relax.patience == 0 {
            return Err(InputError::invalid_config(
                "relax.patience",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn positive(field: &str, value: f64) -> Result<(), InputError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InputError::invalid_config(
            field,
            format!("must be a positive number (got {})", value),
        ))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), InputError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InputError::invalid_config(
            field,
            format!("must be a non-negative number (got {})", value),
        ))
    }
}
