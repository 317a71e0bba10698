//! Layout optimiser for relationship graphs
//!
//! Places N entities on the N slots of a golden-angle spiral so that connected
//! entities end up close together, then lets them drift off the lattice under a
//! force model that keeps a minimum separation.

pub mod config;
pub mod greedy;
pub mod grid;
pub mod lattice;
pub mod lint;
pub mod objective;
pub mod pipeline;
pub mod relax;
pub mod search;
pub mod types;

pub use config::{
    ConfigError, OptimizerConfig, RegressionPolicy, RelaxConfig, SearchConfig, SelectionStrategy,
};
pub use greedy::{degree_order, greedy_assignment, random_assignment};
pub use lattice::{Lattice, Position, GOLDEN_ANGLE_DEGREES};
pub use lint::{check_separation, LintCategory, LintWarning, SeparationViolation};
pub use objective::{EdgeStats, Objective};
pub use pipeline::{optimize, optimize_graph, LayoutOutput, PlacedEntity, SeparationReport};
pub use relax::{relax, RelaxResult};
pub use search::{local_search, SearchResult};
pub use types::*;
