//! Graph model shared by every optimisation stage
//!
//! Entities are addressed by dense indices (`0..N`) in input order; the caller's
//! identities are kept alongside for output. Edges are undirected, deduplicated and
//! stored normalised, with a compressed adjacency list so that per-entity neighbour
//! lookups cost O(degree).

pub mod input;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::InputError;

pub use input::{EdgeRecord, EntityRecord, GraphInput, LoadError};

/// Caller-supplied entity identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An undirected edge between two entity indices, always stored with `a < b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

impl Edge {
    /// Create a normalised edge
    pub fn new(x: usize, y: usize) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }
}

/// Bookkeeping about what graph construction discarded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Edge records supplied by the caller
    pub input_edges: usize,
    /// Records dropped because the unordered pair was already present
    pub duplicate_edges: usize,
    /// Records dropped because both endpoints were the same entity
    pub self_loops: usize,
    /// Entities removed by `truncate`
    pub truncated_entities: usize,
    /// Edges removed by `truncate` because an endpoint was removed
    pub truncated_edges: usize,
}

/// Immutable, deduplicated relationship graph
#[derive(Debug, Clone)]
pub struct Graph {
    ids: Vec<EntityId>,
    edges: Vec<Edge>,
    offsets: Vec<usize>,
    neighbors: Vec<usize>,
    stats: GraphStats,
}

impl Graph {
    /// Build a graph from entity ids and unordered id pairs.
    ///
    /// Each unordered pair is counted once and self-loops are dropped; both are
    /// recorded in [`GraphStats`]. Unknown endpoints and duplicate entity ids are
    /// rejected.
    pub fn build(ids: &[EntityId], pairs: &[(EntityId, EntityId)]) -> Result<Self, InputError> {
        if ids.is_empty() {
            return Err(InputError::InvalidEntityCount { count: 0 });
        }

        let mut index_of: HashMap<EntityId, usize> = HashMap::with_capacity(ids.len());
        for (idx, id) in ids.iter().enumerate() {
            if index_of.insert(*id, idx).is_some() {
                return Err(InputError::DuplicateEntity { id: *id });
            }
        }

        let mut stats = GraphStats {
            input_edges: pairs.len(),
            ..GraphStats::default()
        };
        let mut edges = Vec::with_capacity(pairs.len());
        for (edge_index, (source, target)) in pairs.iter().enumerate() {
            let a = *index_of
                .get(source)
                .ok_or_else(|| InputError::unknown(*source, edge_index))?;
            let b = *index_of
                .get(target)
                .ok_or_else(|| InputError::unknown(*target, edge_index))?;
            if a == b {
                stats.self_loops += 1;
                continue;
            }
            edges.push(Edge::new(a, b));
        }

        let before = edges.len();
        edges.sort_unstable();
        edges.dedup();
        stats.duplicate_edges = before - edges.len();

        if stats.self_loops > 0 {
            warn!(count = stats.self_loops, "dropped self-loop edges");
        }
        debug!(
            entities = ids.len(),
            edges = edges.len(),
            duplicates = stats.duplicate_edges,
            "built graph"
        );

        Ok(Self::from_parts(ids.to_vec(), edges, stats))
    }

    fn from_parts(ids: Vec<EntityId>, edges: Vec<Edge>, stats: GraphStats) -> Self {
        let n = ids.len();
        let mut degree = vec![0usize; n];
        for edge in &edges {
            degree[edge.a] += 1;
            degree[edge.b] += 1;
        }

        let mut offsets = Vec::with_capacity(n + 1);
        offsets.push(0);
        for d in &degree {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + d);
        }

        // Edges are sorted, so every adjacency slice comes out sorted as well.
        let mut cursor = offsets[..n].to_vec();
        let mut neighbors = vec![0usize; offsets[n]];
        for edge in &edges {
            neighbors[cursor[edge.a]] = edge.b;
            cursor[edge.a] += 1;
            neighbors[cursor[edge.b]] = edge.a;
            cursor[edge.b] += 1;
        }

        Self {
            ids,
            edges,
            offsets,
            neighbors,
            stats,
        }
    }

    /// Keep the first `target_count` entities (input order) and the edges among them.
    ///
    /// Asking for more entities than exist keeps the whole graph.
    pub fn truncate(&self, target_count: usize) -> Result<Self, InputError> {
        if target_count == 0 {
            return Err(InputError::InvalidEntityCount { count: 0 });
        }
        if target_count >= self.len() {
            if target_count > self.len() {
                warn!(
                    requested = target_count,
                    available = self.len(),
                    "fewer entities than requested, continuing with all of them"
                );
            }
            return Ok(self.clone());
        }

        let edges: Vec<Edge> = self
            .edges
            .iter()
            .copied()
            .filter(|e| e.b < target_count)
            .collect();
        let mut stats = self.stats.clone();
        stats.truncated_entities += self.len() - target_count;
        stats.truncated_edges += self.edges.len() - edges.len();

        Ok(Self::from_parts(
            self.ids[..target_count].to_vec(),
            edges,
            stats,
        ))
    }

    /// Reject graphs where optimisation has nothing to work with
    pub fn ensure_optimizable(&self) -> Result<(), InputError> {
        if self.is_empty() {
            return Err(InputError::InvalidEntityCount { count: 0 });
        }
        if self.len() > 1 && self.edges.is_empty() {
            return Err(InputError::NoEdges {
                entity_count: self.len(),
            });
        }
        Ok(())
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, entity: usize) -> EntityId {
        self.ids[entity]
    }

    /// Deduplicated edges, sorted
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Sorted neighbour indices of an entity
    pub fn neighbors(&self, entity: usize) -> &[usize] {
        &self.neighbors[self.offsets[entity]..self.offsets[entity + 1]]
    }

    pub fn degree(&self, entity: usize) -> usize {
        self.offsets[entity + 1] - self.offsets[entity]
    }

    /// Degree of every entity in index order
    pub fn degrees(&self) -> Vec<usize> {
        (0..self.len()).map(|i| self.degree(i)).collect()
    }

    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }
}
