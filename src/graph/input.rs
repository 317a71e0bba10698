//! JSON input document: the entity list and the edge list
//!
//! ```json
//! {
//!   "entities": [{ "id": 1, "name": "a" }, { "id": 2 }],
//!   "edges": [{ "source": 1, "target": 2 }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::InputError;

use super::{EntityId, Graph};

/// Errors that can occur when reading an input document
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read input file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse input JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// One entity of the input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    /// Display name, carried through to the output untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One relationship of the input document (direction is ignored)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: EntityId,
    pub target: EntityId,
}

/// Entities and edges as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphInput {
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphInput {
    /// Load an input document from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse an input document from a JSON string
    pub fn from_json(content: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build an input from bare ids and id pairs
    pub fn from_pairs(ids: impl IntoIterator<Item = u64>, pairs: &[(u64, u64)]) -> Self {
        Self {
            entities: ids
                .into_iter()
                .map(|id| EntityRecord {
                    id: EntityId(id),
                    name: None,
                })
                .collect(),
            edges: pairs
                .iter()
                .map(|&(s, t)| EdgeRecord {
                    source: EntityId(s),
                    target: EntityId(t),
                })
                .collect(),
        }
    }

    /// Validate and deduplicate into a [`Graph`]
    pub fn to_graph(&self) -> Result<Graph, InputError> {
        let ids: Vec<EntityId> = self.entities.iter().map(|e| e.id).collect();
        let pairs: Vec<(EntityId, EntityId)> =
            self.edges.iter().map(|e| (e.source, e.target)).collect();
        Graph::build(&ids, &pairs)
    }
}
