//! Error types for input validation

use thiserror::Error;

use crate::graph::EntityId;

/// Errors raised when the graph or configuration cannot be optimised
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    /// The run would contain no entities
    #[error("entity count must be positive (got {count})")]
    InvalidEntityCount { count: usize },

    /// The same identity appears twice in the entity list
    #[error("duplicate entity id {id}")]
    DuplicateEntity { id: EntityId },

    /// An edge endpoint is not part of the entity set
    #[error("edge #{edge_index} references unknown entity {id}")]
    UnknownEntity { id: EntityId, edge_index: usize },

    /// Nothing to optimise: several entities but no relationships between them
    #[error("no edges remain after deduplication for {entity_count} entities")]
    NoEdges { entity_count: usize },

    /// A configuration value is out of its valid range
    #[error("invalid configuration for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl InputError {
    /// Create an unknown entity error
    pub fn unknown(id: EntityId, edge_index: usize) -> Self {
        Self::UnknownEntity { id, edge_index }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Entity id involved in the error, if any
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::DuplicateEntity { id } => Some(*id),
            Self::UnknownEntity { id, .. } => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_entity_display() {
        let err = InputError::unknown(EntityId(7), 3);
        insta::assert_snapshot!(err.to_string(), @"edge #3 references unknown entity 7");
    }

    #[test]
    fn test_invalid_config_display() {
        let err = InputError::invalid_config("relax.step_size", "must be positive");
        assert!(err.to_string().contains("relax.step_size"));
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn test_entity_accessor() {
        assert_eq!(
            InputError::DuplicateEntity { id: EntityId(4) }.entity(),
            Some(EntityId(4))
        );
        assert_eq!(InputError::NoEdges { entity_count: 3 }.entity(), None);
    }
}
