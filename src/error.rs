//! Error types for crate reading, validation and packaging

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrateError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse JSON from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid crate structure in {origin}: {reason}")]
    InvalidStructure { origin: String, reason: String },

    #[error("Malformed entity: {0}")]
    MalformedEntity(String),

    #[error("Duplicate entity id '{0}'")]
    DuplicateId(String),

    #[error("No entity with id '{0}'")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationFinding),

    #[error("Failed to serialize crate to {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Archive already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Flattening maps '{first}' and '{second}' to the same member name '{name}'")]
    NameCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Zip operation failed on {path}: {reason}")]
    Zip { path: PathBuf, reason: String },
}

impl CrateError {
    /// Wraps an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CrateError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A structural problem found while validating a graph.
///
/// Under strict reads the first finding aborts construction; under lenient
/// reads findings are recorded on the graph and stay inspectable via
/// [`EntityGraph::findings`](crate::graph::EntityGraph::findings).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFinding {
    #[error("no metadata descriptor entity in graph")]
    MissingDescriptor,

    #[error("multiple metadata descriptor entities: {}", ids.join(", "))]
    MultipleDescriptors { ids: Vec<String> },

    #[error("descriptor '{descriptor_id}' does not conform to a supported specification version")]
    UnsupportedConformance { descriptor_id: String },

    #[error("entity '{entity_id}' has no '{property}' reference")]
    MissingReference { entity_id: String, property: String },

    #[error("'{property}' on entity '{entity_id}' points at '{target}', which is not in the graph")]
    UnresolvedReference {
        entity_id: String,
        property: String,
        target: String,
    },

    #[error("graph node {index} skipped: {detail}")]
    SkippedNode { index: usize, detail: String },

    #[error("duplicate entity id '{0}'")]
    DuplicateEntityId(String),
}
