//! Vocabulary constants for the RO-Crate metadata format
//!
//! Conventional identifiers and the specification versions this engine
//! recognises.

/// Standard metadata descriptor filename (and entity id)
pub const METADATA_DESCRIPTOR_ID: &str = "ro-crate-metadata.json";

/// Root data entity id
pub const ROOT_ENTITY_ID: &str = "./";

/// RO-Crate profile URL prefix
pub const ROCRATE_PROFILE_PREFIX: &str = "https://w3id.org/ro/crate/";

/// Specification versions the descriptor's `conformsTo` may name
pub const SUPPORTED_SPEC_VERSIONS: &[&str] = &[
    "https://w3id.org/ro/crate/1.1",
    "https://w3id.org/ro/crate/1.2",
];

/// Default context declaration for programmatically built crates
pub const DEFAULT_CONTEXT: &str = "https://w3id.org/ro/crate/1.1/context";

/// Descriptor property naming the root data entity
pub const ABOUT_PROPERTY: &str = "about";

/// Descriptor property naming the specification version
pub const CONFORMS_TO_PROPERTY: &str = "conformsTo";

/// Check if a `conformsTo` target names a supported specification version
pub fn is_supported_conformance(id: &str) -> bool {
    let id = id.trim_end_matches('/');
    SUPPORTED_SPEC_VERSIONS.iter().any(|v| id == *v)
}

/// Check if a filename (or entity id) is a metadata descriptor
///
/// Accepts the canonical name plus prefixed variants such as
/// `my-experiment-ro-crate-metadata.json`.
pub fn is_descriptor_name(name: &str) -> bool {
    name == METADATA_DESCRIPTOR_ID || name.ends_with("-ro-crate-metadata.json")
}
