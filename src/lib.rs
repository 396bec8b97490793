//! RO-Crate Metadata Graph Engine
//!
//! This library reads, queries and packages RO-Crate metadata graphs:
//! JSON-LD documents with a `@context` declaration and a `@graph` array of
//! node objects connected by id-based references.
//!
//! # Overview
//!
//! Reading funnels three sources (file, in-memory string, zip archive
//! member) through one pipeline:
//!
//! 1. Parse the top-level JSON and extract `@graph` and `@context`
//! 2. Normalize each node object into an [`Entity`] (`@id`/`@type` become
//!    `id` and the type list, nested `@id` reference keys become `id`,
//!    everything else keeps its name and shape)
//! 3. Index entities by id, aborting on the first duplicate
//! 4. Record the context declarations in order
//! 5. Validate descriptor/root linkage, strictly or leniently
//!
//! References between entities stay plain `{"id": ...}` data and resolve by
//! id lookup at query time, never eagerly.
//!
//! Packaging runs the other way: a crate directory (descriptor plus data
//! files) becomes a single zip archive, written to a temporary path and
//! atomically published.
//!
//! # Usage
//!
//! ```ignore
//! use rocrate_engine::{read_from_path, Strictness};
//!
//! let graph = read_from_path(Path::new("ro-crate-metadata.json"), Strictness::Strict)?;
//! let root = graph.get_entity("./");
//! for entity in graph.to_list() {
//!     println!("{}", entity.id);
//! }
//! ```

pub mod context;
pub mod entity;
pub mod error;
pub mod graph;
pub mod packager;
pub mod reader;
pub mod vocab;

// Re-export main types for convenience
pub use crate::context::ContextResolver;
pub use crate::entity::Entity;
pub use crate::error::{CrateError, ValidationFinding};
pub use crate::graph::{EntityGraph, Strictness, ValidationPolicy};
pub use crate::packager::{package, PackageOptions, PackageReceipt};
pub use crate::reader::{read_from_path, read_from_string, read_from_zip};
