//! Reading entity graphs from files, strings and zip archives
//!
//! Three entry points funnel into the shared construction pipeline of
//! [`EntityGraph::from_document`]: parse the top-level JSON, normalize each
//! `@graph` node, index by id, record the `@context`, validate.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde_json::Value;
use zip::ZipArchive;

use crate::error::CrateError;
use crate::graph::{EntityGraph, Strictness};
use crate::vocab;

/// Reads a crate from a standalone metadata file.
pub fn read_from_path(path: &Path, strictness: Strictness) -> Result<EntityGraph, CrateError> {
    let text = std::fs::read_to_string(path).map_err(|e| CrateError::io(path, e))?;
    read_document(&text, &path.display().to_string(), strictness)
}

/// Reads a crate from an in-memory JSON string.
///
/// No filesystem access; useful for embedded or streamed metadata.
pub fn read_from_string(text: &str, strictness: Strictness) -> Result<EntityGraph, CrateError> {
    read_document(text, "<string>", strictness)
}

/// Reads a crate from the descriptor member of a zip archive.
///
/// Only the descriptor is loaded; the surrounding archive files stay
/// addressable through the references entities make to them.
pub fn read_from_zip(archive_path: &Path, strictness: Strictness) -> Result<EntityGraph, CrateError> {
    let file = File::open(archive_path).map_err(|e| CrateError::io(archive_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| CrateError::Zip {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let member = find_descriptor_member(&mut archive).ok_or_else(|| {
        CrateError::io(
            archive_path,
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no {} member at archive root", vocab::METADATA_DESCRIPTOR_ID),
            ),
        )
    })?;
    log::debug!("descriptor member in {}: {member}", archive_path.display());

    let mut entry = archive.by_name(&member).map_err(|e| CrateError::Zip {
        path: archive_path.to_path_buf(),
        reason: format!("failed to open member {member}: {e}"),
    })?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| CrateError::io(archive_path, e))?;

    let origin = format!("{}!{member}", archive_path.display());
    read_document(&text, &origin, strictness)
}

/// Shared parse step for all three entry points.
fn read_document(
    text: &str,
    origin: &str,
    strictness: Strictness,
) -> Result<EntityGraph, CrateError> {
    let doc: Value = serde_json::from_str(text).map_err(|e| CrateError::Parse {
        origin: origin.to_string(),
        source: e,
    })?;
    EntityGraph::from_document(&doc, origin, strictness)
}

/// Locates the descriptor member inside a zip archive.
///
/// Prefers a descriptor directly at the archive root. When the archive was
/// created by zipping a folder, every member shares one top-level directory;
/// a descriptor directly under that directory counts as the root descriptor
/// too.
fn find_descriptor_member<R: Read + io::Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let names: Vec<String> = archive.file_names().map(String::from).collect();

    for name in &names {
        if !name.contains('/') && vocab::is_descriptor_name(name) {
            return Some(name.clone());
        }
    }

    let top_level: std::collections::HashSet<&str> = names
        .iter()
        .filter_map(|n| n.split('/').next())
        .filter(|s| !s.is_empty())
        .collect();

    if top_level.len() == 1 {
        for name in &names {
            if let Some((_, rest)) = name.split_once('/') {
                if !rest.contains('/') && vocab::is_descriptor_name(rest) {
                    return Some(name.clone());
                }
            }
        }
    }

    None
}
