//! Packaging a crate directory into a zip archive
//!
//! Walks the source directory, checks the packaging preconditions, then
//! writes the archive at a sibling temporary path and renames it into
//! place. A failed run never leaves a partial archive behind.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::CrateError;
use crate::vocab;

/// Packaging policy.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Replace an existing archive at the output path
    pub overwrite: bool,
    /// Include files and directories whose name starts with a dot
    pub include_hidden: bool,
    /// Collapse subdirectories into the archive root
    pub flatten: bool,
    /// Enumerate and check collisions without writing anything
    pub dry_run: bool,
}

/// What a [`package`] call produced (or, for a dry run, would produce).
#[derive(Debug)]
pub struct PackageReceipt {
    /// The computed output path: `<source_directory_name>.zip` alongside the
    /// source directory
    pub archive_path: PathBuf,
    /// Archive member names in write order
    pub members: Vec<String>,
    /// False for a dry run
    pub written: bool,
}

/// Packages a crate directory (descriptor plus data files) into a zip
/// archive.
///
/// The source directory must contain a metadata descriptor. On success
/// exactly one archive exists at the output path; on any failure no partial
/// archive is left in place.
pub fn package(source_dir: &Path, options: &PackageOptions) -> Result<PackageReceipt, CrateError> {
    let source = source_dir
        .canonicalize()
        .map_err(|e| CrateError::io(source_dir, e))?;
    if !source.is_dir() {
        return Err(CrateError::io(
            &source,
            io::Error::new(io::ErrorKind::InvalidInput, "source is not a directory"),
        ));
    }

    let archive_path = output_path(&source)?;
    if archive_path.exists() && !options.overwrite {
        return Err(CrateError::AlreadyExists(archive_path));
    }

    find_descriptor_file(&source)?;

    let members = enumerate_members(&source, options)?;
    log::debug!(
        "packaging {} files from {} into {}",
        members.len(),
        source.display(),
        archive_path.display()
    );

    let member_names: Vec<String> = members.iter().map(|(name, _)| name.clone()).collect();
    if options.dry_run {
        return Ok(PackageReceipt {
            archive_path,
            members: member_names,
            written: false,
        });
    }

    let tmp_path = archive_path.with_extension("zip.tmp");
    if let Err(e) = write_archive(&tmp_path, &members) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, &archive_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CrateError::io(&archive_path, e));
    }

    Ok(PackageReceipt {
        archive_path,
        members: member_names,
        written: true,
    })
}

/// `<source_directory_name>.zip` placed alongside the source directory.
fn output_path(source: &Path) -> Result<PathBuf, CrateError> {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CrateError::InvalidStructure {
            origin: source.display().to_string(),
            reason: "source directory has no usable name".to_string(),
        })?;
    let parent = source.parent().unwrap_or_else(|| Path::new("."));
    Ok(parent.join(format!("{name}.zip")))
}

/// The descriptor must be present before anything is written.
fn find_descriptor_file(dir: &Path) -> Result<PathBuf, CrateError> {
    let standard = dir.join(vocab::METADATA_DESCRIPTOR_ID);
    if standard.is_file() {
        return Ok(standard);
    }

    let entries = fs::read_dir(dir).map_err(|e| CrateError::io(dir, e))?;
    for entry in entries.flatten() {
        if let Some(name) = entry.file_name().to_str() {
            if vocab::is_descriptor_name(name) && entry.path().is_file() {
                return Ok(entry.path());
            }
        }
    }

    Err(CrateError::io(
        dir,
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no {} in source directory", vocab::METADATA_DESCRIPTOR_ID),
        ),
    ))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Enumerates (member name, source path) pairs in a stable order, checking
/// for flatten collisions.
fn enumerate_members(
    source: &Path,
    options: &PackageOptions,
) -> Result<Vec<(String, PathBuf)>, CrateError> {
    let mut members: Vec<(String, PathBuf)> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || options.include_hidden || !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(|e| CrateError::io(source, e.into()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let member = member_name(path, source, options.flatten)?;
        if let Some(first) = seen.get(&member) {
            return Err(CrateError::NameCollision {
                name: member,
                first: first.clone(),
                second: path.to_path_buf(),
            });
        }
        seen.insert(member.clone(), path.to_path_buf());
        members.push((member, path.to_path_buf()));
    }

    Ok(members)
}

/// Archive member name for one source file.
fn member_name(path: &Path, source: &Path, flatten: bool) -> Result<String, CrateError> {
    let name = if flatten {
        path.file_name().and_then(|n| n.to_str()).map(String::from)
    } else {
        path.strip_prefix(source).ok().map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
    };
    name.ok_or_else(|| CrateError::InvalidStructure {
        origin: path.display().to_string(),
        reason: "file name is not representable as an archive member".to_string(),
    })
}

/// Writes all members to a fresh archive at `tmp_path`.
fn write_archive(tmp_path: &Path, members: &[(String, PathBuf)]) -> Result<(), CrateError> {
    let file = File::create(tmp_path).map_err(|e| CrateError::io(tmp_path, e))?;
    let mut zip = ZipWriter::new(file);
    let zip_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755)
        .large_file(true);

    for (member, path) in members {
        zip.start_file(member.as_str(), zip_options)
            .map_err(|e| CrateError::Zip {
                path: tmp_path.to_path_buf(),
                reason: format!("failed to start member {member}: {e}"),
            })?;
        let mut source_file = File::open(path).map_err(|e| CrateError::io(path, e))?;
        io::copy(&mut source_file, &mut zip).map_err(|e| CrateError::io(path, e))?;
    }

    zip.finish().map_err(|e| CrateError::Zip {
        path: tmp_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(())
}
