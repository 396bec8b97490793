//! End-to-end tests: read from file/string/zip, query, package.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;

use rocrate_engine::{
    package, read_from_path, read_from_string, read_from_zip, CrateError, PackageOptions,
    Strictness,
};

const MINIMAL_CRATE: &str = r#"{
    "@context": "https://w3id.org/ro/crate/1.1/context",
    "@graph": [
        {
            "@type": "CreativeWork",
            "@id": "ro-crate-metadata.json",
            "conformsTo": {"@id": "https://w3id.org/ro/crate/1.1"},
            "about": {"@id": "./"}
        },
        {
            "@id": "./",
            "identifier": "https://doi.org/10.4225/59/59672c09f4a4b",
            "@type": "Dataset",
            "datePublished": "2017",
            "name": "Data files associated with the manuscript",
            "description": "Palliative care planning for nursing home residents",
            "license": {"@id": "https://creativecommons.org/licenses/by-nc-sa/3.0/au/"}
        },
        {
            "@id": "https://creativecommons.org/licenses/by-nc-sa/3.0/au/",
            "@type": "CreativeWork",
            "identifier": "https://creativecommons.org/licenses/by-nc-sa/3.0/au/",
            "name": "Attribution-NonCommercial-ShareAlike 3.0 Australia (CC BY-NC-SA 3.0 AU)",
            "value": null
        }
    ]
}"#;

const LICENSE_ID: &str = "https://creativecommons.org/licenses/by-nc-sa/3.0/au/";

/// Writes a minimal crate directory and returns its path.
fn write_crate_dir(parent: &Path, name: &str) -> PathBuf {
    let dir = parent.join(name);
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("ro-crate-metadata.json"), MINIMAL_CRATE).unwrap();
    fs::write(dir.join("data.csv"), "subject,object\n1,2\n").unwrap();
    dir
}

#[test]
fn end_to_end_minimal_crate() {
    let graph = read_from_string(MINIMAL_CRATE, Strictness::Strict).unwrap();

    let entities = graph.to_list();
    assert_eq!(entities.len(), 3);
    let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["ro-crate-metadata.json", "./", LICENSE_ID]);

    // Descriptor linkage: about resolves to the root data entity.
    let descriptor = graph.get_entity("ro-crate-metadata.json").unwrap();
    assert_eq!(descriptor.get("about"), Some(&json!({"id": "./"})));
    let about_target = descriptor.reference_ids("about")[0];
    let root = graph.get_entity(about_target).unwrap();
    assert_eq!(root.entity_type, vec!["Dataset"]);

    // Reference-valued properties are normalized, not resolved.
    assert_eq!(root.get("license"), Some(&json!({"id": LICENSE_ID})));
    assert!(graph.get_entity(LICENSE_ID).is_some());

    assert_eq!(
        graph.get_all_context(),
        vec![json!({"@context": "https://w3id.org/ro/crate/1.1/context"})]
    );
}

#[test]
fn reading_twice_yields_equal_graphs() {
    let first = read_from_string(MINIMAL_CRATE, Strictness::Strict).unwrap();
    let second = read_from_string(MINIMAL_CRATE, Strictness::Strict).unwrap();

    assert_eq!(first.to_list(), second.to_list());
    assert_eq!(first.get_all_context(), second.get_all_context());
}

#[test]
fn write_to_path_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let graph = read_from_string(MINIMAL_CRATE, Strictness::Strict).unwrap();

    let out = dir.path().join("ro-crate-metadata.json");
    graph.write_to_path(&out).unwrap();

    // The written document parses back to the same graph and context, and
    // matches the source document value for value.
    let reread = read_from_path(&out, Strictness::Strict).unwrap();
    assert_eq!(reread.to_list(), graph.to_list());
    assert_eq!(reread.get_all_context(), graph.get_all_context());

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let source: serde_json::Value = serde_json::from_str(MINIMAL_CRATE).unwrap();
    assert_eq!(written, source);
}

#[test]
fn edited_graph_serializes_with_new_entity() {
    let dir = tempfile::tempdir().unwrap();
    let mut graph = read_from_string(MINIMAL_CRATE, Strictness::Strict).unwrap();

    let mut person = rocrate_engine::Entity::new("#alice", vec!["Person".to_string()]);
    person.set("name", json!("Alice"));
    graph.add_entity(person).unwrap();

    let out = dir.path().join("ro-crate-metadata.json");
    graph.write_to_path(&out).unwrap();

    let reread = read_from_path(&out, Strictness::Strict).unwrap();
    assert_eq!(reread.len(), 4);
    assert_eq!(
        reread.get_entity("#alice").unwrap().get("name"),
        Some(&json!("Alice"))
    );
}

#[test]
fn read_from_path_matches_read_from_string() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ro-crate-metadata.json");
    fs::write(&path, MINIMAL_CRATE).unwrap();

    let from_path = read_from_path(&path, Strictness::Strict).unwrap();
    let from_string = read_from_string(MINIMAL_CRATE, Strictness::Strict).unwrap();
    assert_eq!(from_path.to_list(), from_string.to_list());
}

#[test]
fn read_from_zip_finds_root_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let crate_dir = write_crate_dir(dir.path(), "experiment");

    let receipt = package(&crate_dir, &PackageOptions::default()).unwrap();
    assert!(receipt.written);

    let graph = read_from_zip(&receipt.archive_path, Strictness::Strict).unwrap();
    assert_eq!(graph.len(), 3);
    assert_eq!(
        graph.get_entity("./").unwrap().get("license"),
        Some(&json!({"id": LICENSE_ID}))
    );
}

#[test]
fn duplicate_id_fails_construction() {
    let doc = r#"{
        "@context": "https://w3id.org/ro/crate/1.1/context",
        "@graph": [
            {"@id": "ro-crate-metadata.json", "@type": "CreativeWork",
             "conformsTo": {"@id": "https://w3id.org/ro/crate/1.1"}, "about": {"@id": "./"}},
            {"@id": "./", "@type": "Dataset", "name": "first"},
            {"@id": "./", "@type": "Dataset", "name": "second"}
        ]
    }"#;

    let err = read_from_string(doc, Strictness::Lenient).unwrap_err();
    assert!(matches!(err, CrateError::DuplicateId(id) if id == "./"));
}

#[test]
fn lenient_read_records_findings() {
    let doc = r#"{
        "@context": "https://w3id.org/ro/crate/1.1/context",
        "@graph": [
            {"@id": "ro-crate-metadata.json", "@type": "CreativeWork",
             "conformsTo": {"@id": "https://w3id.org/ro/crate/1.1"}, "about": {"@id": "./missing/"}},
            {"@id": "./", "@type": "Dataset"}
        ]
    }"#;

    assert!(read_from_string(doc, Strictness::Strict).is_err());

    let graph = read_from_string(doc, Strictness::Lenient).unwrap();
    assert_eq!(graph.len(), 2);
    assert!(!graph.findings().is_empty());
}

#[test]
fn package_writes_archive_with_relative_members() {
    let dir = tempfile::tempdir().unwrap();
    let crate_dir = write_crate_dir(dir.path(), "experiment");
    fs::create_dir(crate_dir.join("results")).unwrap();
    fs::write(crate_dir.join("results/out.txt"), "done").unwrap();

    let receipt = package(&crate_dir, &PackageOptions::default()).unwrap();
    assert_eq!(receipt.archive_path, dir.path().join("experiment.zip"));
    assert!(receipt.archive_path.is_file());
    assert!(receipt.members.contains(&"ro-crate-metadata.json".to_string()));
    assert!(receipt.members.contains(&"data.csv".to_string()));
    assert!(receipt.members.contains(&"results/out.txt".to_string()));

    let archive = zip::ZipArchive::new(File::open(&receipt.archive_path).unwrap()).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"results/out.txt"));
}

#[test]
fn package_without_overwrite_keeps_existing_archive() {
    let dir = tempfile::tempdir().unwrap();
    let crate_dir = write_crate_dir(dir.path(), "experiment");

    let existing = dir.path().join("experiment.zip");
    fs::write(&existing, b"pre-existing bytes").unwrap();

    let err = package(&crate_dir, &PackageOptions::default()).unwrap_err();
    assert!(matches!(err, CrateError::AlreadyExists(_)));
    assert_eq!(fs::read(&existing).unwrap(), b"pre-existing bytes");

    // No temporary file left behind either.
    assert!(!dir.path().join("experiment.zip.tmp").exists());
}

#[test]
fn package_overwrite_replaces_archive() {
    let dir = tempfile::tempdir().unwrap();
    let crate_dir = write_crate_dir(dir.path(), "experiment");
    fs::write(dir.path().join("experiment.zip"), b"stale").unwrap();

    let options = PackageOptions {
        overwrite: true,
        ..PackageOptions::default()
    };
    let receipt = package(&crate_dir, &options).unwrap();
    assert!(receipt.written);
    assert!(read_from_zip(&receipt.archive_path, Strictness::Strict).is_ok());
}

#[test]
fn package_failed_publish_leaves_no_temporary_file() {
    let dir = tempfile::tempdir().unwrap();
    let crate_dir = write_crate_dir(dir.path(), "experiment");

    // A directory squatting on the output path makes the final rename
    // fail after the archive bytes were already staged.
    fs::create_dir(dir.path().join("experiment.zip")).unwrap();

    let options = PackageOptions {
        overwrite: true,
        ..PackageOptions::default()
    };
    let err = package(&crate_dir, &options).unwrap_err();
    assert!(matches!(err, CrateError::Io { .. }));
    assert!(!dir.path().join("experiment.zip.tmp").exists());
}

#[test]
fn package_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let crate_dir = write_crate_dir(dir.path(), "experiment");

    let options = PackageOptions {
        dry_run: true,
        ..PackageOptions::default()
    };
    let receipt = package(&crate_dir, &options).unwrap();
    assert!(!receipt.written);
    assert_eq!(receipt.members.len(), 2);
    assert!(!receipt.archive_path.exists());
}

#[test]
fn package_skips_hidden_files_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let crate_dir = write_crate_dir(dir.path(), "experiment");
    fs::write(crate_dir.join(".secrets"), "hidden").unwrap();
    fs::create_dir(crate_dir.join(".cache")).unwrap();
    fs::write(crate_dir.join(".cache/blob"), "hidden too").unwrap();

    let receipt = package(&crate_dir, &PackageOptions::default()).unwrap();
    assert!(!receipt.members.iter().any(|m| m.contains(".secrets")));
    assert!(!receipt.members.iter().any(|m| m.contains(".cache")));

    let options = PackageOptions {
        overwrite: true,
        include_hidden: true,
        ..PackageOptions::default()
    };
    let receipt = package(&crate_dir, &options).unwrap();
    assert!(receipt.members.contains(&".secrets".to_string()));
    assert!(receipt.members.contains(&".cache/blob".to_string()));
}

#[test]
fn package_flatten_collision_fails() {
    let dir = tempfile::tempdir().unwrap();
    let crate_dir = write_crate_dir(dir.path(), "experiment");
    fs::create_dir(crate_dir.join("sub")).unwrap();
    fs::write(crate_dir.join("sub/data.csv"), "other").unwrap();

    let options = PackageOptions {
        flatten: true,
        ..PackageOptions::default()
    };
    let err = package(&crate_dir, &options).unwrap_err();
    assert!(matches!(err, CrateError::NameCollision { name, .. } if name == "data.csv"));
    assert!(!dir.path().join("experiment.zip").exists());
}

#[test]
fn package_flatten_collapses_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    let crate_dir = write_crate_dir(dir.path(), "experiment");
    fs::create_dir(crate_dir.join("sub")).unwrap();
    fs::write(crate_dir.join("sub/notes.txt"), "notes").unwrap();

    let options = PackageOptions {
        flatten: true,
        ..PackageOptions::default()
    };
    let receipt = package(&crate_dir, &options).unwrap();
    assert!(receipt.members.contains(&"notes.txt".to_string()));
    assert!(!receipt.members.iter().any(|m| m.contains('/')));
}

#[test]
fn package_requires_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("no-crate");
    fs::create_dir(&empty).unwrap();
    fs::write(empty.join("data.csv"), "1,2\n").unwrap();

    let err = package(&empty, &PackageOptions::default()).unwrap_err();
    assert!(matches!(err, CrateError::Io { .. }));
}

#[test]
fn read_from_zip_with_top_level_directory() {
    // An archive made by zipping the folder itself: every member sits
    // under one top-level directory.
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("wrapped.zip");
    let file = File::create(&archive_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file("experiment/ro-crate-metadata.json", options)
        .unwrap();
    writer.write_all(MINIMAL_CRATE.as_bytes()).unwrap();
    writer.start_file("experiment/data.csv", options).unwrap();
    writer.write_all(b"1,2\n").unwrap();
    writer.finish().unwrap();

    let graph = read_from_zip(&archive_path, Strictness::Strict).unwrap();
    assert_eq!(graph.len(), 3);
}

#[test]
fn read_from_zip_without_descriptor_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("bare.zip");
    let file = File::create(&archive_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("data.csv", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"1,2\n").unwrap();
    writer.finish().unwrap();

    let err = read_from_zip(&archive_path, Strictness::Strict).unwrap_err();
    assert!(matches!(err, CrateError::Io { .. }));
}
