//! Fixture archives shared by the integration tests.

#![allow(dead_code)]

use qmod::{MANIFEST_FILE, Manifest};
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const EXAMPLE_MOD: &str = include_str!("../resources/example_mod.json");

/// Every file stated by `example_mod.json`, with recognizable contents.
pub const EXAMPLE_FILES: &[(&str, &[u8])] = &[
    ("libexample-mod.so", b"mod file"),
    ("libmy-latemod.so", b"late mod file"),
    ("libmy-library.so", b"library file"),
    ("myFile.png", b"file copy"),
    ("myCover.png", b"cover image"),
];

/// Build a ZIP archive holding a raw manifest document and the given files.
pub fn zip_with_manifest_json(manifest_json: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    writer.start_file(MANIFEST_FILE, options).unwrap();
    writer.write_all(manifest_json.as_bytes()).unwrap();
    for (name, contents) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

/// Build a ZIP archive holding a serialized manifest and the given files.
pub fn zip_with_manifest(manifest: &Manifest, files: &[(&str, &[u8])]) -> Vec<u8> {
    zip_with_manifest_json(&manifest.to_json().unwrap(), files)
}

/// Build a ZIP archive without a manifest.
pub fn zip_without_manifest(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// The example package with every stated file present.
pub fn example_package() -> Vec<u8> {
    zip_with_manifest_json(EXAMPLE_MOD, EXAMPLE_FILES)
}

/// The example package with one stated file left out.
pub fn example_package_without(missing: &str) -> Vec<u8> {
    let files: Vec<(&str, &[u8])> = EXAMPLE_FILES
        .iter()
        .copied()
        .filter(|(name, _)| *name != missing)
        .collect();
    zip_with_manifest_json(EXAMPLE_MOD, &files)
}

pub fn new_manifest() -> Manifest {
    Manifest::new(
        "my-mod",
        "My Mod",
        "1.0.0",
        Some("com.my.game"),
        Some("1.0.0"),
        "me",
    )
    .unwrap()
}

/// Read an entry from raw archive bytes, bypassing the package layer.
pub fn read_raw_entry(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut contents = Vec::new();
    std::io::Read::read_to_end(&mut file, &mut contents).unwrap();
    Some(contents)
}

pub fn read_all(mut reader: impl std::io::Read) -> Vec<u8> {
    let mut contents = Vec::new();
    reader.read_to_end(&mut contents).unwrap();
    contents
}

/// Route library logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("qmod=debug")
        .with_test_writer()
        .try_init();
}
